//! XLSX reading and writing.
//!
//! Reading uses the first worksheet only, with its first row as the header.
//! Writing produces a single worksheet holding the header and data rows.

use std::io::Cursor;

use calamine::{open_workbook_from_rs, Data, Reader, Xlsx, XlsxError};
use rust_xlsxwriter::Workbook;

use crate::config::ConverterConfig;
use crate::error::{ConvertError, Result};
use crate::format::DataFormat;

use super::tabular::{unique_names, TabularData, Value};

/// Rows per worksheet, header included.
pub const MAX_ROWS: usize = 1_048_576;

/// Columns per worksheet.
pub const MAX_COLUMNS: usize = 16_384;

// integral floats below this magnitude convert to i64 without loss of range
const I64_FLOAT_BOUND: f64 = 9_223_372_036_854_775_808.0;

/// Largest integer magnitude a worksheet number cell holds exactly (2^53).
/// Integers beyond it are written as text cells so their digits survive.
pub const MAX_EXACT_INTEGER: u64 = 1 << 53;

/// Parse XLSX bytes into a table built from the first worksheet.
pub fn parse_excel(input: &[u8]) -> Result<TabularData> {
    let err = |e: XlsxError| ConvertError::parse(DataFormat::Excel, e);

    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(input)).map_err(err)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ConvertError::parse(DataFormat::Excel, "workbook contains no worksheets"))?
        .map_err(err)?;

    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Ok(TabularData::new());
    };
    let names = unique_names(header.iter().map(header_text));
    let records = rows.map(|row| row.iter().map(cell).collect()).collect();

    Ok(TabularData::from_rows(names, records))
}

fn header_text(data: &Data) -> String {
    match data {
        Data::String(s) => s.clone(),
        Data::Empty | Data::Error(_) => String::new(),
        other => match cell(other) {
            Value::Null => String::new(),
            value => value.to_string(),
        },
    }
}

fn cell(data: &Data) -> Value {
    match data {
        Data::Empty | Data::Error(_) => Value::Null,
        Data::Bool(b) => Value::Bool(*b),
        Data::Int(n) => Value::Integer(*n),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < I64_FLOAT_BOUND => {
            Value::Integer(*f as i64)
        }
        Data::Float(f) => Value::Float(*f),
        Data::String(s) if s.is_empty() => Value::Null,
        Data::String(s) => Value::String(s.clone()),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(datetime) => Value::String(datetime.to_string()),
            None => Value::Float(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => Value::String(s.clone()),
    }
}

/// Write a table as an XLSX workbook with one worksheet.
pub fn write_excel(data: &TabularData, config: &ConverterConfig) -> Result<Vec<u8>> {
    let err = |e: rust_xlsxwriter::XlsxError| ConvertError::write(DataFormat::Excel, e);

    if data.row_count >= MAX_ROWS {
        return Err(ConvertError::write(
            DataFormat::Excel,
            format!(
                "{} rows exceed the worksheet limit of {} data rows",
                data.row_count,
                MAX_ROWS - 1
            ),
        ));
    }
    if data.column_count() > MAX_COLUMNS {
        return Err(ConvertError::write(
            DataFormat::Excel,
            format!(
                "{} columns exceed the worksheet limit of {}",
                data.column_count(),
                MAX_COLUMNS
            ),
        ));
    }

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(&config.sheet_name).map_err(err)?;

    for (col, column) in data.columns.iter().enumerate() {
        let col = col as u16;
        sheet.write_string(0, col, &column.name).map_err(err)?;
        for (idx, value) in column.values.iter().take(data.row_count).enumerate() {
            let row = idx as u32 + 1;
            let written = match value {
                Value::Null => continue,
                Value::Float(f) if !f.is_finite() => continue,
                Value::Bool(b) => sheet.write_boolean(row, col, *b),
                Value::Integer(n) if n.unsigned_abs() > MAX_EXACT_INTEGER => {
                    sheet.write_string(row, col, n.to_string())
                }
                Value::Integer(n) => sheet.write_number(row, col, *n as f64),
                Value::Float(f) => sheet.write_number(row, col, *f),
                Value::String(s) => sheet.write_string(row, col, s),
            };
            written.map_err(err)?;
        }
    }

    workbook.save_to_buffer().map_err(err)
}
