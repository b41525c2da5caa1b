//! CSV reading and writing.
//!
//! The first record is the header. Cells are typed with [`Value::infer`] after
//! the configured null tokens are mapped to [`Value::Null`].

use csv::{ReaderBuilder, Terminator, WriterBuilder};

use crate::config::ConverterConfig;
use crate::error::{ConvertError, Result};
use crate::format::DataFormat;

use super::tabular::{unique_names, TabularData, Value};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Parse CSV bytes into a table.
pub fn parse_csv(input: &[u8], config: &ConverterConfig) -> Result<TabularData> {
    let input = input.strip_prefix(UTF8_BOM).unwrap_or(input);

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .delimiter(config.delimiter_byte())
        .from_reader(input);

    let err = |e: csv::Error| ConvertError::parse(DataFormat::Csv, e);

    let headers = reader.headers().map_err(err)?.clone();
    let names = unique_names(headers.iter().map(|h| h.to_string()));
    let width = names.len();

    let mut rows = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record.map_err(err)?;
        if record.len() > width {
            // header is line 1, so data row `idx` sits on line idx + 2
            return Err(ConvertError::parse(
                DataFormat::Csv,
                format!(
                    "expected {} fields in line {}, saw {}",
                    width,
                    record
                        .position()
                        .map(|p| p.line())
                        .unwrap_or(idx as u64 + 2),
                    record.len()
                ),
            ));
        }
        rows.push(record.iter().map(|field| cell(field, config)).collect());
    }

    Ok(TabularData::from_rows(names, rows))
}

fn cell(field: &str, config: &ConverterConfig) -> Value {
    if config.is_na(field) {
        Value::Null
    } else if config.infer_types {
        Value::infer(field)
    } else if field.is_empty() {
        Value::Null
    } else {
        Value::String(field.to_string())
    }
}

/// Write a table as CSV text with a header row and no index column.
pub fn write_csv(data: &TabularData, config: &ConverterConfig) -> Result<String> {
    let err = |e: csv::Error| ConvertError::write(DataFormat::Csv, e);

    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .delimiter(config.delimiter_byte())
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(data.column_names()).map_err(err)?;
    for row in data.rows() {
        writer
            .write_record(row.iter().map(|v| v.to_string()))
            .map_err(err)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ConvertError::write(DataFormat::Csv, e.error()))?;
    String::from_utf8(bytes).map_err(|e| ConvertError::write(DataFormat::Csv, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> TabularData {
        parse_csv(text.as_bytes(), &ConverterConfig::default()).unwrap()
    }

    #[test]
    fn test_parse_basic() {
        let table = parse("name,age\nalice,30\nbob,25\n");
        assert_eq!(table.column_names(), vec!["name", "age"]);
        assert_eq!(table.row_count, 2);
        assert_eq!(
            table.row(0).unwrap(),
            vec![&Value::String("alice".into()), &Value::Integer(30)]
        );
    }

    #[test]
    fn test_parse_missing_trailing_fields_are_null() {
        let table = parse("a,b,c\n1\n2,3\n");
        assert_eq!(
            table.row(0).unwrap(),
            vec![&Value::Integer(1), &Value::Null, &Value::Null]
        );
        assert_eq!(
            table.row(1).unwrap(),
            vec![&Value::Integer(2), &Value::Integer(3), &Value::Null]
        );
    }

    #[test]
    fn test_parse_too_many_fields_fails() {
        let result = parse_csv(b"a,b\n1,2,3\n", &ConverterConfig::default());
        match result {
            Err(ConvertError::ParseFailure { format, message }) => {
                assert_eq!(format, DataFormat::Csv);
                assert!(message.contains("expected 2 fields"), "{}", message);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_parse_na_tokens() {
        let table = parse("a,b\nNA,null\nN/A,x\n");
        assert_eq!(table.row(0).unwrap(), vec![&Value::Null, &Value::Null]);
        assert_eq!(table.row(1).unwrap()[0], &Value::Null);
    }

    #[test]
    fn test_parse_quoted_fields() {
        let table = parse("a,b\n\"x, y\",\"say \"\"hi\"\"\"\n");
        assert_eq!(
            table.row(0).unwrap(),
            vec![
                &Value::String("x, y".into()),
                &Value::String("say \"hi\"".into())
            ]
        );
    }

    #[test]
    fn test_parse_bom_and_duplicate_headers() {
        let table = parse("\u{feff}id,id,\n1,2,3\n");
        assert_eq!(table.column_names(), vec!["id", "id.1", "Unnamed: 2"]);
    }

    #[test]
    fn test_parse_header_only() {
        let table = parse("a,b\n");
        assert_eq!(table.row_count, 0);
        assert_eq!(table.column_count(), 2);
    }

    #[test]
    fn test_parse_without_inference() {
        let config = ConverterConfig {
            infer_types: false,
            ..ConverterConfig::default()
        };
        let table = parse_csv(b"a,b\n1,\n", &config).unwrap();
        assert_eq!(
            table.row(0).unwrap(),
            vec![&Value::String("1".into()), &Value::Null]
        );
    }

    #[test]
    fn test_parse_invalid_utf8() {
        let result = parse_csv(b"a\n\xff\xfe\n", &ConverterConfig::default());
        assert!(matches!(result, Err(ConvertError::ParseFailure { .. })));
    }

    #[test]
    fn test_write_csv() {
        let table = TabularData::from_rows(
            vec!["name".into(), "score".into(), "ok".into()],
            vec![
                vec![
                    Value::String("a, b".into()),
                    Value::Float(1.5),
                    Value::Bool(true),
                ],
                vec![Value::String("c".into()), Value::Null, Value::Bool(false)],
            ],
        );
        let text = write_csv(&table, &ConverterConfig::default()).unwrap();
        assert_eq!(text, "name,score,ok\n\"a, b\",1.5,true\nc,,false\n");
    }

    #[test]
    fn test_write_csv_custom_delimiter() {
        let config = ConverterConfig {
            csv_delimiter: ';',
            ..ConverterConfig::default()
        };
        let table = parse_csv(b"a;b\n1;2\n", &config).unwrap();
        assert_eq!(table.row(0).unwrap(), vec![&Value::Integer(1), &Value::Integer(2)]);
        assert_eq!(write_csv(&table, &config).unwrap(), "a;b\n1;2\n");
    }
}
