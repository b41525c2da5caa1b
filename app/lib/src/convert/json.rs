//! JSON reading and writing.
//!
//! Output is always an array of row objects. Input may also be column
//! oriented: an object of arrays, or an object of `{index: value}` objects.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Number, Value as JsonValue};

use crate::config::ConverterConfig;
use crate::error::{ConvertError, Result};
use crate::format::DataFormat;

use super::tabular::{Column, TabularData, Value};

/// Parse UTF-8 JSON bytes into a table.
pub fn parse_json_bytes(input: &[u8]) -> Result<TabularData> {
    let input = input.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(input);
    let text = std::str::from_utf8(input).map_err(|e| ConvertError::parse(DataFormat::Json, e))?;
    parse_json(text)
}

/// Parse JSON text into a table.
pub fn parse_json(input: &str) -> Result<TabularData> {
    let input = input.strip_prefix('\u{feff}').unwrap_or(input);
    let parsed: JsonValue =
        serde_json::from_str(input).map_err(|e| ConvertError::parse(DataFormat::Json, e))?;

    match parsed {
        JsonValue::Array(items) => from_records(items),
        JsonValue::Object(map) => from_column_map(map),
        other => Err(ConvertError::parse(
            DataFormat::Json,
            format!(
                "expected an array of objects or an object of columns, found {}",
                kind(&other)
            ),
        )),
    }
}

fn from_records(items: Vec<JsonValue>) -> Result<TabularData> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut columns: Vec<Column> = Vec::new();
    let row_count = items.len();

    for (row_idx, item) in items.into_iter().enumerate() {
        let record = match item {
            JsonValue::Object(record) => record,
            other => {
                return Err(ConvertError::parse(
                    DataFormat::Json,
                    format!("expected row {} to be an object, found {}", row_idx, kind(&other)),
                ));
            }
        };
        for (key, value) in record {
            let col_idx = match positions.get(&key) {
                Some(&idx) => idx,
                None => {
                    positions.insert(key.clone(), columns.len());
                    columns.push(Column::new(key, Vec::with_capacity(row_count)));
                    columns.len() - 1
                }
            };
            let column = &mut columns[col_idx];
            // pad for rows that lacked this key
            column.values.resize(row_idx, Value::Null);
            column.values.push(cell(value));
        }
    }

    for column in &mut columns {
        column.values.resize(row_count, Value::Null);
    }
    Ok(TabularData { columns, row_count })
}

fn from_column_map(map: Map<String, JsonValue>) -> Result<TabularData> {
    if map.values().all(JsonValue::is_array) {
        let columns = map
            .into_iter()
            .map(|(name, values)| match values {
                JsonValue::Array(items) => Column::new(name, items.into_iter().map(cell).collect()),
                _ => Column::new(name, Vec::new()),
            })
            .collect();
        return Ok(TabularData::from_columns(columns));
    }

    if map.values().all(JsonValue::is_object) {
        let mut index: Vec<String> = Vec::new();
        let mut index_pos: HashMap<String, usize> = HashMap::new();
        for inner in map.values().filter_map(JsonValue::as_object) {
            for key in inner.keys() {
                if !index_pos.contains_key(key) {
                    index_pos.insert(key.clone(), index.len());
                    index.push(key.clone());
                }
            }
        }

        let columns = map
            .into_iter()
            .map(|(name, inner)| {
                let mut values = vec![Value::Null; index.len()];
                if let JsonValue::Object(inner) = inner {
                    for (key, value) in inner {
                        if let Some(&pos) = index_pos.get(&key) {
                            values[pos] = cell(value);
                        }
                    }
                }
                Column::new(name, values)
            })
            .collect();
        return Ok(TabularData::from_columns(columns));
    }

    Err(ConvertError::parse(
        DataFormat::Json,
        "object input must map every column to an array or to an object of values",
    ))
}

fn cell(value: JsonValue) -> Value {
    match value {
        JsonValue::Null => Value::Null,
        JsonValue::Bool(b) => Value::Bool(b),
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => Value::Integer(i),
            None => n.as_f64().map(Value::Float).unwrap_or(Value::Null),
        },
        JsonValue::String(s) => Value::String(s),
        nested @ (JsonValue::Array(_) | JsonValue::Object(_)) => Value::String(nested.to_string()),
    }
}

fn kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}

fn to_json_value(value: &Value) -> JsonValue {
    match value {
        Value::Null => JsonValue::Null,
        Value::Bool(b) => JsonValue::Bool(*b),
        Value::Integer(n) => JsonValue::Number(Number::from(*n)),
        Value::Float(f) => Number::from_f64(*f)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        Value::String(s) => JsonValue::String(s.clone()),
    }
}

/// Write a table as a pretty-printed array of row objects.
pub fn write_json(data: &TabularData, config: &ConverterConfig) -> Result<String> {
    let records: Vec<JsonValue> = data
        .rows()
        .map(|row| {
            let record: Map<String, JsonValue> = data
                .columns
                .iter()
                .zip(row)
                .map(|(column, value)| (column.name.clone(), to_json_value(value)))
                .collect();
            JsonValue::Object(record)
        })
        .collect();

    let indent = " ".repeat(config.json_indent);
    let mut out = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(indent.as_bytes()));
    records
        .serialize(&mut serializer)
        .map_err(|e| ConvertError::write(DataFormat::Json, e))?;

    String::from_utf8(out).map_err(|e| ConvertError::write(DataFormat::Json, e))
}
