//! Property tests for the conversion pipeline.

use proptest::prelude::*;
use tabconv::convert::{csv as csv_format, json as json_format};
use tabconv::{Column, ConverterConfig, FormatConverter, Payload, TabularData, Value};

/// Words that stay strings under type inference.
fn word() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9 ]{0,8}".prop_filter("inferred as another type", |s| {
        !matches!(s.trim(), "true" | "false" | "nan" | "null")
    })
}

/// CSV cell text: blank, integer or word.
fn cell_text() -> impl Strategy<Value = String> {
    prop_oneof![
        1 => Just(String::new()),
        2 => any::<i32>().prop_map(|n| n.to_string()),
        3 => word(),
    ]
}

fn value() -> impl Strategy<Value = Value> {
    prop_oneof![
        2 => Just(Value::Null),
        1 => any::<bool>().prop_map(Value::Bool),
        1 => any::<i64>().prop_map(Value::Integer),
        1 => (-1.0e6..1.0e6f64).prop_map(Value::Float),
        1 => word().prop_map(Value::String),
    ]
}

fn table() -> impl Strategy<Value = TabularData> {
    (1usize..5, 0usize..8).prop_flat_map(|(cols, rows)| {
        prop::collection::vec(prop::collection::vec(value(), rows), cols).prop_map(|columns| {
            TabularData::from_columns(
                columns
                    .into_iter()
                    .enumerate()
                    .map(|(idx, values)| Column::new(format!("c{}", idx), values))
                    .collect(),
            )
        })
    })
}

fn csv_document(cells: impl Strategy<Value = String> + 'static) -> impl Strategy<Value = String> {
    let cells = cells.boxed();
    (1usize..5, 1usize..8).prop_flat_map(move |(cols, rows)| {
        prop::collection::vec(prop::collection::vec(cells.clone(), cols), rows).prop_map(
            move |body| {
                let header: Vec<String> = (0..cols).map(|idx| format!("col{}", idx)).collect();
                let mut text = header.join(",");
                text.push('\n');
                for row in body {
                    text.push_str(&row.join(","));
                    text.push('\n');
                }
                text
            },
        )
    })
}

fn records(text: &str) -> Vec<Vec<String>> {
    csv::ReaderBuilder::new()
        .has_headers(false)
        .from_reader(text.as_bytes())
        .records()
        .map(|r| r.unwrap().iter().map(|f| f.to_string()).collect())
        .collect()
}

proptest! {
    #[test]
    fn normalize_is_idempotent(table in table()) {
        let mut once = table.clone();
        once.normalize();
        let mut twice = once.clone();
        twice.normalize();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn normalized_tables_have_no_null_rows_or_columns(table in table()) {
        let mut table = table;
        table.normalize();
        for column in &table.columns {
            prop_assert!(!column.is_all_null());
            prop_assert_eq!(column.len(), table.row_count);
        }
        for row in table.rows() {
            prop_assert!(row.iter().any(|v| !v.is_null()));
        }
    }

    #[test]
    fn csv_through_json_preserves_table(document in csv_document(cell_text())) {
        let config = ConverterConfig::default();
        let parsed = csv_format::parse_csv(document.as_bytes(), &config).unwrap();
        let normalized = parsed.into_normalized();
        prop_assume!(normalized.is_ok());
        let normalized = normalized.unwrap();

        let text = json_format::write_json(&normalized, &config).unwrap();
        let reparsed = json_format::parse_json(&text).unwrap();
        prop_assert_eq!(reparsed, normalized);
    }

    #[test]
    fn string_csv_round_trips_through_json(document in csv_document(word())) {
        let converter = FormatConverter::new();
        let json = converter.convert(&Payload::from(document.as_str()), "csv", "json");
        let json = json.payload().unwrap().content.clone();
        let back = converter.convert(&Payload::Text(json), "json", "csv");
        let back = back.payload().unwrap();

        prop_assert_eq!(records(&back.content), records(&document));
    }
}
