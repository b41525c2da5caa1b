//! Example converting a file between tabular formats.
//!
//! Run with: cargo run --example convert_file -- data.csv json

use std::env;
use std::fs;
use std::path::Path;

use tabconv::{output_file_name, DataFormat, FormatConverter, Payload};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = env::args().skip(1);
    let input = args.next().ok_or("usage: convert_file <input> <csv|json|excel>")?;
    let target = args.next().unwrap_or_else(|| "json".to_string());

    let from = match Path::new(&input).extension().and_then(|e| e.to_str()) {
        Some("xlsx") => DataFormat::Excel,
        Some("json") => DataFormat::Json,
        _ => DataFormat::Csv,
    };
    let to: DataFormat = target.parse()?;

    let bytes = fs::read(&input)?;
    println!("=== Converting {} ({} bytes) from {} to {} ===", input, bytes.len(), from, to);

    let converter = FormatConverter::new();
    let payload = Payload::Bytes(bytes);

    // Show what the converter sees before serializing
    let table = converter.parse(&payload, from)?.into_normalized()?;
    println!("Rows: {}", table.row_count);
    for column in &table.columns {
        println!(
            "  {}: {:?}, {} nulls",
            column.name,
            column.inferred_type(),
            column.null_count()
        );
    }

    let output = converter.serialize(&table, to)?;
    let file_name = output_file_name("converted_data", to);
    fs::write(&file_name, output.to_bytes()?)?;
    println!("Wrote {} ({})", file_name, output.mime_type);

    Ok(())
}
