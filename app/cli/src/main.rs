use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{debug, error, info, warn};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tabconv::{
    ColumnType, ConversionResult, ConverterConfig, DataFormat, FormatConverter, FormatRole,
    Payload, TabularData,
};

/// Default upload limit: 16 MiB.
const DEFAULT_MAX_SIZE: u64 = 16 * 1024 * 1024;

/// Convert tabular data between CSV, JSON and Excel (XLSX)
#[derive(Parser)]
#[command(name = "tabconv")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Converter configuration file (JSON)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Where the input comes from and how to treat it
#[derive(clap::Args)]
struct InputArgs {
    /// Input file (use '-' for stdin)
    #[arg(short, long, value_name = "FILE", default_value = "-")]
    input: String,

    /// Treat the input as pasted text instead of an uploaded file
    #[arg(long)]
    paste: bool,

    /// Reject inputs larger than this many bytes
    #[arg(long, value_name = "BYTES", default_value_t = DEFAULT_MAX_SIZE)]
    max_size: u64,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert data from one format to another
    Convert {
        #[command(flatten)]
        source: InputArgs,

        /// Output file (use '-' for stdout)
        #[arg(short, long, value_name = "FILE", default_value = "-")]
        output: String,

        /// Input format: csv, json or excel
        #[arg(short, long, value_name = "FORMAT")]
        from: String,

        /// Output format: csv, json or excel
        #[arg(short, long, value_name = "FORMAT")]
        to: String,

        /// Print the JSON response ({content, mimeType, isBase64} or {error})
        /// instead of writing the converted file
        #[arg(long)]
        wire: bool,
    },

    /// Display the columns and rows the converter reads from the input
    Info {
        #[command(flatten)]
        source: InputArgs,

        /// Input format: csv, json or excel
        #[arg(short, long, value_name = "FORMAT")]
        from: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ConverterConfig::default(),
    };
    let converter = FormatConverter::with_config(config);

    match cli.command {
        Commands::Convert {
            source,
            output,
            from,
            to,
            wire,
        } => {
            convert_command(&converter, &source, &output, &from, &to, wire, cli.quiet)?;
        }
        Commands::Info { source, from } => {
            info_command(&converter, &source, &from)?;
        }
    }

    Ok(())
}

/// Set up logging based on verbosity flags. `RUST_LOG` takes precedence.
fn setup_logging(verbose: bool, quiet: bool) {
    let level = if verbose {
        "debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

/// Load converter configuration from a JSON file
fn load_config(path: &Path) -> Result<ConverterConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config = ConverterConfig::from_json(&text)
        .with_context(|| format!("Invalid config file: {}", path.display()))?;
    debug!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Read input from file or stdin, enforcing the size limit
fn read_input(input: &str, max_size: u64) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    if input == "-" {
        io::stdin()
            .take(max_size.saturating_add(1))
            .read_to_end(&mut buffer)
            .context("Failed to read from stdin")?;
    } else {
        let file = fs::File::open(input)
            .with_context(|| format!("Failed to open input file: {}", input))?;
        file.take(max_size.saturating_add(1))
            .read_to_end(&mut buffer)
            .with_context(|| format!("Failed to read input file: {}", input))?;
    }

    if buffer.len() as u64 > max_size {
        anyhow::bail!("Input exceeds the maximum size of {} bytes", max_size);
    }
    Ok(buffer)
}

/// Turn raw input into a payload, as an upload or as pasted text
fn make_payload(source: &InputArgs) -> Result<Payload> {
    let bytes = read_input(&source.input, source.max_size)?;
    if bytes.is_empty() {
        anyhow::bail!("No input data provided");
    }
    let payload = if source.paste {
        let text = String::from_utf8(bytes).context("Pasted input is not valid UTF-8")?;
        Payload::Text(text)
    } else {
        Payload::Bytes(bytes)
    };
    debug!(
        "Read {} bytes from {} as {}",
        payload.len(),
        source.input,
        if payload.is_text() { "pasted text" } else { "file upload" }
    );
    Ok(payload)
}

/// Write output to file or stdout
fn write_output(output: &str, content: &[u8]) -> Result<()> {
    if output == "-" {
        let mut stdout = io::stdout();
        stdout
            .write_all(content)
            .context("Failed to write to stdout")?;
        stdout.flush().context("Failed to flush stdout")?;
    } else {
        fs::write(output, content)
            .with_context(|| format!("Failed to write output file: {}", output))?;
    }
    Ok(())
}

/// Execute the convert command
fn convert_command(
    converter: &FormatConverter,
    source: &InputArgs,
    output: &str,
    from: &str,
    to: &str,
    wire: bool,
    quiet: bool,
) -> Result<()> {
    debug!("Converting {} from {} to {}", source.input, from, to);

    let payload = make_payload(source)?;
    let input_size = payload.len();
    let outcome = converter
        .resolve(from, to)
        .and_then(|(from, to)| converter.try_convert(&payload, from, to));
    if let Err(e) = &outcome {
        if e.is_data_error() {
            warn!("Input rejected: {}", e);
        } else {
            error!("Conversion error: {}", e);
        }
    }
    let result = ConversionResult::from(outcome);

    if wire {
        let response =
            serde_json::to_string_pretty(&result).context("Failed to encode response")?;
        write_output(output, format!("{}\n", response).as_bytes())?;
    }

    let converted = match result {
        ConversionResult::Success(converted) => converted,
        ConversionResult::Failure { message } => anyhow::bail!(message),
    };

    debug!(
        "Produced {} ({} bytes{})",
        converted.mime_type,
        converted.content.len(),
        if converted.is_base64 { ", base64" } else { "" }
    );

    if wire {
        return Ok(());
    }

    let bytes = converted
        .to_bytes()
        .context("Converter returned malformed base64 content")?;
    write_output(output, &bytes)?;

    if !quiet {
        info!("Converted {} bytes to {} bytes", input_size, bytes.len());
        if output != "-" {
            eprintln!(
                "Converted {} bytes of {} to {} bytes of {} ({})",
                input_size,
                from.trim().to_ascii_lowercase(),
                bytes.len(),
                to.trim().to_ascii_lowercase(),
                output
            );
        }
    }

    Ok(())
}

/// Execute the info command
fn info_command(converter: &FormatConverter, source: &InputArgs, from: &str) -> Result<()> {
    let format = DataFormat::parse_tag(from, FormatRole::Input)?;
    let payload = make_payload(source)?;

    let parsed = converter.parse(&payload, format)?;
    let (raw_rows, raw_columns) = (parsed.row_count, parsed.column_count());
    let table = parsed.into_normalized()?;

    display_table_info(&table, format, raw_rows, raw_columns);
    Ok(())
}

/// Display information about a normalized table
fn display_table_info(table: &TabularData, format: DataFormat, raw_rows: usize, raw_columns: usize) {
    println!("=== Table Information ===\n");
    println!("Format: {}", format);
    println!("Columns: {}", table.column_count());
    println!("Rows: {}", table.row_count);

    let dropped_rows = raw_rows - table.row_count;
    let dropped_columns = raw_columns - table.column_count();
    if dropped_rows > 0 || dropped_columns > 0 {
        println!(
            "Dropped as empty: {} rows, {} columns",
            dropped_rows, dropped_columns
        );
    }

    println!("\n--- Schema ---");
    for (i, column) in table.columns.iter().enumerate() {
        println!(
            "  {}: {} ({}, {} nulls)",
            i + 1,
            column.name,
            type_name(column.inferred_type()),
            column.null_count()
        );
    }

    println!();
}

fn type_name(column_type: ColumnType) -> &'static str {
    match column_type {
        ColumnType::Null => "null",
        ColumnType::Bool => "boolean",
        ColumnType::Integer => "integer",
        ColumnType::Float => "float",
        ColumnType::String => "string",
        ColumnType::Mixed => "mixed",
    }
}
