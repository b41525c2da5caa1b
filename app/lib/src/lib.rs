//! # tabconv
//!
//! Stateless conversion between tabular formats: CSV, JSON and XLSX.
//!
//! Every conversion runs the same pipeline: parse the payload into a
//! [`TabularData`], drop columns and rows that hold only nulls, then serialize
//! to the requested format. XLSX output is returned base64-encoded so that all
//! results travel as strings.
//!
//! ```
//! use tabconv::{FormatConverter, Payload};
//!
//! let converter = FormatConverter::new();
//! let result = converter.convert(&Payload::from("a,b\n1,2\n"), "csv", "json");
//! let payload = result.payload().unwrap();
//! assert_eq!(payload.mime_type, "application/json");
//! assert!(!payload.is_base64);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod convert;
pub mod converter;
pub mod error;
pub mod format;

pub use config::ConverterConfig;
pub use convert::{Column, ColumnType, TabularData, Value};
pub use converter::{
    output_file_name, ConversionRequest, ConversionResult, ConvertedPayload, FormatConverter,
    Payload,
};
pub use error::{ConvertError, FormatRole, Result};
pub use format::DataFormat;
