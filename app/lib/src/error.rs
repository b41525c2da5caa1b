//! Error types for tabular conversion.

use thiserror::Error;

use crate::format::DataFormat;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ConvertError>;

/// Which side of a conversion a format tag belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatRole {
    /// The format the payload is declared to be in.
    Input,
    /// The format the caller wants back.
    Output,
}

impl std::fmt::Display for FormatRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FormatRole::Input => f.write_str("input"),
            FormatRole::Output => f.write_str("output"),
        }
    }
}

/// Errors produced while converting tabular data.
///
/// None of these are fatal: [`FormatConverter::convert`](crate::FormatConverter::convert)
/// turns every variant into a failure result carrying the `Display` text.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// A format tag outside `csv`, `json`, `excel`.
    #[error("unsupported {role} format: {name:?}")]
    UnsupportedFormat {
        /// Whether the tag was the input or the output format.
        role: FormatRole,
        /// The tag as received.
        name: String,
    },

    /// The payload is malformed for its declared format.
    #[error("error during conversion: failed to parse {format} input: {message}")]
    ParseFailure {
        /// Declared input format.
        format: DataFormat,
        /// Underlying parser message.
        message: String,
    },

    /// Every row was dropped by normalization.
    #[error("data is empty after processing")]
    EmptyResult,

    /// The payload kind cannot carry the declared format.
    #[error("{format} conversion requires a file, not pasted text")]
    InvalidSourceForFormat {
        /// Declared input format.
        format: DataFormat,
    },

    /// The output writer rejected the table.
    #[error("error during conversion: failed to write {format} output: {message}")]
    WriteFailure {
        /// Requested output format.
        format: DataFormat,
        /// Underlying writer message.
        message: String,
    },

    /// Configuration could not be loaded.
    #[error("invalid converter configuration: {0}")]
    InvalidConfig(String),
}

impl ConvertError {
    pub(crate) fn parse(format: DataFormat, message: impl ToString) -> Self {
        ConvertError::ParseFailure {
            format,
            message: message.to_string(),
        }
    }

    pub(crate) fn write(format: DataFormat, message: impl ToString) -> Self {
        ConvertError::WriteFailure {
            format,
            message: message.to_string(),
        }
    }

    /// Whether the error was caused by the caller's payload rather than the request shape.
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            ConvertError::ParseFailure { .. } | ConvertError::EmptyResult
        )
    }
}
