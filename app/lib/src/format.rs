//! Format tags accepted by the converter.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ConvertError, FormatRole};

/// One of the three tabular formats the converter reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataFormat {
    /// Comma-separated values with a header row.
    Csv,
    /// An array of row objects (other table shapes are accepted on input).
    Json,
    /// An XLSX workbook; only the first worksheet is used.
    Excel,
}

impl DataFormat {
    /// Resolve a format tag, reporting it against the given role on failure.
    pub fn parse_tag(name: &str, role: FormatRole) -> Result<Self, ConvertError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(DataFormat::Csv),
            "json" => Ok(DataFormat::Json),
            "excel" | "xlsx" => Ok(DataFormat::Excel),
            _ => Err(ConvertError::UnsupportedFormat {
                role,
                name: name.to_string(),
            }),
        }
    }

    /// The tag as used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            DataFormat::Csv => "csv",
            DataFormat::Json => "json",
            DataFormat::Excel => "excel",
        }
    }

    /// MIME type of serialized output in this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            DataFormat::Csv => "text/csv",
            DataFormat::Json => "application/json",
            DataFormat::Excel => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
        }
    }

    /// File extension for downloads.
    pub fn extension(&self) -> &'static str {
        match self {
            DataFormat::Csv => "csv",
            DataFormat::Json => "json",
            DataFormat::Excel => "xlsx",
        }
    }

    /// Whether serialized output is binary and travels base64-encoded.
    pub fn is_binary(&self) -> bool {
        matches!(self, DataFormat::Excel)
    }
}

impl fmt::Display for DataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataFormat {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DataFormat::parse_tag(s, FormatRole::Input)
    }
}
