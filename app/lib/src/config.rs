//! Converter configuration.

use serde::{Deserialize, Serialize};

use crate::error::{ConvertError, Result};

/// CSV cell texts read as null when type inference is on or off.
pub const DEFAULT_NA_VALUES: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Configuration for [`FormatConverter`](crate::FormatConverter).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    /// Infer booleans and numbers from CSV text cells.
    pub infer_types: bool,

    /// CSV cell texts treated as null.
    pub na_values: Vec<String>,

    /// Field delimiter for CSV input and output. Must be ASCII.
    pub csv_delimiter: char,

    /// Spaces per indentation level in JSON output.
    pub json_indent: usize,

    /// Name of the worksheet written to XLSX output.
    pub sheet_name: String,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            infer_types: true,
            na_values: DEFAULT_NA_VALUES.iter().map(|s| s.to_string()).collect(),
            csv_delimiter: ',',
            json_indent: 4,
            sheet_name: "Sheet1".to_string(),
        }
    }
}

impl ConverterConfig {
    /// Load a configuration from JSON text. Missing keys take their defaults.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: ConverterConfig =
            serde_json::from_str(text).map_err(|e| ConvertError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the values that serde cannot.
    pub fn validate(&self) -> Result<()> {
        if !self.csv_delimiter.is_ascii() || self.csv_delimiter == '"' {
            return Err(ConvertError::InvalidConfig(format!(
                "csv_delimiter must be a single ASCII character other than '\"', got {:?}",
                self.csv_delimiter
            )));
        }
        if self.sheet_name.trim().is_empty() {
            return Err(ConvertError::InvalidConfig(
                "sheet_name must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub(crate) fn delimiter_byte(&self) -> u8 {
        // validate() guarantees ASCII; fall back to a comma otherwise
        u8::try_from(self.csv_delimiter).unwrap_or(b',')
    }

    pub(crate) fn is_na(&self, text: &str) -> bool {
        self.na_values.iter().any(|na| na == text)
    }
}
