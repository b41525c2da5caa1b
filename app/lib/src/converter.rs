//! The format converter.
//!
//! [`FormatConverter`] turns a payload in one format into a payload in another:
//! parse into a [`TabularData`], normalize, serialize. It keeps no state between
//! calls, so one instance can serve any number of threads.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::config::ConverterConfig;
use crate::convert::{csv, excel, json, TabularData};
use crate::error::{ConvertError, FormatRole, Result};
use crate::format::DataFormat;

/// Raw input as handed over by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// An uploaded file.
    Bytes(Vec<u8>),
    /// Pasted text.
    Text(String),
}

impl Payload {
    /// The payload as bytes, regardless of kind.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Payload::Bytes(bytes) => bytes,
            Payload::Text(text) => text.as_bytes(),
        }
    }

    /// Payload size in bytes.
    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    /// Whether the payload carries no data.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the payload is pasted text.
    pub fn is_text(&self) -> bool {
        matches!(self, Payload::Text(_))
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Payload::Bytes(bytes)
    }
}

impl From<&[u8]> for Payload {
    fn from(bytes: &[u8]) -> Self {
        Payload::Bytes(bytes.to_vec())
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Payload::Text(text)
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Payload::Text(text.to_string())
    }
}

/// One conversion request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRequest {
    /// Declared format of the payload.
    pub input_format: String,
    /// Requested output format.
    pub output_format: String,
    /// Data to convert.
    pub payload: Payload,
}

impl ConversionRequest {
    /// Build a request.
    pub fn new(
        payload: impl Into<Payload>,
        input_format: impl Into<String>,
        output_format: impl Into<String>,
    ) -> Self {
        Self {
            input_format: input_format.into(),
            output_format: output_format.into(),
            payload: payload.into(),
        }
    }
}

/// Successful conversion output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertedPayload {
    /// Output text, or base64 of the output bytes when `is_base64` is set.
    pub content: String,
    /// MIME type of the decoded output.
    pub mime_type: String,
    /// Whether `content` is base64 of binary data.
    pub is_base64: bool,
}

impl ConvertedPayload {
    /// The output as file bytes, decoding base64 content.
    pub fn to_bytes(&self) -> std::result::Result<Vec<u8>, base64::DecodeError> {
        if self.is_base64 {
            BASE64.decode(self.content.as_bytes())
        } else {
            Ok(self.content.as_bytes().to_vec())
        }
    }

    /// Whether the decoded output is binary.
    pub fn is_binary(&self) -> bool {
        self.is_base64
    }
}

/// Outcome of [`FormatConverter::convert`].
///
/// Serializes to the wire contract: `{"content", "mimeType", "isBase64"}` on
/// success and `{"error"}` on failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConversionResult {
    /// Conversion produced output.
    Success(ConvertedPayload),
    /// Conversion failed; the message is meant for the end user.
    Failure {
        /// Human-readable reason.
        #[serde(rename = "error")]
        message: String,
    },
}

impl ConversionResult {
    /// Whether the conversion succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self, ConversionResult::Success(_))
    }

    /// The output, if any.
    pub fn payload(&self) -> Option<&ConvertedPayload> {
        match self {
            ConversionResult::Success(payload) => Some(payload),
            ConversionResult::Failure { .. } => None,
        }
    }

    /// The failure message, if any.
    pub fn error(&self) -> Option<&str> {
        match self {
            ConversionResult::Success(_) => None,
            ConversionResult::Failure { message } => Some(message),
        }
    }
}

impl From<Result<ConvertedPayload>> for ConversionResult {
    fn from(result: Result<ConvertedPayload>) -> Self {
        match result {
            Ok(payload) => ConversionResult::Success(payload),
            Err(e) => ConversionResult::Failure {
                message: e.to_string(),
            },
        }
    }
}

/// Stateless CSV / JSON / XLSX converter.
#[derive(Debug, Clone, Default)]
pub struct FormatConverter {
    config: ConverterConfig,
}

impl FormatConverter {
    /// Create a converter with the default configuration.
    pub fn new() -> Self {
        Self {
            config: ConverterConfig::default(),
        }
    }

    /// Create a converter with the given configuration.
    pub fn with_config(config: ConverterConfig) -> Self {
        Self { config }
    }

    /// Convert `payload` from `input_format` to `output_format`.
    ///
    /// Never fails: every error becomes [`ConversionResult::Failure`].
    pub fn convert(
        &self,
        payload: &Payload,
        input_format: &str,
        output_format: &str,
    ) -> ConversionResult {
        self.resolve(input_format, output_format)
            .and_then(|(from, to)| self.try_convert(payload, from, to))
            .into()
    }

    /// Convert a request, consuming it.
    pub fn handle(&self, request: ConversionRequest) -> ConversionResult {
        self.convert(
            &request.payload,
            &request.input_format,
            &request.output_format,
        )
    }

    /// Typed conversion that returns the error value.
    pub fn try_convert(
        &self,
        payload: &Payload,
        from: DataFormat,
        to: DataFormat,
    ) -> Result<ConvertedPayload> {
        let table = self.parse(payload, from)?.into_normalized()?;
        self.serialize(&table, to)
    }

    /// Resolve both format tags.
    pub fn resolve(&self, input_format: &str, output_format: &str) -> Result<(DataFormat, DataFormat)> {
        let from = DataFormat::parse_tag(input_format, FormatRole::Input)?;
        let to = DataFormat::parse_tag(output_format, FormatRole::Output)?;
        Ok((from, to))
    }

    /// Parse a payload into a table without normalizing it.
    pub fn parse(&self, payload: &Payload, format: DataFormat) -> Result<TabularData> {
        match (format, payload) {
            (DataFormat::Excel, Payload::Text(_)) => {
                Err(ConvertError::InvalidSourceForFormat { format })
            }
            (DataFormat::Excel, Payload::Bytes(bytes)) => excel::parse_excel(bytes),
            (DataFormat::Csv, payload) => csv::parse_csv(payload.as_bytes(), &self.config),
            (DataFormat::Json, Payload::Text(text)) => json::parse_json(text),
            (DataFormat::Json, Payload::Bytes(bytes)) => json::parse_json_bytes(bytes),
        }
    }

    /// Serialize a table, base64-encoding binary formats.
    pub fn serialize(&self, data: &TabularData, format: DataFormat) -> Result<ConvertedPayload> {
        let content = match format {
            DataFormat::Csv => csv::write_csv(data, &self.config)?,
            DataFormat::Json => json::write_json(data, &self.config)?,
            DataFormat::Excel => BASE64.encode(excel::write_excel(data, &self.config)?),
        };
        Ok(ConvertedPayload {
            content,
            mime_type: format.mime_type().to_string(),
            is_base64: format.is_binary(),
        })
    }
}

/// File name for converted output, e.g. `converted_data.xlsx`.
pub fn output_file_name(stem: &str, format: DataFormat) -> String {
    format!("{}.{}", stem, format.extension())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::Value;
    use calamine::{open_workbook_from_rs, Reader, Xlsx};
    use serde_json::json;
    use std::io::Cursor;

    fn convert(input: &str, from: &str, to: &str) -> ConversionResult {
        FormatConverter::new().convert(&Payload::from(input), from, to)
    }

    #[test]
    fn test_csv_to_json_drops_null_row() {
        let result = convert("a,b\n1,2\n,\n3,4\n", "csv", "json");
        let payload = result.payload().expect("conversion succeeds");
        assert_eq!(payload.mime_type, "application/json");
        assert!(!payload.is_base64);

        let parsed: serde_json::Value = serde_json::from_str(&payload.content).unwrap();
        assert_eq!(parsed, json!([{"a": 1, "b": 2}, {"a": 3, "b": 4}]));
    }

    #[test]
    fn test_header_only_csv_is_empty_for_every_output() {
        for to in ["csv", "json", "excel"] {
            let result = convert("a,b\n", "csv", to);
            assert_eq!(result.error(), Some("data is empty after processing"));
        }
    }

    #[test]
    fn test_excel_text_payload_rejected_before_parse() {
        // garbage that would fail parsing if it got that far
        let converter = FormatConverter::new();
        let err = converter
            .parse(&Payload::from("not a workbook"), DataFormat::Excel)
            .unwrap_err();
        assert!(matches!(
            err,
            ConvertError::InvalidSourceForFormat {
                format: DataFormat::Excel
            }
        ));

        let result = convert("not a workbook", "excel", "csv");
        assert_eq!(
            result.error(),
            Some("excel conversion requires a file, not pasted text")
        );
    }

    #[test]
    fn test_unsupported_formats() {
        let result = convert("a\n1\n", "xml", "csv");
        assert!(result.error().unwrap().contains("unsupported input format"));

        let result = convert("a\n1\n", "csv", "yaml");
        assert!(result.error().unwrap().contains("unsupported output format"));
    }

    #[test]
    fn test_unsupported_format_checked_before_excel_source() {
        let result = convert("x", "excel", "toml");
        assert!(result.error().unwrap().contains("unsupported output format"));
    }

    #[test]
    fn test_parse_failure_message() {
        let result = convert("[{\"a\": 1", "json", "csv");
        let message = result.error().unwrap();
        assert!(message.starts_with("error during conversion"), "{}", message);
        assert!(message.contains("EOF"), "{}", message);
    }

    #[test]
    fn test_csv_to_excel_is_base64_workbook() {
        let result = convert("name,qty\nbolt,4\nnut,10\n", "csv", "excel");
        let payload = result.payload().unwrap();
        assert!(payload.is_base64);
        assert!(payload.is_binary());
        assert_eq!(
            payload.mime_type,
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
        );

        let bytes = payload.to_bytes().unwrap();
        let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes)).unwrap();
        assert_eq!(workbook.sheet_names(), vec!["Sheet1".to_string()]);
        let range = workbook.worksheet_range_at(0).unwrap().unwrap();
        let header: Vec<String> = range.rows().next().unwrap().iter().map(|c| c.to_string()).collect();
        assert_eq!(header, vec!["name", "qty"]);
    }

    #[test]
    fn test_excel_bytes_to_csv() {
        let converter = FormatConverter::new();
        let excel = converter
            .convert(&Payload::from("id,name\n1,Ada\n2,Bob\n"), "csv", "excel")
            .payload()
            .unwrap()
            .to_bytes()
            .unwrap();

        let result = converter.convert(&Payload::Bytes(excel), "excel", "csv");
        assert_eq!(result.payload().unwrap().content, "id,name\n1,Ada\n2,Bob\n");
    }

    #[test]
    fn test_large_integer_survives_excel_round_trip() {
        let converter = FormatConverter::new();
        let excel = converter
            .convert(&Payload::from("id\n9007199254740993\n"), "csv", "excel")
            .payload()
            .unwrap()
            .to_bytes()
            .unwrap();

        let result = converter.convert(&Payload::Bytes(excel), "excel", "csv");
        assert_eq!(result.payload().unwrap().content, "id\n9007199254740993\n");
    }

    #[test]
    fn test_csv_numbers_after_delimiter_spaces() {
        let result = convert("a, b\n1, 2\n", "csv", "json");
        let parsed: serde_json::Value =
            serde_json::from_str(&result.payload().unwrap().content).unwrap();
        assert_eq!(parsed, json!([{"a": 1, " b": 2}]));
    }

    #[test]
    fn test_json_bytes_payload() {
        let payload = Payload::Bytes(br#"[{"x": "a"}, {"x": null}]"#.to_vec());
        let result = FormatConverter::new().convert(&payload, "json", "csv");
        assert_eq!(result.payload().unwrap().content, "x\na\n");
    }

    #[test]
    fn test_handle_request() {
        let request = ConversionRequest::new("k,v\nx,1\n", "CSV", "Json");
        let result = FormatConverter::new().handle(request);
        assert!(result.is_success());
    }

    #[test]
    fn test_wire_contract() {
        let success = ConversionResult::Success(ConvertedPayload {
            content: "a\n1\n".to_string(),
            mime_type: "text/csv".to_string(),
            is_base64: false,
        });
        assert_eq!(
            serde_json::to_value(&success).unwrap(),
            json!({"content": "a\n1\n", "mimeType": "text/csv", "isBase64": false})
        );

        let failure = ConversionResult::Failure {
            message: "data is empty after processing".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&failure).unwrap(),
            json!({"error": "data is empty after processing"})
        );
    }

    #[test]
    fn test_parse_does_not_normalize() {
        let table = FormatConverter::new()
            .parse(&Payload::from("a,b\n,\n1,\n"), DataFormat::Csv)
            .unwrap();
        assert_eq!(table.row_count, 2);
        assert_eq!(table.column_count(), 2);
        assert_eq!(table.row(1).unwrap()[0], &Value::Integer(1));
    }

    #[test]
    fn test_output_file_name() {
        assert_eq!(
            output_file_name("converted_data", DataFormat::Excel),
            "converted_data.xlsx"
        );
    }

    #[test]
    fn test_converter_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<FormatConverter>();
    }
}
