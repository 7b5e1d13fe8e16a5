//! Paisa Document Layer
//!
//! Decodes uploaded statement files into raw text for the extraction
//! pipeline. Supported formats, dispatched on declared MIME type:
//!
//! - `application/pdf`: pages concatenated in order, text fragments joined
//! - `text/csv`: rows converted to a JSON-encoded array of row objects
//! - `text/plain`: returned verbatim
//!
//! Any other MIME type fails with `UnsupportedFormat`. The decoded text is
//! ephemeral; it is produced here and consumed once by the extractor.

#![warn(missing_docs)]

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

/// Errors that can occur while decoding an uploaded file
#[derive(Error, Debug)]
pub enum DocumentError {
    /// The declared MIME type is not one of pdf/csv/plain
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// The file could not be decoded as its declared format
    #[error("Failed to parse file: {0}")]
    Parse(String),
}

/// Decode a file buffer into statement text based on its declared MIME type
///
/// # Examples
///
/// ```
/// let text = paisa_document::decode(b"hello statement", "text/plain").unwrap();
/// assert_eq!(text, "hello statement");
/// ```
pub fn decode(buffer: &[u8], mime_type: &str) -> Result<String, DocumentError> {
    debug!(mime = mime_type, bytes = buffer.len(), "Decoding upload");

    // Ignore MIME parameters such as "; charset=utf-8"
    let mime = mime_type.split(';').next().unwrap_or("").trim();
    match mime {
        "application/pdf" => decode_pdf(buffer),
        "text/csv" => decode_csv(buffer),
        "text/plain" => Ok(String::from_utf8_lossy(buffer).into_owned()),
        other => Err(DocumentError::UnsupportedFormat(other.to_string())),
    }
}

/// Extract text from a PDF, pages in order
fn decode_pdf(buffer: &[u8]) -> Result<String, DocumentError> {
    pdf_extract::extract_text_from_mem(buffer)
        .map_err(|e| DocumentError::Parse(format!("PDF extraction failed: {}", e)))
}

/// Convert CSV rows into a JSON array of row objects keyed by header
///
/// The LLM handles the JSON encoding at least as well as raw comma rows,
/// and it preserves the header/value association.
fn decode_csv(buffer: &[u8]) -> Result<String, DocumentError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(buffer);

    let headers = reader
        .headers()
        .map_err(|e| DocumentError::Parse(format!("CSV header error: {}", e)))?
        .clone();

    let mut rows: Vec<Value> = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| DocumentError::Parse(format!("CSV row error: {}", e)))?;
        let mut row = Map::new();
        for (header, field) in headers.iter().zip(record.iter()) {
            row.insert(header.to_string(), Value::String(field.to_string()));
        }
        rows.push(Value::Object(row));
    }

    serde_json::to_string(&rows).map_err(|e| DocumentError::Parse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_verbatim() {
        let text = decode(b"line one\nline two", "text/plain").unwrap();
        assert_eq!(text, "line one\nline two");
    }

    #[test]
    fn test_csv_rows_become_json_objects() {
        let csv = b"Date,Narration,Amount\n06-09-2023,UPI/LILA PITTURA DECO,300.00\n";
        let text = decode(csv, "text/csv").unwrap();

        let parsed: Vec<serde_json::Value> = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0]["Date"], "06-09-2023");
        assert_eq!(parsed[0]["Narration"], "UPI/LILA PITTURA DECO");
        assert_eq!(parsed[0]["Amount"], "300.00");
    }

    #[test]
    fn test_csv_empty_body_is_empty_array() {
        let text = decode(b"Date,Narration,Amount\n", "text/csv").unwrap();
        assert_eq!(text, "[]");
    }

    #[test]
    fn test_mime_parameters_are_ignored() {
        let text = decode(b"hello", "text/plain; charset=utf-8").unwrap();
        assert_eq!(text, "hello");
    }

    #[test]
    fn test_unsupported_format() {
        let result = decode(b"...", "image/png");
        assert!(matches!(result, Err(DocumentError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_invalid_pdf_is_parse_error() {
        let result = decode(b"not a pdf", "application/pdf");
        assert!(matches!(result, Err(DocumentError::Parse(_))));
    }
}
