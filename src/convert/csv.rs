//! NDJSON to delimited flat file conversion.
//!
//! Columns are the union of keys observed across all records, in first-seen
//! order. Fields containing the active delimiter, a double quote, or a
//! newline are quoted with internal quotes doubled; everything else is
//! written bare.

use crate::convert::load_records;
use crate::models::{Result, StarmailError};
use csv::WriterBuilder;
use serde_json::{Map, Value};
use std::path::Path;
use tracing::info;

/// Options for CSV conversion.
#[derive(Debug, Clone)]
pub struct CsvOptions {
    /// Field delimiter; must be a single byte
    pub delimiter: String,
    /// Whether to emit a header row
    pub include_headers: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: ",".to_string(),
            include_headers: true,
        }
    }
}

/// Convert an NDJSON file to CSV. Returns the number of data rows written.
pub fn ndjson_to_csv(input: &Path, output: &Path, options: &CsvOptions) -> Result<u64> {
    let delimiter = parse_delimiter(&options.delimiter)?;
    let records = load_records(input)?;
    let columns = column_union(&records);

    let mut writer = WriterBuilder::new()
        .delimiter(delimiter)
        .from_path(output)
        .map_err(StarmailError::Csv)?;

    if options.include_headers {
        writer.write_record(&columns)?;
    }

    let mut rows = 0u64;
    for record in &records {
        let row: Vec<String> = columns
            .iter()
            .map(|key| field_text(record.get(key)))
            .collect();
        writer.write_record(&row)?;
        rows += 1;
    }
    writer.flush().map_err(|e| StarmailError::io("flushing CSV output", e))?;

    info!(rows, output = %output.display(), "CSV conversion complete");
    Ok(rows)
}

/// Union of keys across all records, in first-seen order.
fn column_union(records: &[Map<String, Value>]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for record in records {
        for key in record.keys() {
            if !columns.iter().any(|c| c == key) {
                columns.push(key.clone());
            }
        }
    }
    columns
}

/// Render one cell: missing and null are empty, strings are verbatim, other
/// scalars use their JSON text.
fn field_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn parse_delimiter(delimiter: &str) -> Result<u8> {
    match delimiter.as_bytes() {
        [byte] => Ok(*byte),
        _ => Err(StarmailError::InvalidInput(format!(
            "delimiter must be a single byte, got {delimiter:?}"
        ))),
    }
}
