//! NDJSON converters: delimited flat files and spreadsheets.

mod csv;
mod email;
mod xlsx;

pub use csv::*;
pub use email::*;
pub use xlsx::*;

use crate::models::{Result, StarmailError};
use serde_json::{Map, Value};
use std::path::Path;
use tracing::info;

/// Load an NDJSON file into JSON objects, trimming the `name` field and
/// trimming + normalizing the `email` field when present.
///
/// Blank lines are skipped; a line that is not a JSON object is a fatal
/// parse error naming the line number. An empty file is a fatal no-data
/// condition.
pub fn load_records(path: &Path) -> Result<Vec<Map<String, Value>>> {
    let content =
        std::fs::read_to_string(path).map_err(|e| StarmailError::io("reading NDJSON file", e))?;

    let mut records = Vec::new();
    for (line_num, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let value: Value = serde_json::from_str(line)
            .map_err(|e| StarmailError::ParseError(format!("Line {}: {}", line_num + 1, e)))?;
        let mut object = match value {
            Value::Object(map) => map,
            other => {
                return Err(StarmailError::ParseError(format!(
                    "Line {}: expected a JSON object, got {}",
                    line_num + 1,
                    kind_name(&other)
                )));
            }
        };

        if let Some(Value::String(name)) = object.get_mut("name") {
            *name = name.trim().to_string();
        }
        if let Some(Value::String(email)) = object.get_mut("email") {
            *email = normalize_email(email.trim());
        }

        records.push(object);
    }

    if records.is_empty() {
        return Err(StarmailError::NoData(path.to_owned()));
    }

    info!(count = records.len(), "Loaded NDJSON records");
    Ok(records)
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
