//! NDJSON to spreadsheet conversion.
//!
//! Fixed three-column layout: First Name, Last Name, Email. The name is
//! split on whitespace; emails were already normalized during loading.

use crate::convert::{load_records, split_name};
use crate::models::Result;
use rust_xlsxwriter::Workbook;
use serde_json::{Map, Value};
use std::path::Path;
use tracing::info;

const HEADERS: [&str; 3] = ["First Name", "Last Name", "Email"];

/// One spreadsheet row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactRow {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl ContactRow {
    fn from_record(record: &Map<String, Value>) -> Self {
        let (first_name, last_name) = match record.get("name") {
            Some(Value::String(name)) => split_name(name),
            _ => (String::new(), String::new()),
        };

        let email = match record.get("email") {
            Some(Value::String(email)) => email.clone(),
            _ => String::new(),
        };

        Self {
            first_name,
            last_name,
            email,
        }
    }
}

/// Map loaded records onto spreadsheet rows.
pub fn contact_rows(records: &[Map<String, Value>]) -> Vec<ContactRow> {
    records.iter().map(ContactRow::from_record).collect()
}

/// Convert an NDJSON file to an XLSX workbook with a single named sheet.
/// Returns the number of data rows written.
pub fn ndjson_to_xlsx(input: &Path, output: &Path, sheet_name: &str) -> Result<u64> {
    let records = load_records(input)?;
    let rows = contact_rows(&records);

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name)?;

    for (col, header) in HEADERS.iter().enumerate() {
        worksheet.write_string(0, col as u16, *header)?;
    }

    for (i, row) in rows.iter().enumerate() {
        let row_num = (i + 1) as u32;
        worksheet.write_string(row_num, 0, &row.first_name)?;
        worksheet.write_string(row_num, 1, &row.last_name)?;
        worksheet.write_string(row_num, 2, &row.email)?;
    }

    workbook.save(output)?;

    info!(rows = rows.len(), output = %output.display(), "XLSX conversion complete");
    Ok(rows.len() as u64)
}
