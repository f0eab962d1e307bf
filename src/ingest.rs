//! Reads an exported attendance CSV into raw rows for the engine.

use anyhow::Result;
use std::fs::File;
use tracing::debug;

use crate::types::{CellValue, RawRow};

/// Loads every data row of the CSV at `path`, keyed by the header labels.
///
/// Blank cells become [`CellValue::Empty`], cells that parse as a number
/// become [`CellValue::Number`] (covering spreadsheet day-fraction times
/// surviving a CSV export), everything else stays text.
pub fn load_rows(path: &str) -> Result<Vec<RawRow>> {
    let file = File::open(path)?;
    let mut reader = csv::Reader::from_reader(file);
    let headers = reader.headers()?.clone();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        let mut row = RawRow::new();
        for (i, header) in headers.iter().enumerate() {
            let raw = record.get(i).unwrap_or("");
            row.insert(header.to_string(), classify_cell(raw));
        }
        rows.push(row);
    }

    debug!(path, rows = rows.len(), "Export loaded");
    Ok(rows)
}

fn classify_cell(raw: &str) -> CellValue {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        CellValue::Empty
    } else if let Ok(number) = trimmed.parse::<f64>() {
        CellValue::Number(number)
    } else {
        CellValue::Text(raw.to_string())
    }
}
