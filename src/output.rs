//! Output formatting and persistence for recap results.
//!
//! Supports pretty-printing, JSON serialization, and CSV append.

use anyhow::Result;
use tracing::debug;

use crate::types::{AttendanceRecord, SummaryStats};
use csv::WriterBuilder;
use std::fs::OpenOptions;
use std::path::Path;

/// Logs a record using Rust's debug pretty-print format.
pub fn print_pretty(record: &AttendanceRecord) {
    debug!("{:#?}", record);
}

/// Prints the summary statistics as pretty JSON on stdout.
pub fn print_summary_json(summary: &SummaryStats) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(summary)?);
    Ok(())
}

/// Appends recap records as rows to a CSV file.
///
/// Creates the file with headers if it does not already exist.
pub fn append_records(path: &str, records: &[AttendanceRecord]) -> Result<()> {
    let file_exists = Path::new(path).exists();
    debug!(path, file_exists, count = records.len(), "Appending CSV records");

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists) // IMPORTANT when appending
        .from_writer(file);

    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;

    Ok(())
}
