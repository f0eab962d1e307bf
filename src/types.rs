//! Data types flowing through the recap pipeline.

use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::HashMap;

/// A single spreadsheet cell as handed over by the export reader.
///
/// Attendance exports store the same logical value in several shapes:
/// times as day fractions, formatted text, or real date-time cells.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Number(f64),
    Text(String),
    Date(NaiveDateTime),
    Empty,
}

impl CellValue {
    /// Renders the cell the way it would appear in the source export.
    /// Dates use day/month/year, whole numbers drop the trailing `.0`.
    pub fn display(&self) -> String {
        match self {
            CellValue::Number(n) if n.fract() == 0.0 => format!("{}", *n as i64),
            CellValue::Number(n) => n.to_string(),
            CellValue::Text(s) => s.clone(),
            CellValue::Date(dt) => dt.format("%-d/%-m/%Y").to_string(),
            CellValue::Empty => String::new(),
        }
    }

    /// True for empty cells and whitespace-only text.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

/// One source row, keyed by the original header labels.
pub type RawRow = HashMap<String, CellValue>;

/// One computed lateness occurrence for one employee on one date.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub full_name: String,
    pub date: String,
    pub shift: String,
    /// Effective schedule start after any adjustment, "HH:MM".
    pub schedule_in: String,
    pub schedule_out: String,
    pub check_in: String,
    pub check_out: String,
    pub late_minutes: i64,
    /// Filled in by the aggregation pass once the whole batch is known.
    pub total_late_count: usize,
    pub is_shift_adjusted: bool,
    /// Declared schedule before adjustment, or the sentinel "OFF".
    pub original_schedule: String,
}

/// Employee name with a lateness count, used by the top-5 ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NameCount {
    pub name: String,
    pub count: usize,
}

/// Late-occurrence count for a single date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateCount {
    pub date: String,
    pub count: usize,
}

/// Late-occurrence count for a single shift label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShiftCount {
    pub name: String,
    pub value: usize,
}

/// Summary aggregate over one processed export.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryStats {
    pub total_cases: usize,
    pub total_employees: usize,
    pub avg_per_employee: f64,
    pub top5: Vec<NameCount>,
    pub trends: Vec<DateCount>,
    pub shift_distribution: Vec<ShiftCount>,
}

/// Complete result for one export: sorted records plus their summary.
#[derive(Debug, Serialize)]
pub struct RecapReport {
    pub records: Vec<AttendanceRecord>,
    pub summary: SummaryStats,
}
