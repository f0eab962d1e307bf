//! Header resolution for the flexible, locale-mixed export formats.
//!
//! Exports from different attendance systems label the same column
//! differently ("Check In", "Clock In", "Jam Masuk"). Resolution runs once
//! against the first row and fixes the labels for the whole batch.

use crate::types::RawRow;

/// Resolved source labels for each canonical field.
///
/// `name` and `check_in` are required downstream; everything else degrades
/// to defaults when absent.
#[derive(Debug, Clone, Default)]
pub struct ColumnMap {
    pub name: Option<String>,
    pub date: Option<String>,
    pub shift: Option<String>,
    pub check_in: Option<String>,
    pub schedule_in: Option<String>,
    pub schedule_out: Option<String>,
    pub check_out: Option<String>,
    pub organization: Option<String>,
}

impl ColumnMap {
    /// Resolves every canonical field against the first row's header set.
    pub fn resolve(first_row: &RawRow) -> Self {
        ColumnMap {
            name: find_column(first_row, &["Full Name", "Employee Name", "Name", "Nama"]),
            date: find_column(first_row, &["Date*", "Date", "Attendance Date", "Tanggal"]),
            shift: find_column(first_row, &["Shift", "Shift Name", "Kode Shift"]),
            check_in: find_column(first_row, &["Check In", "Clock In", "In Time", "Jam Masuk"]),
            schedule_in: find_column(first_row, &["Schedule In", "Shift In", "Jam Masuk Jadwal"]),
            schedule_out: find_column(
                first_row,
                &["Schedule Out", "Shift Out", "Jam Pulang Jadwal"],
            ),
            check_out: find_column(first_row, &["Check Out", "Clock Out", "Out Time", "Jam Pulang"]),
            organization: find_column(
                first_row,
                &["Organization", "Organisasi", "Unit", "Departemen"],
            ),
        }
    }
}

/// Returns the first source label matching a candidate, in candidate
/// priority order. Matching is case-insensitive and trims whitespace;
/// no fuzzy or partial matching.
fn find_column(row: &RawRow, candidates: &[&str]) -> Option<String> {
    for candidate in candidates {
        let want = candidate.trim().to_lowercase();
        if let Some(key) = row.keys().find(|k| k.trim().to_lowercase() == want) {
            return Some(key.clone());
        }
    }
    None
}
