//! Normalization of heterogeneous cell values into wall-clock times.

use chrono::Timelike;

use crate::types::CellValue;

/// Converts a raw cell into a canonical zero-padded "HH:MM" string.
///
/// Rules, in priority order:
/// - numbers are spreadsheet day fractions: seconds are truncated, hours
///   wrap modulo 24
/// - date-time cells yield their wall-clock hour and minute, untouched
/// - text yields the first `H:MM`/`HH:MM` substring; hours are not
///   validated against 0-23
///
/// Returns `None` for empty cells and text without a recognizable pattern.
pub fn normalize_time(val: &CellValue) -> Option<String> {
    match val {
        CellValue::Number(v) => {
            let total_seconds = (v * 86_400.0).round() as i64;
            let hours = (total_seconds / 3600) % 24;
            let minutes = (total_seconds % 3600) / 60;
            Some(format!("{:02}:{:02}", hours, minutes))
        }
        CellValue::Date(dt) => Some(format!("{:02}:{:02}", dt.hour(), dt.minute())),
        CellValue::Text(s) => extract_hhmm(s.trim()),
        CellValue::Empty => None,
    }
}

/// Converts a canonical "HH:MM" string into minutes since midnight.
/// All lateness arithmetic runs on these minute values.
pub fn time_to_minutes(time: &str) -> i64 {
    let mut parts = time.splitn(2, ':');
    let h: i64 = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
    let m: i64 = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
    h * 60 + m
}

/// Scans for the first `\d{1,2}:\d{2}` occurrence and returns it zero-padded.
fn extract_hhmm(s: &str) -> Option<String> {
    let b = s.as_bytes();
    for (i, &c) in b.iter().enumerate() {
        if c != b':' {
            continue;
        }
        if i == 0 || !b[i - 1].is_ascii_digit() {
            continue;
        }
        if i + 2 >= b.len() || !b[i + 1].is_ascii_digit() || !b[i + 2].is_ascii_digit() {
            continue;
        }
        let h_start = if i >= 2 && b[i - 2].is_ascii_digit() {
            i - 2
        } else {
            i - 1
        };
        let h: i64 = s[h_start..i].parse().ok()?;
        let m: i64 = s[i + 1..i + 3].parse().ok()?;
        return Some(format!("{:02}:{:02}", h, m));
    }
    None
}
