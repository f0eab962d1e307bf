//! Aggregation of scanned records into the recap report.
//!
//! Runs strictly after the full row scan: per-record totals depend on the
//! complete per-employee counters.

use chrono::NaiveDate;
use std::collections::HashMap;

use crate::types::{AttendanceRecord, DateCount, NameCount, RecapReport, ShiftCount, SummaryStats};

/// Label grouping late occurrences whose shift column was blank.
const BLANK_SHIFT_LABEL: &str = "None";

/// Backfills per-employee totals, sorts the records, and computes the
/// summary statistics.
///
/// Records sort by employee name then date as plain strings. The trend
/// list separately parses its dates as day/month/year and orders them
/// chronologically; the two orderings intentionally differ.
pub fn aggregate(
    mut records: Vec<AttendanceRecord>,
    late_counts: Vec<(String, usize)>,
) -> RecapReport {
    let totals: HashMap<&str, usize> = late_counts
        .iter()
        .map(|(name, count)| (name.as_str(), *count))
        .collect();
    for record in &mut records {
        record.total_late_count = totals.get(record.full_name.as_str()).copied().unwrap_or(0);
    }

    records.sort_by(|a, b| {
        a.full_name
            .cmp(&b.full_name)
            .then_with(|| a.date.cmp(&b.date))
    });

    let total_cases = records.iter().filter(|r| r.late_minutes > 0).count();
    let total_employees = late_counts.len();
    let avg_per_employee = if total_employees > 0 {
        round2(total_cases as f64 / total_employees as f64)
    } else {
        0.0
    };

    let mut top5: Vec<NameCount> = late_counts
        .into_iter()
        .map(|(name, count)| NameCount { name, count })
        .collect();
    top5.sort_by(|a, b| b.count.cmp(&a.count));
    top5.truncate(5);

    let summary = SummaryStats {
        total_cases,
        total_employees,
        avg_per_employee,
        top5,
        trends: date_trends(&records),
        shift_distribution: shift_distribution(&records),
    };

    RecapReport { records, summary }
}

/// Groups late occurrences by date string, ordered chronologically by
/// parsing each date as day/month/year. Strings that fail to parse order
/// after parseable dates, by string.
fn date_trends(records: &[AttendanceRecord]) -> Vec<DateCount> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut trends: Vec<DateCount> = Vec::new();
    for record in records.iter().filter(|r| r.late_minutes > 0) {
        match index.get(record.date.as_str()) {
            Some(&i) => trends[i].count += 1,
            None => {
                index.insert(record.date.as_str(), trends.len());
                trends.push(DateCount {
                    date: record.date.clone(),
                    count: 1,
                });
            }
        }
    }

    trends.sort_by(|a, b| match (parse_dmy(&a.date), parse_dmy(&b.date)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.date.cmp(&b.date),
    });
    trends
}

/// Groups late occurrences by shift label, most frequent first. Ties keep
/// first-seen order.
fn shift_distribution(records: &[AttendanceRecord]) -> Vec<ShiftCount> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut distribution: Vec<ShiftCount> = Vec::new();
    for record in records.iter().filter(|r| r.late_minutes > 0) {
        let label = if record.shift.trim().is_empty() {
            BLANK_SHIFT_LABEL
        } else {
            record.shift.trim()
        };
        match index.get(label) {
            Some(&i) => distribution[i].value += 1,
            None => {
                index.insert(label.to_string(), distribution.len());
                distribution.push(ShiftCount {
                    name: label.to_string(),
                    value: 1,
                });
            }
        }
    }

    distribution.sort_by(|a, b| b.value.cmp(&a.value));
    distribution
}

fn parse_dmy(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    ["%d/%m/%Y", "%d-%m-%Y"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
