//! The lateness scan: a per-row state machine that decides whether an
//! employee was on a known schedule, off-duty but present, or needs shift
//! re-attribution, and computes final lateness minutes.
//!
//! Row-level problems (blank name, unparseable check-in) drop the row;
//! only structural problems abort the batch.

use thiserror::Error;
use tracing::{debug, info};

use crate::columns::ColumnMap;
use crate::shifts::{ShiftConfig, nearest_shift};
use crate::summary::aggregate;
use crate::timeparse::{normalize_time, time_to_minutes};
use crate::types::{AttendanceRecord, CellValue, RawRow, RecapReport};

/// Schedule start applied when the export carries no schedule column, or
/// when a schedule cell holds a non-blank value that fails to normalize.
const DEFAULT_WORK_START: &str = "08:00";

/// Schedule end applied when the export carries no usable schedule-out.
const DEFAULT_WORK_END: &str = "17:00";

/// Recorded as the pre-adjustment schedule of an off-day check-in.
const OFF_SENTINEL: &str = "OFF";

/// Fatal, batch-level failures surfaced verbatim to the caller.
#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    #[error("file empty or unreadable")]
    EmptyInput,
    #[error("required column not found")]
    MissingRequiredColumn,
}

/// Runs the full scan over one export and aggregates the result.
///
/// Column identities are fixed from the first row; every row then passes
/// independently through the state machine. Emits zero or one record per
/// row.
///
/// # Errors
///
/// [`EngineError::EmptyInput`] when `rows` is empty,
/// [`EngineError::MissingRequiredColumn`] when neither a name nor a
/// check-in column can be resolved.
pub fn process_rows(rows: &[RawRow], config: &ShiftConfig) -> Result<RecapReport, EngineError> {
    let Some(first) = rows.first() else {
        return Err(EngineError::EmptyInput);
    };

    let columns = ColumnMap::resolve(first);
    if columns.name.is_none() || columns.check_in.is_none() {
        return Err(EngineError::MissingRequiredColumn);
    }

    let shifts = config.known_shifts();

    let mut acc = ScanAccumulator::default();
    for row in rows {
        match evaluate_row(row, &columns, config, &shifts) {
            Some(record) => acc.fold(record),
            None => acc.excluded += 1,
        }
    }

    info!(
        rows = rows.len(),
        records = acc.records.len(),
        excluded = acc.excluded,
        "Scan complete"
    );

    Ok(acc.finish())
}

/// Accumulator threaded through the scan. Folding a record is commutative
/// across rows; ordering only matters in the final aggregation sort.
#[derive(Default)]
struct ScanAccumulator {
    records: Vec<AttendanceRecord>,
    /// Per-employee late counts in first-seen order. The order carries
    /// through to ranking tie-breaks.
    late_counts: Vec<(String, usize)>,
    late_index: std::collections::HashMap<String, usize>,
    excluded: usize,
}

impl ScanAccumulator {
    fn fold(&mut self, record: AttendanceRecord) {
        if record.late_minutes > 0 {
            let idx = match self.late_index.get(&record.full_name) {
                Some(&i) => i,
                None => {
                    self.late_counts.push((record.full_name.clone(), 0));
                    self.late_index
                        .insert(record.full_name.clone(), self.late_counts.len() - 1);
                    self.late_counts.len() - 1
                }
            };
            self.late_counts[idx].1 += 1;
        }
        self.records.push(record);
    }

    fn finish(self) -> RecapReport {
        aggregate(self.records, self.late_counts)
    }
}

/// Evaluates one row. Returns `None` for rows excluded from output: blank
/// or "nan" names, unparseable check-ins, and rows that are neither late
/// nor adjusted.
fn evaluate_row(
    row: &RawRow,
    columns: &ColumnMap,
    config: &ShiftConfig,
    shifts: &[String],
) -> Option<AttendanceRecord> {
    let name = cell(row, &columns.name)
        .map(|v| v.display().trim().to_string())
        .unwrap_or_default();
    if name.is_empty() || name.eq_ignore_ascii_case("nan") {
        debug!("Row skipped: blank name");
        return None;
    }

    let check_in = normalize_time(cell(row, &columns.check_in)?)?;
    let check_in_min = time_to_minutes(&check_in);

    let (schedule_in, is_off) = declared_schedule(row, columns);

    let shift_label = cell(row, &columns.shift)
        .map(|v| v.display().trim().to_string())
        .unwrap_or_default();
    let organization = cell(row, &columns.organization)
        .map(|v| v.display().trim().to_string())
        .unwrap_or_default();

    let mut final_schedule = schedule_in.clone();
    let mut is_shift_adjusted = false;
    let mut original_schedule = schedule_in;

    if is_off {
        // Off-duty but present: attribute the check-in to the nearest shift.
        if let Some((label, _)) = nearest_shift(check_in_min, shifts) {
            final_schedule = label.to_string();
            is_shift_adjusted = true;
            original_schedule = OFF_SENTINEL.to_string();
        }
    } else {
        let diff = check_in_min - time_to_minutes(&final_schedule);
        if diff > config.threshold && !config.is_exempt(&organization, &shift_label) {
            // Implausibly late for the declared schedule: re-attribute when
            // a known shift sits strictly closer to the check-in.
            if let Some((label, minutes)) = nearest_shift(check_in_min, shifts) {
                if (check_in_min - minutes).abs() < diff.abs() {
                    final_schedule = label.to_string();
                    is_shift_adjusted = true;
                }
            }
        }
    }

    let late_minutes = (check_in_min - time_to_minutes(&final_schedule)).max(0);

    if late_minutes == 0 && !is_shift_adjusted {
        return None;
    }

    let schedule_out = cell(row, &columns.schedule_out)
        .and_then(normalize_time)
        .unwrap_or_else(|| DEFAULT_WORK_END.to_string());
    let check_out = match cell(row, &columns.check_out) {
        Some(v) => normalize_time(v).unwrap_or_else(|| v.display().trim().to_string()),
        None => String::new(),
    };
    let date = cell(row, &columns.date)
        .map(|v| v.display())
        .unwrap_or_default();

    Some(AttendanceRecord {
        full_name: name,
        date,
        shift: shift_label,
        schedule_in: final_schedule,
        schedule_out,
        check_in,
        check_out,
        late_minutes,
        total_late_count: 0,
        is_shift_adjusted,
        original_schedule,
    })
}

/// Resolves the declared schedule-in time and the day-off flag for a row.
///
/// A schedule cell that is blank, contains "off" (any case), or normalizes
/// to the "00:00" sentinel marks the day off. A non-blank cell that fails
/// to normalize falls back to the default start.
fn declared_schedule(row: &RawRow, columns: &ColumnMap) -> (String, bool) {
    if columns.schedule_in.is_none() {
        return (DEFAULT_WORK_START.to_string(), false);
    }

    let Some(value) = cell(row, &columns.schedule_in) else {
        return (DEFAULT_WORK_START.to_string(), true);
    };

    let off_text = matches!(value, CellValue::Text(t) if t.to_lowercase().contains("off"));
    if value.is_blank() || off_text {
        return (DEFAULT_WORK_START.to_string(), true);
    }

    match normalize_time(value) {
        Some(t) if t == "00:00" => (DEFAULT_WORK_START.to_string(), true),
        Some(t) => (t, false),
        None => (DEFAULT_WORK_START.to_string(), false),
    }
}

fn cell<'a>(row: &'a RawRow, label: &Option<String>) -> Option<&'a CellValue> {
    label.as_ref().and_then(|l| row.get(l))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> RawRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), CellValue::Text(v.to_string())))
            .collect()
    }

    fn process(rows: &[RawRow]) -> RecapReport {
        process_rows(rows, &ShiftConfig::default()).unwrap()
    }

    #[test]
    fn test_late_within_tolerance_keeps_schedule() {
        // Scenario: 5 minutes late against a declared 08:00 start
        let report = process(&[row(&[
            ("Full Name", "Ana"),
            ("Check In", "08:05"),
            ("Schedule In", "08:00"),
        ])]);

        assert_eq!(report.records.len(), 1);
        let r = &report.records[0];
        assert_eq!(r.late_minutes, 5);
        assert!(!r.is_shift_adjusted);
        assert_eq!(r.schedule_in, "08:00");
        assert_eq!(r.original_schedule, "08:00");
    }

    #[test]
    fn test_off_but_present_is_attributed_to_nearest_shift() {
        let report = process(&[row(&[
            ("Full Name", "Budi"),
            ("Check In", "13:50"),
            ("Schedule In", "OFF"),
        ])]);

        let r = &report.records[0];
        assert_eq!(r.schedule_in, "13:45");
        assert!(r.is_shift_adjusted);
        assert_eq!(r.original_schedule, "OFF");
        assert_eq!(r.late_minutes, 5);
    }

    #[test]
    fn test_implausible_lateness_triggers_reattribution() {
        // 14:00 against 07:45 is 375 minutes; 13:45 sits 15 minutes away
        let report = process(&[row(&[
            ("Full Name", "Citra"),
            ("Check In", "14:00"),
            ("Schedule In", "07:45"),
        ])]);

        let r = &report.records[0];
        assert!(r.is_shift_adjusted);
        assert_eq!(r.schedule_in, "13:45");
        assert_eq!(r.original_schedule, "07:45");
        assert_eq!(r.late_minutes, 15);
    }

    #[test]
    fn test_exempt_night_shift_keeps_declared_schedule() {
        let report = process(&[row(&[
            ("Full Name", "Citra"),
            ("Check In", "14:00"),
            ("Schedule In", "07:45"),
            ("Organization", "OPERASIONAL"),
            ("Shift", "N"),
        ])]);

        let r = &report.records[0];
        assert!(!r.is_shift_adjusted);
        assert_eq!(r.schedule_in, "07:45");
        assert_eq!(r.late_minutes, 375);
    }

    #[test]
    fn test_blank_and_nan_names_are_skipped() {
        let report = process(&[
            row(&[("Full Name", ""), ("Check In", "09:00")]),
            row(&[("Full Name", "nan"), ("Check In", "09:00")]),
            row(&[("Full Name", "Dewi"), ("Check In", "08:30"), ("Schedule In", "08:00")]),
        ]);

        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].full_name, "Dewi");
        assert_eq!(report.summary.total_cases, 1);
    }

    #[test]
    fn test_unparseable_check_in_is_skipped() {
        let report = process(&[row(&[
            ("Full Name", "Eko"),
            ("Check In", "sakit"),
            ("Schedule In", "08:00"),
        ])]);

        assert!(report.records.is_empty());
        assert_eq!(report.summary.total_cases, 0);
    }

    #[test]
    fn test_on_time_rows_emit_nothing() {
        let report = process(&[row(&[
            ("Full Name", "Fajar"),
            ("Check In", "07:55"),
            ("Schedule In", "08:00"),
        ])]);

        assert!(report.records.is_empty());
    }

    #[test]
    fn test_adjusted_to_zero_lateness_is_still_emitted() {
        // Check-in lands exactly on a known shift start
        let report = process(&[row(&[
            ("Full Name", "Gita"),
            ("Check In", "13:45"),
            ("Schedule In", "OFF"),
        ])]);

        assert_eq!(report.records.len(), 1);
        let r = &report.records[0];
        assert_eq!(r.late_minutes, 0);
        assert!(r.is_shift_adjusted);
        assert_eq!(report.summary.total_cases, 0);
    }

    #[test]
    fn test_midnight_schedule_is_day_off_sentinel() {
        let mut r = row(&[("Full Name", "Hadi"), ("Check In", "07:05")]);
        r.insert("Schedule In".to_string(), CellValue::Number(0.0));
        let report = process(&[r]);

        let rec = &report.records[0];
        assert_eq!(rec.original_schedule, "OFF");
        assert!(rec.is_shift_adjusted);
        assert_eq!(rec.schedule_in, "07:00");
        assert_eq!(rec.late_minutes, 5);
    }

    #[test]
    fn test_blank_schedule_cell_is_day_off() {
        let mut r = row(&[("Full Name", "Hadi"), ("Check In", "09:10")]);
        r.insert("Schedule In".to_string(), CellValue::Empty);
        let report = process(&[r]);

        assert_eq!(report.records[0].original_schedule, "OFF");
    }

    #[test]
    fn test_missing_schedule_column_defaults_to_eight() {
        let report = process(&[row(&[("Full Name", "Indra"), ("Check In", "08:20")])]);

        let r = &report.records[0];
        assert_eq!(r.schedule_in, "08:00");
        assert!(!r.is_shift_adjusted);
        assert_eq!(r.late_minutes, 20);
    }

    #[test]
    fn test_garbled_schedule_falls_back_to_default_start() {
        let report = process(&[row(&[
            ("Full Name", "Joko"),
            ("Check In", "08:40"),
            ("Schedule In", "libur ganti"),
        ])]);

        // "libur ganti" is neither blank nor off nor a time
        let r = &report.records[0];
        assert_eq!(r.schedule_in, "08:00");
        assert!(!r.is_shift_adjusted);
        assert_eq!(r.late_minutes, 40);
    }

    #[test]
    fn test_total_late_count_backfilled_across_batch() {
        let report = process(&[
            row(&[("Full Name", "Kia"), ("Date", "1/2/2025"), ("Check In", "08:10"), ("Schedule In", "08:00")]),
            row(&[("Full Name", "Kia"), ("Date", "2/2/2025"), ("Check In", "08:20"), ("Schedule In", "08:00")]),
            row(&[("Full Name", "Lia"), ("Date", "1/2/2025"), ("Check In", "08:05"), ("Schedule In", "08:00")]),
        ]);

        for r in &report.records {
            match r.full_name.as_str() {
                "Kia" => assert_eq!(r.total_late_count, 2),
                "Lia" => assert_eq!(r.total_late_count, 1),
                other => panic!("unexpected employee {}", other),
            }
        }
    }

    #[test]
    fn test_empty_input_is_fatal() {
        let err = process_rows(&[], &ShiftConfig::default()).unwrap_err();
        assert_eq!(err, EngineError::EmptyInput);
        assert_eq!(err.to_string(), "file empty or unreadable");
    }

    #[test]
    fn test_missing_required_column_is_fatal() {
        let rows = vec![row(&[("Date", "1/2/2025"), ("Check In", "08:10")])];
        let err = process_rows(&rows, &ShiftConfig::default()).unwrap_err();
        assert_eq!(err, EngineError::MissingRequiredColumn);
        assert_eq!(err.to_string(), "required column not found");
    }

    #[test]
    fn test_custom_threshold_controls_reattribution() {
        let config = ShiftConfig {
            threshold: 10,
            ..ShiftConfig::default()
        };
        // 20 minutes late: beyond threshold, but the nearest shift is the
        // declared 07:45 itself at the same distance, so no switch happens
        let rows = vec![row(&[
            ("Full Name", "Mira"),
            ("Check In", "08:05"),
            ("Schedule In", "07:45"),
        ])];
        let report = process_rows(&rows, &config).unwrap();

        let r = &report.records[0];
        assert!(!r.is_shift_adjusted);
        assert_eq!(r.schedule_in, "07:45");
        assert_eq!(r.late_minutes, 20);
    }
}
