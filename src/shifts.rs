//! Shift configuration and nearest-shift matching.
//!
//! [`ShiftConfig`] carries the known shift-start list, the lateness
//! threshold, and the re-attribution exemption rules. [`nearest_shift`]
//! is the matching primitive behind shift re-attribution.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::timeparse::time_to_minutes;

/// Built-in shift-start times used when no custom list is configured.
/// List order matters: the earlier entry wins on equal distance.
pub const DEFAULT_SHIFTS: [&str; 15] = [
    "06:00", "06:30", "06:45", "07:00", "07:45", "09:00", "10:00", "11:00", "12:00", "13:00",
    "13:15", "13:45", "14:30", "14:45", "15:00",
];

/// Minutes of lateness tolerated before re-attribution is attempted.
pub const DEFAULT_THRESHOLD_MINUTES: i64 = 130;

/// One organization/shift-code pair excluded from re-attribution.
///
/// Covers shift patterns that legitimately start far from any entry in the
/// known list, like an overnight shift checked in the previous afternoon.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExemptRule {
    pub organization: String,
    pub shift_code: String,
}

/// Run configuration: known shifts, threshold, and exemptions.
///
/// Stored as a plain JSON object on disk:
/// ```json
/// {
///   "shifts": ["06:00", "07:45", "13:45"],
///   "threshold": 130,
///   "exemptions": [{ "organization": "OPERASIONAL", "shiftCode": "N" }]
/// }
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ShiftConfig {
    pub shifts: Vec<String>,
    pub threshold: i64,
    pub exemptions: Vec<ExemptRule>,
}

impl Default for ShiftConfig {
    fn default() -> Self {
        ShiftConfig {
            shifts: DEFAULT_SHIFTS.iter().map(|s| s.to_string()).collect(),
            threshold: DEFAULT_THRESHOLD_MINUTES,
            exemptions: vec![ExemptRule {
                organization: "OPERASIONAL".to_string(),
                shift_code: "N".to_string(),
            }],
        }
    }
}

impl ShiftConfig {
    /// Loads the config from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// The known shift list, falling back to the built-in defaults when the
    /// configured list is empty.
    pub fn known_shifts(&self) -> Vec<String> {
        if self.shifts.is_empty() {
            DEFAULT_SHIFTS.iter().map(|s| s.to_string()).collect()
        } else {
            self.shifts.clone()
        }
    }

    /// True when the organization/shift-code pair matches an exemption rule.
    /// Both sides compare trimmed and exact.
    pub fn is_exempt(&self, organization: &str, shift_code: &str) -> bool {
        self.exemptions.iter().any(|rule| {
            rule.organization.trim() == organization.trim()
                && rule.shift_code.trim() == shift_code.trim()
        })
    }
}

/// Finds the known shift whose start is nearest to `check_in_min` by
/// absolute minute distance. The first entry encountered wins on equal
/// distance, so list order is part of the contract.
///
/// Returns the shift label and its minute value, or `None` for an empty list.
pub fn nearest_shift(check_in_min: i64, shifts: &[String]) -> Option<(&str, i64)> {
    let mut best: Option<(&str, i64, i64)> = None;
    for shift in shifts {
        let minutes = time_to_minutes(shift);
        let distance = (check_in_min - minutes).abs();
        if best.is_none_or(|(_, _, d)| distance < d) {
            best = Some((shift.as_str(), minutes, distance));
        }
    }
    best.map(|(label, minutes, _)| (label, minutes))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shifts(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_default_config() {
        let config = ShiftConfig::default();
        assert_eq!(config.shifts.len(), 15);
        assert_eq!(config.threshold, 130);
        assert_eq!(config.exemptions.len(), 1);
    }

    #[test]
    fn test_empty_list_falls_back_to_defaults() {
        let config = ShiftConfig {
            shifts: Vec::new(),
            ..ShiftConfig::default()
        };
        assert_eq!(config.known_shifts().len(), DEFAULT_SHIFTS.len());
    }

    #[test]
    fn test_exact_start_matches_with_distance_zero() {
        let list = ShiftConfig::default().known_shifts();
        for shift in &list {
            let (label, minutes) = nearest_shift(time_to_minutes(shift), &list).unwrap();
            assert_eq!(label, shift);
            assert_eq!(minutes, time_to_minutes(shift));
        }
    }

    #[test]
    fn test_tie_broken_by_list_order() {
        // 08:30 is 30 minutes from both; the first entry wins
        let list = shifts(&["08:00", "09:00"]);
        let (label, _) = nearest_shift(time_to_minutes("08:30"), &list).unwrap();
        assert_eq!(label, "08:00");

        let reversed = shifts(&["09:00", "08:00"]);
        let (label, _) = nearest_shift(time_to_minutes("08:30"), &reversed).unwrap();
        assert_eq!(label, "09:00");
    }

    #[test]
    fn test_nearest_of_default_list() {
        let list = ShiftConfig::default().known_shifts();
        let (label, minutes) = nearest_shift(time_to_minutes("13:50"), &list).unwrap();
        assert_eq!(label, "13:45");
        assert_eq!(minutes, 825);
    }

    #[test]
    fn test_empty_list_returns_none() {
        assert_eq!(nearest_shift(480, &[]), None);
    }

    #[test]
    fn test_default_exemption() {
        let config = ShiftConfig::default();
        assert!(config.is_exempt("OPERASIONAL", "N"));
        assert!(config.is_exempt(" OPERASIONAL ", "N "));
        assert!(!config.is_exempt("OPERASIONAL", "P"));
        assert!(!config.is_exempt("FINANCE", "N"));
    }

    #[test]
    fn test_config_from_json() {
        let json = r#"{ "shifts": ["05:00"], "threshold": 60 }"#;
        let config: ShiftConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.shifts, vec!["05:00".to_string()]);
        assert_eq!(config.threshold, 60);
        // omitted fields keep their defaults
        assert_eq!(config.exemptions.len(), 1);
    }
}
