//! Cron schedule handling.
//!
//! User-facing specs are standard five-field cron (minute, hour,
//! day-of-month, month, day-of-week, with `*`, `*/n` and ranges). The
//! underlying parser works at seconds resolution, so [`parse_schedule`]
//! prefixes a zero seconds field to five-field specs; expressions that
//! already carry a seconds field pass through untouched.

use chrono::{DateTime, Utc};
use cron::Schedule;
use std::str::FromStr;
use volrep_types::MachineError;

/// Parse a cron expression into a schedule.
pub fn parse_schedule(spec: &str) -> Result<Schedule, MachineError> {
    let normalized = normalize(spec);
    Schedule::from_str(&normalized).map_err(|source| MachineError::InvalidSchedule {
        spec: spec.to_string(),
        source,
    })
}

/// First firing of `schedule` strictly after `t`.
///
/// Returns `None` for schedules with no future firings.
pub fn next_firing(schedule: &Schedule, t: DateTime<Utc>) -> Option<DateTime<Utc>> {
    schedule.after(&t).next()
}

fn normalize(spec: &str) -> String {
    let trimmed = spec.trim();
    if trimmed.split_whitespace().count() == 5 {
        format!("0 {trimmed}")
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, h, m, s).unwrap()
    }

    #[test]
    fn five_field_spec_parses() {
        assert!(parse_schedule("* * * * *").is_ok());
        assert!(parse_schedule("*/10 * * * *").is_ok());
        assert!(parse_schedule("0 0 1 1 *").is_ok());
    }

    #[test]
    fn surrounding_whitespace_is_tolerated() {
        assert!(parse_schedule("  */5 * * * *  ").is_ok());
    }

    #[test]
    fn six_field_spec_passes_through() {
        let schedule = parse_schedule("30 */10 * * * *").unwrap();
        // The given seconds field is honored, not overwritten.
        let next = next_firing(&schedule, at(12, 0, 0)).unwrap();
        assert_eq!(next, at(12, 0, 30));
    }

    #[test]
    fn invalid_spec_reports_the_expression() {
        let err = parse_schedule("invalid").unwrap_err();
        match err {
            MachineError::InvalidSchedule { spec, .. } => assert_eq!(spec, "invalid"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn next_firing_is_strictly_after() {
        let schedule = parse_schedule("* * * * *").unwrap();
        // Exactly on a firing instant: the next one is a full minute later.
        let next = next_firing(&schedule, at(12, 0, 0)).unwrap();
        assert_eq!(next, at(12, 1, 0));
    }

    #[test]
    fn next_firing_rounds_up_mid_period() {
        let schedule = parse_schedule("*/10 * * * *").unwrap();
        let next = next_firing(&schedule, at(12, 3, 30)).unwrap();
        assert_eq!(next, at(12, 10, 0));
    }

    #[test]
    fn yearly_schedule_fires_on_january_first() {
        let schedule = parse_schedule("0 0 1 1 *").unwrap();
        let next = next_firing(&schedule, at(12, 0, 0)).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
    }
}
