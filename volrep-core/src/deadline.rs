//! Missed-deadline detection for scheduled machines.
//!
//! A deadline counts as missed once the next-after-next firing has passed:
//! one full period is normal latency, the second overrun means replication
//! has fallen behind. The driver turns a missed deadline into an
//! out-of-sync flag update and a metric signal.

use chrono::{DateTime, Utc};
use volrep_types::{MachineError, TriggerSpec};

use crate::schedule::{next_firing, parse_schedule};

/// Whether the machine has missed its synchronization deadline.
///
/// Machines without a schedule cannot miss a deadline, and neither can a
/// scheduled machine that has never completed a sync (no baseline yet).
pub fn missed_deadline(
    trigger: &TriggerSpec,
    last_sync: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Result<bool, MachineError> {
    let TriggerSpec::Schedule { cron } = trigger else {
        return Ok(false);
    };
    let Some(last) = last_sync else {
        return Ok(false);
    };
    let schedule = parse_schedule(cron)?;
    let Some(first) = next_firing(&schedule, last) else {
        return Ok(false);
    };
    let Some(second) = next_firing(&schedule, first) else {
        return Ok(false);
    };
    Ok(now > second)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 31, 0).unwrap()
    }

    fn every_ten_minutes() -> TriggerSpec {
        TriggerSpec::Schedule {
            cron: "*/10 * * * *".into(),
        }
    }

    #[test]
    fn unscheduled_triggers_never_miss() {
        assert!(!missed_deadline(&TriggerSpec::Continuous, Some(now()), now()).unwrap());
        let manual = TriggerSpec::Manual { token: "1".into() };
        assert!(!missed_deadline(&manual, Some(now() - Duration::days(30)), now()).unwrap());
    }

    #[test]
    fn no_baseline_means_no_missed_deadline() {
        assert!(!missed_deadline(&every_ten_minutes(), None, now()).unwrap());
    }

    #[test]
    fn within_two_periods_is_on_time() {
        let last = now() - Duration::minutes(9);
        assert!(!missed_deadline(&every_ten_minutes(), Some(last), now()).unwrap());
    }

    #[test]
    fn beyond_two_periods_is_missed() {
        let last = now() - Duration::minutes(31);
        assert!(missed_deadline(&every_ten_minutes(), Some(last), now()).unwrap());
    }

    #[test]
    fn boundary_is_exclusive() {
        // Last sync at 12:00, firings at 12:10 and 12:20: exactly 12:20 is
        // still on time, one second later is not.
        let last = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let second = Utc.with_ymd_and_hms(2024, 6, 1, 12, 20, 0).unwrap();
        assert!(!missed_deadline(&every_ten_minutes(), Some(last), second).unwrap());
        let late = second + Duration::seconds(1);
        assert!(missed_deadline(&every_ten_minutes(), Some(last), late).unwrap());
    }

    #[test]
    fn invalid_cron_surfaces_the_error() {
        let trigger = TriggerSpec::Schedule {
            cron: "invalid".into(),
        };
        assert!(matches!(
            missed_deadline(&trigger, Some(now()), now()),
            Err(MachineError::InvalidSchedule { .. })
        ));
    }
}
