//! Trigger policy: decides when a new synchronization cycle may start.
//!
//! All gating logic is centralized here so the driver never inspects
//! trigger fields directly.

use chrono::{DateTime, Utc};
use volrep_types::{MachineError, SyncReason, TriggerSpec};

use crate::schedule::{next_firing, parse_schedule};

/// Whether a new synchronization cycle is permitted now.
///
/// - `Continuous`: always.
/// - `Manual`: when the declared token is non-empty and differs from the
///   last token acted upon.
/// - `Schedule`: when the first firing after the last completed sync (or
///   after `now` if none has completed) has been reached.
pub fn should_start_cycle(
    trigger: &TriggerSpec,
    last_manual_observed: Option<&str>,
    last_sync: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Result<bool, MachineError> {
    match trigger {
        TriggerSpec::Continuous => Ok(true),
        TriggerSpec::Manual { token } => {
            Ok(!token.is_empty() && last_manual_observed != Some(token.as_str()))
        }
        TriggerSpec::Schedule { cron } => {
            let schedule = parse_schedule(cron)?;
            let prev = last_sync.unwrap_or(now);
            Ok(next_firing(&schedule, prev).is_some_and(|next| now >= next))
        }
    }
}

/// Next scheduled firing after the last completed sync (or after `now` if
/// none has completed). `None` for non-schedule triggers.
pub fn next_deadline(
    trigger: &TriggerSpec,
    last_sync: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Result<Option<DateTime<Utc>>, MachineError> {
    match trigger {
        TriggerSpec::Schedule { cron } => {
            let schedule = parse_schedule(cron)?;
            Ok(next_firing(&schedule, last_sync.unwrap_or(now)))
        }
        _ => Ok(None),
    }
}

/// Why a machine whose cycle has finished is not synchronizing.
///
/// A continuous machine restarts as soon as cleanup finishes, so the only
/// thing it ever waits on is the cleanup itself.
pub fn waiting_reason(trigger: &TriggerSpec) -> SyncReason {
    match trigger {
        TriggerSpec::Manual { .. } => SyncReason::Manual,
        TriggerSpec::Schedule { .. } => SyncReason::Scheduled,
        TriggerSpec::Continuous => SyncReason::CleaningUp,
    }
}

/// Admission-time validation of a trigger spec.
///
/// The driver itself treats an empty manual token as "gate closed"; this
/// lets embedders reject such specs before they are persisted.
pub fn validate_trigger(trigger: &TriggerSpec) -> Result<(), MachineError> {
    match trigger {
        TriggerSpec::Continuous => Ok(()),
        TriggerSpec::Manual { token } => {
            if token.is_empty() {
                Err(MachineError::MissingManualToken)
            } else {
                Ok(())
            }
        }
        TriggerSpec::Schedule { cron } => parse_schedule(cron).map(|_| ()),
    }
}
