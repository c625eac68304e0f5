//! Condition reporting.
//!
//! A single condition type, [`CONDITION_SYNCHRONIZING`], carries the
//! machine's human-visible state. Messages are deterministic so a tick that
//! changes nothing rewrites the condition identically, and
//! `last_transition_time` only moves when the status flips.

use chrono::{DateTime, Utc};
use volrep_types::{
    Condition, ConditionStatus, MachineError, SyncReason, CONDITION_SYNCHRONIZING,
};

/// Condition published while a mover cycle is in flight.
pub fn syncing(now: DateTime<Utc>) -> Condition {
    Condition::new(
        CONDITION_SYNCHRONIZING,
        ConditionStatus::True,
        SyncReason::Syncing.as_str(),
        "synchronization in progress",
        now,
    )
}

/// Condition published while the mover releases transient resources.
pub fn cleaning_up(now: DateTime<Utc>) -> Condition {
    Condition::new(
        CONDITION_SYNCHRONIZING,
        ConditionStatus::False,
        SyncReason::CleaningUp.as_str(),
        "cleaning up after synchronization",
        now,
    )
}

/// Condition published while the trigger gate is closed.
pub fn waiting(reason: SyncReason, now: DateTime<Utc>) -> Condition {
    let message = match reason {
        SyncReason::Manual => "waiting for the manual trigger",
        SyncReason::Scheduled => "waiting for the next scheduled synchronization",
        _ => "waiting to synchronize",
    };
    Condition::new(
        CONDITION_SYNCHRONIZING,
        ConditionStatus::False,
        reason.as_str(),
        message,
        now,
    )
}

/// Condition published when a mover hook or the trigger policy fails.
pub fn error(err: &MachineError, now: DateTime<Utc>) -> Condition {
    Condition::new(
        CONDITION_SYNCHRONIZING,
        ConditionStatus::False,
        SyncReason::Error.as_str(),
        err.to_string(),
        now,
    )
}
