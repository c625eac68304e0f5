//! Status conditions for replication machines.
//!
//! Conditions are (type, status, reason, message, last-transition-time)
//! records. A [`ConditionSet`] holds at most one condition per type;
//! `last_transition_time` only moves when the status flips, so observers can
//! tell how long the machine has been in its current phase.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Type name of the condition that carries the machine's sync state.
///
/// Part of the user-visible API of the host system; do not rename.
pub const CONDITION_SYNCHRONIZING: &str = "Synchronizing";

/// Truth value of a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionStatus {
    /// The condition holds.
    True,
    /// The condition does not hold.
    False,
}

/// Closed set of reasons for the `Synchronizing` condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncReason {
    /// A mover cycle is in flight.
    Syncing,
    /// The mover is releasing transient resources.
    CleaningUp,
    /// Waiting for the user to bump the manual trigger token.
    Manual,
    /// Waiting for the next scheduled firing.
    Scheduled,
    /// A mover hook or the trigger policy failed.
    Error,
}

impl SyncReason {
    /// Stable string form used in persisted conditions.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Syncing => "Syncing",
            Self::CleaningUp => "CleaningUp",
            Self::Manual => "Manual",
            Self::Scheduled => "Scheduled",
            Self::Error => "Error",
        }
    }
}

impl fmt::Display for SyncReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single status condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    /// Condition type, e.g. [`CONDITION_SYNCHRONIZING`].
    #[serde(rename = "type")]
    pub condition_type: String,
    /// Current truth value.
    pub status: ConditionStatus,
    /// Machine-readable reason for the status.
    pub reason: String,
    /// Human-readable detail; may change without a status transition.
    pub message: String,
    /// When `status` last changed.
    pub last_transition_time: DateTime<Utc>,
}

impl Condition {
    /// Create a condition with `last_transition_time` set to `now`.
    pub fn new(
        condition_type: impl Into<String>,
        status: ConditionStatus,
        reason: impl Into<String>,
        message: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            condition_type: condition_type.into(),
            status,
            reason: reason.into(),
            message: message.into(),
            last_transition_time: now,
        }
    }
}

/// A set of conditions, at most one per type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConditionSet(Vec<Condition>);

impl ConditionSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the condition of the same type.
    ///
    /// When a condition of that type already exists and its status is
    /// unchanged, the existing `last_transition_time` is preserved; reason
    /// and message are always updated.
    pub fn set(&mut self, condition: Condition) {
        match self
            .0
            .iter_mut()
            .find(|c| c.condition_type == condition.condition_type)
        {
            Some(existing) => {
                let transition_time = if existing.status == condition.status {
                    existing.last_transition_time
                } else {
                    condition.last_transition_time
                };
                *existing = Condition {
                    last_transition_time: transition_time,
                    ..condition
                };
            }
            None => self.0.push(condition),
        }
    }

    /// Look up a condition by type.
    pub fn get(&self, condition_type: &str) -> Option<&Condition> {
        self.0.iter().find(|c| c.condition_type == condition_type)
    }

    /// True if the condition exists and its status is `True`.
    pub fn is_true(&self, condition_type: &str) -> bool {
        matches!(
            self.get(condition_type),
            Some(c) if c.status == ConditionStatus::True
        )
    }

    /// True if the condition exists and its status is `False`.
    pub fn is_false(&self, condition_type: &str) -> bool {
        matches!(
            self.get(condition_type),
            Some(c) if c.status == ConditionStatus::False
        )
    }

    /// Iterate over all conditions.
    pub fn iter(&self) -> impl Iterator<Item = &Condition> {
        self.0.iter()
    }

    /// True if no conditions have been recorded.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
