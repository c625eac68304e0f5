//! # volrep-types
//!
//! Data model for the volrep replication state machine.
//!
//! This crate provides the foundational types used across all volrep crates:
//! - [`TriggerSpec`] - when a new synchronization cycle may start
//! - [`MoverStatus`] - progress reported by the mover hooks
//! - [`Condition`], [`ConditionSet`] - user-visible status records
//! - [`MachineError`] - error taxonomy

#![warn(missing_docs)]
#![warn(clippy::all)]

mod condition;
mod error;
mod mover;
mod trigger;

pub use condition::{
    Condition, ConditionSet, ConditionStatus, SyncReason, CONDITION_SYNCHRONIZING,
};
pub use error::MachineError;
pub use mover::MoverStatus;
pub use trigger::TriggerSpec;
