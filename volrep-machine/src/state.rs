//! Logical machine state, reconstructed from persisted fields.
//!
//! The state is not persisted as an enum; it is derived:
//!
//! - no `Synchronizing` condition at all ⇒ [`MachineState::Initial`]
//! - condition present, start time set ⇒ [`MachineState::Synchronizing`]
//! - condition present, start time unset ⇒ [`MachineState::CleaningUp`]
//!
//! The driver clears the start time on the `Synchronizing → CleaningUp`
//! transition, which keeps the derivation unambiguous even when an error
//! condition (`False/Error`) is the last thing that was published before a
//! restart.

use std::fmt;

use volrep_types::CONDITION_SYNCHRONIZING;

use crate::host::ReplicationMachine;

/// The three logical states of a replication machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MachineState {
    /// No cycle has ever been attempted.
    Initial,
    /// A mover cycle is in flight.
    Synchronizing,
    /// The data phase is done; transient resources are being released, or
    /// the machine is waiting for its trigger gate to open.
    CleaningUp,
}

impl fmt::Display for MachineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Initial => "initial",
            Self::Synchronizing => "synchronizing",
            Self::CleaningUp => "cleaning-up",
        };
        f.write_str(name)
    }
}

/// Reconstruct the logical state from persisted fields alone.
pub fn current_state<M>(machine: &M) -> MachineState
where
    M: ReplicationMachine + ?Sized,
{
    if machine.conditions().get(CONDITION_SYNCHRONIZING).is_none() {
        return MachineState::Initial;
    }
    if machine.last_sync_start_time().is_some() {
        MachineState::Synchronizing
    } else {
        MachineState::CleaningUp
    }
}
