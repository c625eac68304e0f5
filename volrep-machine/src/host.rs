//! Host interface for persisted replication machines.
//!
//! The driver is polymorphic over this capability set and assumes no other
//! surface. Concrete implementations wrap whatever object store holds the
//! replication resource; an in-memory fake
//! ([`InMemoryMachine`](crate::InMemoryMachine)) suffices for testing.
//!
//! The host owns persistence and any concurrency control across controller
//! replicas. The driver assumes it is the only writer for a given machine
//! during a tick.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use volrep_types::{ConditionSet, MachineError, MoverStatus, TriggerSpec};

/// Capability set the state-machine driver needs from a replication
/// machine.
///
/// `synchronize` and `cleanup` are the mover hooks. Both are idempotent:
/// once a hook reports [`MoverStatus::Complete`], calling it again must
/// remain complete or safely redo nothing. The hooks may perform blocking
/// I/O but are expected to return promptly with a status rather than wait
/// for the mover to finish.
#[async_trait]
pub trait ReplicationMachine: Send + Sync {
    /// Machine name, used for log and metric labels.
    fn name(&self) -> &str;

    /// The user-declared trigger policy.
    fn trigger(&self) -> TriggerSpec;

    /// Last manual token acted upon, if any.
    fn last_manual_sync(&self) -> Option<String>;

    /// Record the manual token the just-completed cycle acted upon.
    fn set_last_manual_sync(&mut self, token: Option<String>);

    /// When the in-flight cycle started; `None` when no cycle is in flight.
    fn last_sync_start_time(&self) -> Option<DateTime<Utc>>;

    /// Set or clear the in-flight cycle start time.
    fn set_last_sync_start_time(&mut self, t: Option<DateTime<Utc>>);

    /// End of the last successful synchronization.
    fn last_sync_time(&self) -> Option<DateTime<Utc>>;

    /// Record the end of a successful synchronization.
    fn set_last_sync_time(&mut self, t: Option<DateTime<Utc>>);

    /// Scheduled target of the current or next cycle.
    fn next_sync_time(&self) -> Option<DateTime<Utc>>;

    /// Record the scheduled target of the next cycle.
    fn set_next_sync_time(&mut self, t: Option<DateTime<Utc>>);

    /// Whether the machine is actively syncing or behind schedule.
    fn out_of_sync(&self) -> bool;

    /// Update the out-of-sync flag.
    fn set_out_of_sync(&mut self, out_of_sync: bool);

    /// Status conditions.
    fn conditions(&self) -> &ConditionSet;

    /// Mutable access to status conditions.
    fn conditions_mut(&mut self) -> &mut ConditionSet;

    /// Drive the data phase of a cycle.
    async fn synchronize(&mut self) -> Result<MoverStatus, MachineError>;

    /// Release transient resources after the data phase.
    async fn cleanup(&mut self) -> Result<MoverStatus, MachineError>;

    /// Invoked when cleanup reports complete. Like the mover hooks it must
    /// tolerate being called again on later ticks.
    async fn finalize(&mut self) -> Result<(), MachineError> {
        Ok(())
    }

    /// Commit the tick's mutations. Called once per tick after conditions,
    /// times and the out-of-sync flag are settled; failures surface
    /// verbatim and the next tick re-derives intent from whatever was
    /// committed.
    async fn persist(&mut self) -> Result<(), MachineError> {
        Ok(())
    }
}
