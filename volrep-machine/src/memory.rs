//! In-memory replication machine for tests and embedding experiments.
//!
//! Mover results are sticky: each hook returns its configured result on
//! every call until it is changed, matching a level-triggered mover that
//! reports the same status until it makes progress. Call counters and a
//! persisted-state snapshot support verification.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use volrep_types::{ConditionSet, MachineError, MoverStatus, TriggerSpec};

use crate::host::ReplicationMachine;

/// In-memory [`ReplicationMachine`] implementation.
#[derive(Debug, Clone)]
pub struct InMemoryMachine {
    name: String,
    trigger: TriggerSpec,
    last_manual_sync: Option<String>,
    last_sync_start_time: Option<DateTime<Utc>>,
    last_sync_time: Option<DateTime<Utc>>,
    next_sync_time: Option<DateTime<Utc>>,
    out_of_sync: bool,
    conditions: ConditionSet,
    sync_result: Result<MoverStatus, String>,
    cleanup_result: Result<MoverStatus, String>,
    fail_next_persist: Option<String>,
    sync_calls: u32,
    cleanup_calls: u32,
    finalize_calls: u32,
    persist_calls: u32,
}

/// Snapshot of the fields a real host would persist.
///
/// Two ticks that warranted no transition leave the snapshot unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedState {
    /// Last manual token acted upon.
    pub last_manual_sync: Option<String>,
    /// Start of the in-flight cycle.
    pub last_sync_start_time: Option<DateTime<Utc>>,
    /// End of the last successful synchronization.
    pub last_sync_time: Option<DateTime<Utc>>,
    /// Scheduled target of the next cycle.
    pub next_sync_time: Option<DateTime<Utc>>,
    /// Out-of-sync flag.
    pub out_of_sync: bool,
    /// Status conditions.
    pub conditions: ConditionSet,
}

impl InMemoryMachine {
    /// Create a machine with both mover hooks reporting
    /// [`MoverStatus::InProgress`].
    pub fn new(name: &str, trigger: TriggerSpec) -> Self {
        Self {
            name: name.to_string(),
            trigger,
            last_manual_sync: None,
            last_sync_start_time: None,
            last_sync_time: None,
            next_sync_time: None,
            out_of_sync: false,
            conditions: ConditionSet::new(),
            sync_result: Ok(MoverStatus::InProgress),
            cleanup_result: Ok(MoverStatus::InProgress),
            fail_next_persist: None,
            sync_calls: 0,
            cleanup_calls: 0,
            finalize_calls: 0,
            persist_calls: 0,
        }
    }

    /// Replace the trigger policy (e.g. bump a manual token).
    pub fn set_trigger(&mut self, trigger: TriggerSpec) {
        self.trigger = trigger;
    }

    /// Make `synchronize` report the given status from now on.
    pub fn set_sync_result(&mut self, status: MoverStatus) {
        self.sync_result = Ok(status);
    }

    /// Make `synchronize` fail with the given message from now on.
    pub fn fail_sync(&mut self, message: &str) {
        self.sync_result = Err(message.to_string());
    }

    /// Make `cleanup` report the given status from now on.
    pub fn set_cleanup_result(&mut self, status: MoverStatus) {
        self.cleanup_result = Ok(status);
    }

    /// Make `cleanup` fail with the given message from now on.
    pub fn fail_cleanup(&mut self, message: &str) {
        self.cleanup_result = Err(message.to_string());
    }

    /// Make the next `persist` call fail with the given message.
    pub fn fail_next_persist(&mut self, message: &str) {
        self.fail_next_persist = Some(message.to_string());
    }

    /// Number of `synchronize` invocations.
    pub fn sync_calls(&self) -> u32 {
        self.sync_calls
    }

    /// Number of `cleanup` invocations.
    pub fn cleanup_calls(&self) -> u32 {
        self.cleanup_calls
    }

    /// Number of `finalize` invocations.
    pub fn finalize_calls(&self) -> u32 {
        self.finalize_calls
    }

    /// Number of successful `persist` invocations.
    pub fn persist_calls(&self) -> u32 {
        self.persist_calls
    }

    /// Snapshot of the fields a real host would persist.
    pub fn snapshot(&self) -> PersistedState {
        PersistedState {
            last_manual_sync: self.last_manual_sync.clone(),
            last_sync_start_time: self.last_sync_start_time,
            last_sync_time: self.last_sync_time,
            next_sync_time: self.next_sync_time,
            out_of_sync: self.out_of_sync,
            conditions: self.conditions.clone(),
        }
    }
}

#[async_trait]
impl ReplicationMachine for InMemoryMachine {
    fn name(&self) -> &str {
        &self.name
    }

    fn trigger(&self) -> TriggerSpec {
        self.trigger.clone()
    }

    fn last_manual_sync(&self) -> Option<String> {
        self.last_manual_sync.clone()
    }

    fn set_last_manual_sync(&mut self, token: Option<String>) {
        self.last_manual_sync = token;
    }

    fn last_sync_start_time(&self) -> Option<DateTime<Utc>> {
        self.last_sync_start_time
    }

    fn set_last_sync_start_time(&mut self, t: Option<DateTime<Utc>>) {
        self.last_sync_start_time = t;
    }

    fn last_sync_time(&self) -> Option<DateTime<Utc>> {
        self.last_sync_time
    }

    fn set_last_sync_time(&mut self, t: Option<DateTime<Utc>>) {
        self.last_sync_time = t;
    }

    fn next_sync_time(&self) -> Option<DateTime<Utc>> {
        self.next_sync_time
    }

    fn set_next_sync_time(&mut self, t: Option<DateTime<Utc>>) {
        self.next_sync_time = t;
    }

    fn out_of_sync(&self) -> bool {
        self.out_of_sync
    }

    fn set_out_of_sync(&mut self, out_of_sync: bool) {
        self.out_of_sync = out_of_sync;
    }

    fn conditions(&self) -> &ConditionSet {
        &self.conditions
    }

    fn conditions_mut(&mut self) -> &mut ConditionSet {
        &mut self.conditions
    }

    async fn synchronize(&mut self) -> Result<MoverStatus, MachineError> {
        self.sync_calls += 1;
        self.sync_result.clone().map_err(MachineError::Mover)
    }

    async fn cleanup(&mut self) -> Result<MoverStatus, MachineError> {
        self.cleanup_calls += 1;
        self.cleanup_result.clone().map_err(MachineError::Mover)
    }

    async fn finalize(&mut self) -> Result<(), MachineError> {
        self.finalize_calls += 1;
        Ok(())
    }

    async fn persist(&mut self) -> Result<(), MachineError> {
        if let Some(message) = self.fail_next_persist.take() {
            return Err(MachineError::Persistence(message));
        }
        self.persist_calls += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sticky_sync_result() {
        let mut machine = InMemoryMachine::new("m", TriggerSpec::Continuous);

        assert_eq!(machine.synchronize().await.unwrap(), MoverStatus::InProgress);
        assert_eq!(machine.synchronize().await.unwrap(), MoverStatus::InProgress);

        machine.set_sync_result(MoverStatus::Complete);
        assert_eq!(machine.synchronize().await.unwrap(), MoverStatus::Complete);
        assert_eq!(machine.synchronize().await.unwrap(), MoverStatus::Complete);
        assert_eq!(machine.sync_calls(), 4);
    }

    #[tokio::test]
    async fn forced_mover_failure() {
        let mut machine = InMemoryMachine::new("m", TriggerSpec::Continuous);
        machine.fail_sync("volume unreachable");

        let err = machine.synchronize().await.unwrap_err();
        assert!(matches!(err, MachineError::Mover(_)));
        assert_eq!(err.to_string(), "mover error: volume unreachable");

        // Sticky until changed.
        assert!(machine.synchronize().await.is_err());
        machine.set_sync_result(MoverStatus::InProgress);
        assert!(machine.synchronize().await.is_ok());
    }

    #[tokio::test]
    async fn forced_persist_failure_is_one_shot() {
        let mut machine = InMemoryMachine::new("m", TriggerSpec::Continuous);
        machine.fail_next_persist("conflict");

        assert!(matches!(
            machine.persist().await,
            Err(MachineError::Persistence(_))
        ));
        assert!(machine.persist().await.is_ok());
        assert_eq!(machine.persist_calls(), 1);
    }

    #[test]
    fn snapshot_tracks_persisted_fields_only() {
        let mut machine = InMemoryMachine::new("m", TriggerSpec::Continuous);
        let before = machine.snapshot();

        machine.set_out_of_sync(true);
        assert_ne!(machine.snapshot(), before);

        machine.set_out_of_sync(false);
        assert_eq!(machine.snapshot(), before);
    }

    #[test]
    fn setters_roundtrip() {
        let mut machine = InMemoryMachine::new("m", TriggerSpec::Continuous);
        let now = Utc::now();

        machine.set_last_manual_sync(Some("3".into()));
        machine.set_last_sync_start_time(Some(now));
        machine.set_last_sync_time(Some(now));
        machine.set_next_sync_time(Some(now));

        assert_eq!(machine.last_manual_sync().as_deref(), Some("3"));
        assert_eq!(machine.last_sync_start_time(), Some(now));
        assert_eq!(machine.last_sync_time(), Some(now));
        assert_eq!(machine.next_sync_time(), Some(now));
    }
}
