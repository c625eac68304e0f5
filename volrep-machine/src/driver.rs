//! Single-step state machine driver.
//!
//! [`Driver::run`] performs at most one logical transition per call and is
//! idempotent when no transition is warranted. Mover-reported errors and
//! cron parse errors are returned to the caller for backoff; the driver
//! never retries internally and only advises a requeue interval.
//!
//! Within one tick the sequence is: read state → execute at most one
//! transition (publishing conditions as it goes) → consult the deadline
//! monitor → compute the requeue interval → persist → write metrics.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use volrep_core::schedule::{next_firing, parse_schedule};
use volrep_core::{missed_deadline, next_deadline, report, should_start_cycle, waiting_reason};
use volrep_types::{
    MachineError, MoverStatus, SyncReason, TriggerSpec, CONDITION_SYNCHRONIZING,
};

use crate::config::DriverConfig;
use crate::host::ReplicationMachine;
use crate::metrics::SyncMetrics;
use crate::state::{current_state, MachineState};

/// Drives replication machines through synchronization cycles.
///
/// One driver serves any number of machines; machines share no mutable
/// state, so concurrent ticks for different machines need no coordination.
/// Ticks for the *same* machine must be serialized by the caller.
pub struct Driver {
    config: DriverConfig,
    metrics: Arc<SyncMetrics>,
}

impl Driver {
    /// Create a driver with the default configuration.
    pub fn new(metrics: Arc<SyncMetrics>) -> Self {
        Self::with_config(DriverConfig::default(), metrics)
    }

    /// Create a driver with an explicit configuration.
    pub fn with_config(config: DriverConfig, metrics: Arc<SyncMetrics>) -> Self {
        Self { config, metrics }
    }

    /// The driver's configuration.
    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// The shared metrics registry.
    pub fn metrics(&self) -> Arc<SyncMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Advance `machine` by at most one logical transition.
    ///
    /// Returns how long the caller should wait before the next tick, or an
    /// error to back off on. A cancelled `shutdown` token returns
    /// [`MachineError::Cancelled`] before anything is touched.
    pub async fn run<M>(
        &self,
        machine: &mut M,
        shutdown: &CancellationToken,
    ) -> Result<Option<Duration>, MachineError>
    where
        M: ReplicationMachine + ?Sized,
    {
        if shutdown.is_cancelled() {
            return Err(MachineError::Cancelled);
        }

        let state = current_state(machine);
        tracing::trace!(machine = machine.name(), state = %state, "reconcile tick");

        let step = match state {
            MachineState::Initial => self.begin_cycle(machine).await,
            MachineState::Synchronizing => self.synchronize_step(machine).await,
            MachineState::CleaningUp => self.cleanup_step(machine).await,
        };

        // A scheduled machine can fall behind even mid-cycle.
        let deadline = self.check_deadline(machine);

        let requeue = if step.is_ok() && deadline.is_ok() {
            self.compute_requeue(machine)
        } else {
            Ok(None)
        };

        let persist = machine.persist().await;

        let errored =
            step.is_err() || deadline.is_err() || requeue.is_err() || persist.is_err();
        self.metrics
            .observe_run(machine.name(), machine.out_of_sync(), errored);

        step?;
        deadline?;
        let requeue = requeue?;
        persist?;
        Ok(requeue)
    }

    /// Start a new cycle: mark out-of-sync, record the start time, and give
    /// the mover its first poke.
    ///
    /// A `Complete` on this first tick is not acted upon until the next
    /// tick (at most one transition per call); the hook is idempotent, so
    /// the signal is not lost.
    async fn begin_cycle<M>(&self, machine: &mut M) -> Result<(), MachineError>
    where
        M: ReplicationMachine + ?Sized,
    {
        let now = Utc::now();
        tracing::debug!(machine = machine.name(), "starting synchronization cycle");
        machine.set_out_of_sync(true);
        machine.set_last_sync_start_time(Some(now));
        match machine.synchronize().await {
            Ok(_) => {
                machine.conditions_mut().set(report::syncing(now));
                Ok(())
            }
            Err(err) => {
                tracing::warn!(machine = machine.name(), error = %err, "synchronize failed");
                machine.conditions_mut().set(report::error(&err, now));
                Err(err)
            }
        }
    }

    /// One tick in the `Synchronizing` state.
    async fn synchronize_step<M>(&self, machine: &mut M) -> Result<(), MachineError>
    where
        M: ReplicationMachine + ?Sized,
    {
        let now = Utc::now();
        match machine.synchronize().await {
            Ok(MoverStatus::InProgress) => {
                machine.conditions_mut().set(report::syncing(now));
                Ok(())
            }
            Ok(MoverStatus::Complete) => self.complete_cycle(machine).await,
            Err(err) => {
                tracing::warn!(machine = machine.name(), error = %err, "synchronize failed");
                machine.conditions_mut().set(report::error(&err, now));
                Err(err)
            }
        }
    }

    /// `Synchronizing → CleaningUp`: the only place the last-sync time
    /// advances and the out-of-sync flag clears.
    async fn complete_cycle<M>(&self, machine: &mut M) -> Result<(), MachineError>
    where
        M: ReplicationMachine + ?Sized,
    {
        let now = Utc::now();
        tracing::info!(machine = machine.name(), "synchronization complete");

        let completed = machine.last_sync_time().map_or(now, |prev| prev.max(now));
        machine.set_last_sync_time(Some(completed));
        machine.set_last_sync_start_time(None);
        machine.set_out_of_sync(false);

        let trigger = machine.trigger();
        if let TriggerSpec::Manual { token } = &trigger {
            machine.set_last_manual_sync(Some(token.clone()));
        }

        match next_deadline(&trigger, machine.last_sync_time(), now) {
            Ok(next) => {
                machine.set_next_sync_time(next);
                machine.conditions_mut().set(report::cleaning_up(now));
                Ok(())
            }
            Err(err) => {
                machine.conditions_mut().set(report::error(&err, now));
                Err(err)
            }
        }
    }

    /// One tick in the `CleaningUp` state.
    async fn cleanup_step<M>(&self, machine: &mut M) -> Result<(), MachineError>
    where
        M: ReplicationMachine + ?Sized,
    {
        let now = Utc::now();
        match machine.cleanup().await {
            Ok(MoverStatus::InProgress) => {
                machine.conditions_mut().set(report::cleaning_up(now));
                Ok(())
            }
            Ok(MoverStatus::Complete) => {
                if let Err(err) = machine.finalize().await {
                    tracing::warn!(machine = machine.name(), error = %err, "finalize failed");
                    machine.conditions_mut().set(report::error(&err, now));
                    return Err(err);
                }

                let trigger = machine.trigger();
                let gate = should_start_cycle(
                    &trigger,
                    machine.last_manual_sync().as_deref(),
                    machine.last_sync_time(),
                    now,
                );
                match gate {
                    Ok(true) => self.begin_cycle(machine).await,
                    Ok(false) => {
                        machine
                            .conditions_mut()
                            .set(report::waiting(waiting_reason(&trigger), now));
                        Ok(())
                    }
                    Err(err) => {
                        machine.conditions_mut().set(report::error(&err, now));
                        Err(err)
                    }
                }
            }
            Err(err) => {
                tracing::warn!(machine = machine.name(), error = %err, "cleanup failed");
                machine.conditions_mut().set(report::error(&err, now));
                Err(err)
            }
        }
    }

    /// Update the out-of-sync flag from the deadline monitor.
    fn check_deadline<M>(&self, machine: &mut M) -> Result<(), MachineError>
    where
        M: ReplicationMachine + ?Sized,
    {
        let now = Utc::now();
        match missed_deadline(&machine.trigger(), machine.last_sync_time(), now) {
            Ok(true) => {
                if !machine.out_of_sync() {
                    tracing::warn!(machine = machine.name(), "missed synchronization deadline");
                }
                machine.set_out_of_sync(true);
                Ok(())
            }
            Ok(false) => Ok(()),
            Err(err) => {
                machine.conditions_mut().set(report::error(&err, now));
                Err(err)
            }
        }
    }

    /// How long the caller should wait before the next tick: the shortest
    /// of the time until the next scheduled firing and the poll interval.
    ///
    /// A machine waiting on its schedule only needs to wake for the next
    /// firing; everything else (running, waiting on a manual trigger) is
    /// polled.
    fn compute_requeue<M>(&self, machine: &mut M) -> Result<Option<Duration>, MachineError>
    where
        M: ReplicationMachine + ?Sized,
    {
        let now = Utc::now();
        let reason = machine
            .conditions()
            .get(CONDITION_SYNCHRONIZING)
            .map(|c| c.reason.clone());
        let polls = reason.as_deref() != Some(SyncReason::Scheduled.as_str());
        let mut after = polls.then(|| self.config.poll_interval());

        if let TriggerSpec::Schedule { cron } = machine.trigger() {
            let schedule = match parse_schedule(&cron) {
                Ok(schedule) => schedule,
                Err(err) => {
                    machine.conditions_mut().set(report::error(&err, now));
                    return Err(err);
                }
            };
            if let Some(next) = next_firing(&schedule, now) {
                let until = (next - now).to_std().unwrap_or(Duration::ZERO);
                after = Some(after.map_or(until, |poll| poll.min(until)));
            }
        }

        Ok(after)
    }
}
