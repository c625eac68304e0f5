//! Reconcile loop for a single machine.
//!
//! The driver performs one tick; this loop owns the scheduling between
//! ticks: sleep for the advised requeue interval, back off exponentially
//! after failures, stop on cancellation.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use volrep_types::MachineError;

use crate::config::RetryConfig;
use crate::driver::Driver;
use crate::host::ReplicationMachine;

/// Spawn a reconcile loop that owns `machine`.
///
/// The loop ticks the machine, waits for the driver's advised requeue
/// interval (falling back to the poll interval), and exits when `shutdown`
/// is cancelled. Failed ticks are retried with exponential backoff.
pub fn spawn_machine_loop<M>(
    driver: Arc<Driver>,
    mut machine: M,
    shutdown: CancellationToken,
) -> JoinHandle<()>
where
    M: ReplicationMachine + 'static,
{
    tokio::spawn(async move {
        let mut failures: u32 = 0;
        loop {
            let delay = match driver.run(&mut machine, &shutdown).await {
                Ok(requeue) => {
                    failures = 0;
                    requeue.unwrap_or_else(|| driver.config().poll_interval())
                }
                Err(MachineError::Cancelled) => break,
                Err(err) => {
                    failures = failures.saturating_add(1);
                    tracing::error!(
                        machine = machine.name(),
                        error = %err,
                        failures,
                        "reconcile failed"
                    );
                    retry_delay(&driver.config().retry, failures)
                }
            };
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }
        tracing::debug!(machine = machine.name(), "reconcile loop stopped");
    })
}

/// Exponential backoff: `initial × 2^(failures-1)`, capped at the
/// configured maximum.
fn retry_delay(retry: &RetryConfig, failures: u32) -> Duration {
    let initial = retry.initial_delay_secs.max(1);
    let cap = retry.max_delay_secs.max(initial);
    let exponent = failures.saturating_sub(1).min(16);
    let secs = initial.saturating_mul(1u64 << exponent).min(cap);
    Duration::from_secs(secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DriverConfig;
    use crate::memory::InMemoryMachine;
    use crate::metrics::SyncMetrics;
    use volrep_types::TriggerSpec;

    #[test]
    fn retry_delay_doubles_up_to_the_cap() {
        let retry = RetryConfig {
            initial_delay_secs: 5,
            max_delay_secs: 300,
        };
        assert_eq!(retry_delay(&retry, 1), Duration::from_secs(5));
        assert_eq!(retry_delay(&retry, 2), Duration::from_secs(10));
        assert_eq!(retry_delay(&retry, 4), Duration::from_secs(40));
        assert_eq!(retry_delay(&retry, 10), Duration::from_secs(300));
        // Large failure counts must not overflow.
        assert_eq!(retry_delay(&retry, u32::MAX), Duration::from_secs(300));
    }

    #[test]
    fn retry_delay_tolerates_zero_configuration() {
        let retry = RetryConfig {
            initial_delay_secs: 0,
            max_delay_secs: 0,
        };
        assert_eq!(retry_delay(&retry, 1), Duration::from_secs(1));
        assert_eq!(retry_delay(&retry, 8), Duration::from_secs(1));
    }

    #[tokio::test]
    async fn loop_exits_when_already_cancelled() {
        let driver = Arc::new(Driver::new(Arc::new(SyncMetrics::new())));
        let machine = InMemoryMachine::new("m", TriggerSpec::Continuous);
        let shutdown = CancellationToken::new();
        shutdown.cancel();

        let handle = spawn_machine_loop(driver, machine, shutdown);
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("loop should stop promptly")
            .expect("loop should not panic");
    }

    #[tokio::test]
    async fn loop_ticks_until_cancelled() {
        let metrics = Arc::new(SyncMetrics::new());
        let config = DriverConfig {
            poll_interval_secs: 0,
            ..DriverConfig::default()
        };
        let driver = Arc::new(Driver::with_config(config, Arc::clone(&metrics)));
        let machine = InMemoryMachine::new("m", TriggerSpec::Continuous);
        let shutdown = CancellationToken::new();

        let handle = spawn_machine_loop(driver, machine, shutdown.clone());
        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("loop should stop promptly")
            .expect("loop should not panic");

        assert!(metrics.runs_total() > 0);
        assert_eq!(metrics.out_of_sync("m"), Some(true));
    }
}
