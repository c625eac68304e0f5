//! Metrics for replication machines.
//!
//! The out-of-sync gauge is tracked per machine and rewritten on every
//! tick; counters are monotonic since startup. [`SyncMetrics::render_prometheus`]
//! produces Prometheus text format for scrape endpoints.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Metrics registry shared by a [`Driver`](crate::Driver) and any scrape
/// endpoint.
#[derive(Debug, Default)]
pub struct SyncMetrics {
    out_of_sync: Mutex<BTreeMap<String, bool>>,
    runs_total: AtomicU64,
    run_errors_total: AtomicU64,
}

impl SyncMetrics {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one driver tick for `machine`.
    pub fn observe_run(&self, machine: &str, out_of_sync: bool, errored: bool) {
        self.out_of_sync
            .lock()
            .unwrap()
            .insert(machine.to_string(), out_of_sync);
        self.runs_total.fetch_add(1, Ordering::Relaxed);
        if errored {
            self.run_errors_total.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Current value of the out-of-sync gauge for `machine`.
    pub fn out_of_sync(&self, machine: &str) -> Option<bool> {
        self.out_of_sync.lock().unwrap().get(machine).copied()
    }

    /// Total ticks since startup.
    pub fn runs_total(&self) -> u64 {
        self.runs_total.load(Ordering::Relaxed)
    }

    /// Total ticks that surfaced an error.
    pub fn run_errors_total(&self) -> u64 {
        self.run_errors_total.load(Ordering::Relaxed)
    }

    /// Drop the gauge for a machine that no longer exists.
    pub fn forget(&self, machine: &str) {
        self.out_of_sync.lock().unwrap().remove(machine);
    }

    /// Render all metrics in Prometheus text format.
    pub fn render_prometheus(&self) -> String {
        let mut body = String::new();

        body.push_str("# HELP volrep_out_of_sync Whether the machine is actively syncing or behind schedule\n");
        body.push_str("# TYPE volrep_out_of_sync gauge\n");
        for (machine, out_of_sync) in self.out_of_sync.lock().unwrap().iter() {
            let _ = writeln!(
                body,
                "volrep_out_of_sync{{machine=\"{machine}\"}} {}",
                u8::from(*out_of_sync)
            );
        }

        body.push_str("\n# HELP volrep_runs_total Total reconcile ticks handled\n");
        body.push_str("# TYPE volrep_runs_total counter\n");
        let _ = writeln!(body, "volrep_runs_total {}", self.runs_total());

        body.push_str("\n# HELP volrep_run_errors_total Total reconcile ticks that surfaced an error\n");
        body.push_str("# TYPE volrep_run_errors_total counter\n");
        let _ = writeln!(body, "volrep_run_errors_total {}", self.run_errors_total());

        body
    }
}
