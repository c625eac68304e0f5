//! # volrep-machine
//!
//! State-machine driver for replicated volume synchronization.
//!
//! On each reconcile tick the [`Driver`] inspects a machine's observable
//! progress and its trigger policy, advances the state machine by at most
//! one transition, publishes the `Synchronizing` condition, mirrors the
//! out-of-sync flag to a gauge, and advises the caller when to requeue.
//!
//! ## Architecture
//!
//! ```text
//!   reconcile loop ───tick───► Driver ───hooks───► ReplicationMachine
//!                                │                       │
//!                     volrep-core (trigger,         mover + persisted
//!                     deadline, conditions)         machine state
//!                                │
//!                                ▼
//!                           SyncMetrics
//! ```
//!
//! The driver performs no I/O of its own: all reads and writes go through
//! the [`ReplicationMachine`] host interface, and every decision is
//! reconstructable from persisted state alone, so ticks are idempotent and
//! crash-safe under a level-triggered reconcile model.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod controller;
pub mod driver;
pub mod host;
pub mod memory;
pub mod metrics;
pub mod state;

pub use config::{ConfigError, DriverConfig, RetryConfig};
pub use controller::spawn_machine_loop;
pub use driver::Driver;
pub use host::ReplicationMachine;
pub use memory::InMemoryMachine;
pub use metrics::SyncMetrics;
pub use state::{current_state, MachineState};
