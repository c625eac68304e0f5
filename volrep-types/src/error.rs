//! Error taxonomy for replication machines.

use thiserror::Error;

/// Errors surfaced by the replication state machine.
///
/// The driver never retries internally: every error is returned to the
/// caller, which owns retry scheduling. Persisted state is preserved across
/// errors, so the next tick re-derives intent from whatever was committed.
#[derive(Debug, Error)]
pub enum MachineError {
    /// A mover hook failed. Transient: the next tick retries the same phase.
    #[error("mover error: {0}")]
    Mover(String),

    /// The cron expression in a schedule trigger could not be parsed.
    #[error("invalid cron expression {spec:?}: {source}")]
    InvalidSchedule {
        /// The offending expression.
        spec: String,
        /// Parser error detail.
        #[source]
        source: cron::error::Error,
    },

    /// A manual trigger was declared without a token.
    #[error("manual trigger requires a non-empty token")]
    MissingManualToken,

    /// The caller's cancellation token fired before the tick started.
    #[error("reconcile cancelled")]
    Cancelled,

    /// The host failed to persist machine state.
    #[error("persistence error: {0}")]
    Persistence(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = MachineError::Mover("copy failed".into());
        assert_eq!(err.to_string(), "mover error: copy failed");
        assert_eq!(
            MachineError::Cancelled.to_string(),
            "reconcile cancelled"
        );
    }

    #[test]
    fn invalid_schedule_names_the_spec() {
        let source = "invalid".parse::<cron::Schedule>().unwrap_err();
        let err = MachineError::InvalidSchedule {
            spec: "invalid".into(),
            source,
        };
        assert!(err.to_string().starts_with("invalid cron expression \"invalid\""));
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<MachineError>();
    }
}
