//! Mover progress reporting.

use serde::{Deserialize, Serialize};

/// Progress reported by a mover hook.
///
/// `Complete` is a commitment: invoking the same hook again after it has
/// returned `Complete` must remain `Complete` or safely redo nothing. The
/// mover owns all volume and protocol state; the state machine only sees
/// this status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoverStatus {
    /// The operation is still running; tick again later.
    InProgress,
    /// The operation has finished.
    Complete,
}

impl MoverStatus {
    /// True once the mover has finished the phase.
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete)
    }
}
