//! Trigger policy declarations.

use serde::{Deserialize, Serialize};

/// When a new synchronization cycle is allowed to start.
///
/// The trigger gates the transition out of cleanup; it is never consulted
/// on the very first cycle, so a freshly created machine always gets a
/// baseline synchronization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TriggerSpec {
    /// Synchronize continuously: a new cycle starts as soon as the previous
    /// one has been cleaned up.
    Continuous,
    /// Synchronize once each time the user bumps the token.
    Manual {
        /// Opaque user-chosen token. A cycle starts when it differs from the
        /// last token acted upon.
        token: String,
    },
    /// Synchronize on a cron schedule.
    Schedule {
        /// Five-field cron expression (minute, hour, day-of-month, month,
        /// day-of-week).
        cron: String,
    },
}

impl TriggerSpec {
    /// True for schedule triggers.
    pub fn is_scheduled(&self) -> bool {
        matches!(self, Self::Schedule { .. })
    }

    /// True for manual triggers.
    pub fn is_manual(&self) -> bool {
        matches!(self, Self::Manual { .. })
    }
}

impl Default for TriggerSpec {
    fn default() -> Self {
        Self::Continuous
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_continuous() {
        assert_eq!(TriggerSpec::default(), TriggerSpec::Continuous);
    }

    #[test]
    fn kind_predicates() {
        assert!(!TriggerSpec::Continuous.is_scheduled());
        assert!(TriggerSpec::Manual {
            token: "1".into()
        }
        .is_manual());
        assert!(TriggerSpec::Schedule {
            cron: "* * * * *".into()
        }
        .is_scheduled());
    }

    #[test]
    fn serde_roundtrip() {
        let trigger = TriggerSpec::Schedule {
            cron: "*/10 * * * *".into(),
        };
        let json = serde_json::to_string(&trigger).unwrap();
        assert_eq!(json, r#"{"type":"schedule","cron":"*/10 * * * *"}"#);
        let back: TriggerSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(back, trigger);
    }

    #[test]
    fn serde_tag_distinguishes_variants() {
        let manual: TriggerSpec =
            serde_json::from_str(r#"{"type":"manual","token":"abc"}"#).unwrap();
        assert_eq!(
            manual,
            TriggerSpec::Manual {
                token: "abc".into()
            }
        );

        let continuous: TriggerSpec = serde_json::from_str(r#"{"type":"continuous"}"#).unwrap();
        assert_eq!(continuous, TriggerSpec::Continuous);
    }
}
