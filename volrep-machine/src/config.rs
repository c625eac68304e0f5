//! Driver configuration.
//!
//! Embedders usually construct [`DriverConfig`] in code; a TOML loader is
//! provided for daemons that keep it in a file.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration for the state-machine driver and its reconcile loop.
#[derive(Debug, Clone, Deserialize)]
pub struct DriverConfig {
    /// Poll interval in seconds while a cycle is running or a manual
    /// trigger is awaited (default: 60).
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    /// Retry backoff applied by the reconcile loop after a failed tick.
    #[serde(default)]
    pub retry: RetryConfig,
}

/// Backoff settings for failed ticks.
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    /// Delay after the first failure, in seconds (default: 5).
    #[serde(default = "default_initial_delay")]
    pub initial_delay_secs: u64,
    /// Upper bound on the backoff delay, in seconds (default: 300).
    #[serde(default = "default_max_delay")]
    pub max_delay_secs: u64,
}

fn default_poll_interval() -> u64 {
    60
}

fn default_initial_delay() -> u64 {
    5
}

fn default_max_delay() -> u64 {
    300
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            retry: RetryConfig::default(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            initial_delay_secs: default_initial_delay(),
            max_delay_secs: default_max_delay(),
        }
    }
}

impl DriverConfig {
    /// The poll interval as a [`Duration`].
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&content).map_err(|source| ConfigError::ParseError {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Failed to parse the configuration file.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: toml::de::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = DriverConfig::default();
        assert_eq!(config.poll_interval_secs, 60);
        assert_eq!(config.poll_interval(), Duration::from_secs(60));
        assert_eq!(config.retry.initial_delay_secs, 5);
        assert_eq!(config.retry.max_delay_secs, 300);
    }

    #[test]
    fn config_from_toml_string() {
        let toml = r#"
poll_interval_secs = 15

[retry]
initial_delay_secs = 2
max_delay_secs = 120
"#;

        let config: DriverConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.poll_interval_secs, 15);
        assert_eq!(config.retry.initial_delay_secs, 2);
        assert_eq!(config.retry.max_delay_secs, 120);
    }

    #[test]
    fn config_missing_fields_use_defaults() {
        let config: DriverConfig = toml::from_str("").unwrap();
        assert_eq!(config.poll_interval_secs, 60);
        assert_eq!(config.retry.max_delay_secs, 300);

        let config: DriverConfig = toml::from_str("[retry]\ninitial_delay_secs = 1\n").unwrap();
        assert_eq!(config.retry.initial_delay_secs, 1);
        assert_eq!(config.retry.max_delay_secs, 300);
    }
}
