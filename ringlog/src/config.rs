//! Configuration for a ring log.
//!
//! A [`RingLogConfig`] fixes the capacity of a log at construction time and
//! carries the polling cadence consumers use when waiting for new lines.
//! Configs can be built in code or loaded from a JSON file.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use ringlog::config::RingLogConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = RingLogConfig::new("server", 2048, Duration::from_millis(50))?;
//! assert_eq!(config.capacity, 2048);
//! # Ok(())
//! # }
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Default number of lines retained by a log.
pub const DEFAULT_CAPACITY: usize = 4096;

/// Default interval between consumer polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Configuration for a single ring log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RingLogConfig {
    /// Human-readable name, used for thread names and log output.
    pub name: String,

    /// Maximum number of lines retained. Must be > 0.
    pub capacity: usize,

    /// How often followers and watchers check for new lines.
    ///
    /// Stored in JSON as whole milliseconds under `poll_interval_ms`.
    #[serde(rename = "poll_interval_ms", with = "millis")]
    pub poll_interval: Duration,
}

/// Serde adapter storing a `Duration` as whole milliseconds.
mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

impl RingLogConfig {
    /// Creates a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidCapacity`] if `capacity` is zero, or
    /// [`ConfigError::InvalidPollInterval`] if `poll_interval` is zero.
    pub fn new(name: impl Into<String>, capacity: usize, poll_interval: Duration) -> Result<Self> {
        let config = Self {
            name: name.into(),
            capacity,
            poll_interval,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if validation fails.
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(ConfigError::InvalidCapacity {
                capacity: self.capacity,
            }
            .into());
        }

        if self.poll_interval.is_zero() {
            return Err(ConfigError::InvalidPollInterval.into());
        }

        Ok(())
    }

    /// Loads and validates a configuration from a JSON file.
    ///
    /// Missing fields take their default values.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid JSON, or
    /// describes an invalid configuration.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let data = std::fs::read_to_string(&path).map_err(|e| ConfigError::Load {
            path: path.clone(),
            source: e,
        })?;
        let config: Self = serde_json::from_str(&data).map_err(|e| ConfigError::Parse {
            path: path.clone(),
            source: e,
        })?;
        config.validate()?;

        tracing::debug!(
            path = %path.display(),
            name = %config.name,
            capacity = config.capacity,
            "loaded ring log config"
        );
        Ok(config)
    }
}

impl Default for RingLogConfig {
    fn default() -> Self {
        Self {
            name: "log".to_string(),
            capacity: DEFAULT_CAPACITY,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}
