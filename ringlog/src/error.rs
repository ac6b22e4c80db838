//! Error types for the ringlog line buffer.
//!
//! Read operations never fail: a reader racing the writer always gets a
//! valid, possibly empty, answer. Errors only come from construction,
//! configuration loading, the producer loop, and consumer-side deadlines.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// The main error type for all ringlog operations.
#[derive(Error, Debug)]
pub enum RingLogError {
    /// The log cannot be built from the given configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(#[from] ConfigError),

    /// The producer loop failed while feeding the log.
    #[error("pump error: {0}")]
    Pump(#[from] PumpError),

    /// A watcher gave up waiting for a matching line.
    #[error("watch error: {0}")]
    Watch(#[from] WatchError),
}

/// Errors raised while building a log or loading its configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Capacity must be a positive number of lines.
    #[error("invalid capacity {capacity}: must be > 0")]
    InvalidCapacity {
        /// The rejected capacity.
        capacity: usize,
    },

    /// Preallocated storage does not match the configured capacity.
    #[error("preallocated storage holds {actual} slots but capacity is {expected}")]
    StorageMismatch {
        /// The configured capacity.
        expected: usize,
        /// The length of the storage that was supplied.
        actual: usize,
    },

    /// Poll interval must be non-zero.
    #[error("poll interval must be non-zero")]
    InvalidPollInterval,

    /// Failed to read a configuration file.
    #[error("failed to load config from '{}': {source}", path.display())]
    Load {
        /// The config file path.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse a configuration file as JSON.
    #[error("failed to parse config from '{}': {source}", path.display())]
    Parse {
        /// The config file path.
        path: PathBuf,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}

/// Errors raised by the producer loop.
#[derive(Error, Debug)]
pub enum PumpError {
    /// Reading from the source stream failed (including invalid UTF-8).
    #[error("read failed after {lines_read} line(s): {source}")]
    Read {
        /// Lines successfully written before the failure.
        lines_read: u64,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The pump thread could not be started.
    #[error("failed to spawn pump thread '{name}': {source}")]
    Spawn {
        /// The requested thread name.
        name: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The pump thread panicked before finishing.
    #[error("pump thread '{name}' panicked")]
    Panicked {
        /// The thread name.
        name: String,
    },
}

/// Errors raised by consumer-side waits.
#[derive(Error, Debug)]
pub enum WatchError {
    /// No matching line appeared before the deadline.
    #[error("no matching line after {waited:?}")]
    DeadlineExpired {
        /// How long the watcher waited.
        waited: Duration,
    },
}

/// Type alias for `Result<T, RingLogError>`.
pub type Result<T> = std::result::Result<T, RingLogError>;
