//! # ringlog
//!
//! Ring-buffered line log with one writer and many independent readers.
//!
//! ringlog buffers the output stream of a supervised process and serves it
//! to several consumers at once: a terminal view scrolling through history,
//! a remote session following new lines, a watcher waiting for one
//! particular line. The writer never waits for any of them.
//!
//! **Status**: This crate is in early development. The API is not yet stable.
//!
//! ## Key Properties
//!
//! - Fixed capacity chosen at construction; the oldest line is overwritten
//! - Writes never block on readers and never fail
//! - Any number of independent cursors, each free to move forward or back
//! - Lapped readers recover the oldest surviving line and count what they lost
//! - Pluggable line filter, output sinks, and control side channel
//!
//! ## Quick Start
//!
//! ```rust
//! use std::io::Cursor;
//! use std::sync::Arc;
//! use ringlog::{Follower, RingLog, pump};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // One log per output stream, shared behind an Arc
//! let log = Arc::new(RingLog::new(1024)?);
//!
//! // The producer: frame lines from any BufRead
//! pump::pump_lines(&log, Cursor::new("Starting server\nDone (2.1s)!\n"))?;
//!
//! // A display: the newest lines, newest first
//! let screen = log.list_backward(log.most_recent_read_pos(), Some(24));
//! assert_eq!(screen, vec!["Done (2.1s)!", "Starting server"]);
//!
//! // A relay: history once, then only new lines
//! let (history, mut follower) = Follower::attach(Arc::clone(&log));
//! assert_eq!(history.len(), 2);
//! log.write("<alice> hi");
//! assert_eq!(follower.poll(), vec!["<alice> hi"]);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`RingLog`] - The shared, synchronized log
//! - [`Cursor`] - An independent read position with lap tracking
//! - [`RingLogConfig`] - Capacity and polling settings, loadable from JSON
//! - [`LineFilter`] / [`LineSink`] - Plug-ins around the write path
//! - [`Follower`] / [`Watcher`] - Ready-made consumers
//!
//! ## Modules
//!
//! For lower-level access, the individual modules are also public:
//!
//! - [`log`] - The synchronized log
//! - [`ring`] - Unsynchronized slot storage and cursor arithmetic
//! - [`cursor`] - Independent cursors
//! - [`sink`] - Filters and sinks
//! - [`pump`] - The producer loop
//! - [`follow`] - Relay consumer
//! - [`watch`] - One-shot consumer
//! - [`config`] - Configuration
//! - [`error`] - Error types

pub mod config;
pub mod cursor;
pub mod error;
pub mod follow;
pub mod log;
pub mod pump;
pub mod ring;
pub mod sink;
pub mod watch;

// Re-export primary API types at crate root for convenience.
pub use config::RingLogConfig;
pub use cursor::Cursor;
pub use error::{Result, RingLogError};
pub use follow::Follower;
pub use log::{RingLog, RingLogStats};
pub use pump::PumpHandle;
pub use sink::{ChannelSink, ContainsFilter, LineFilter, LineSink, PassThrough, WriterSink};
pub use watch::Watcher;
