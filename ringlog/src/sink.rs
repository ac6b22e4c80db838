//! Plug-in points around the write path.
//!
//! A [`RingLog`](crate::log::RingLog) is specialized by composition rather
//! than by subclassing:
//!
//! - a [`LineFilter`] may rewrite or drop each line before it is stored, and
//!   may derive a control message from each stored line;
//! - any number of [`LineSink`]s receive every stored line;
//! - one optional control sink receives the derived messages.
//!
//! Sinks run after the log's lock is released. A failing sink is logged at
//! debug level and skipped; it never fails the write.
//!
//! # Example
//!
//! ```rust
//! use std::sync::mpsc;
//! use ringlog::{ChannelSink, ContainsFilter, RingLog};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let (tx, rx) = mpsc::channel();
//! let log = RingLog::new(16)?
//!     .with_filter(ContainsFilter::new("ERROR"))
//!     .with_sink(ChannelSink::new(tx));
//!
//! log.write("INFO all good");
//! log.write("ERROR disk full");
//!
//! assert_eq!(log.list_all(), vec!["ERROR disk full"]);
//! assert_eq!(rx.try_recv()?, "ERROR disk full");
//! # Ok(())
//! # }
//! ```

use std::io::{self, Write};
use std::sync::mpsc::Sender;
use std::sync::{Mutex, PoisonError};

/// Rewrites lines before they are stored and derives control messages.
///
/// Both methods default to pass-through behavior, so implementors only
/// override what they need.
pub trait LineFilter: Send + Sync {
    /// Rewrites a line before it is stored. Returning `None` drops it.
    fn mutate(&self, line: String) -> Option<String> {
        Some(line)
    }

    /// Derives a control message from a stored line.
    fn parse(&self, line: &str) -> Option<String> {
        let _ = line;
        None
    }
}

/// Filter that stores every line unchanged and derives no messages.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThrough;

impl LineFilter for PassThrough {}

/// Filter that keeps only lines containing a pattern.
///
/// Used to build filtered sub-views of a stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainsFilter {
    pattern: String,
}

impl ContainsFilter {
    /// Creates a filter keeping lines that contain `pattern`.
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
        }
    }

    /// Returns the pattern.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

impl LineFilter for ContainsFilter {
    fn mutate(&self, line: String) -> Option<String> {
        line.contains(&self.pattern).then_some(line)
    }
}

/// Receives stored lines (or control messages).
pub trait LineSink: Send + Sync {
    /// Delivers one line.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the line could not be delivered. The log
    /// logs it and moves on.
    fn deliver(&self, line: &str) -> io::Result<()>;
}

impl<F> LineSink for F
where
    F: Fn(&str) + Send + Sync,
{
    fn deliver(&self, line: &str) -> io::Result<()> {
        self(line);
        Ok(())
    }
}

/// Sink mirroring lines to a byte stream.
///
/// Each line is written with a trailing newline and flushed, so a consumer
/// on the other end sees it immediately.
#[derive(Debug)]
pub struct WriterSink<W> {
    writer: Mutex<W>,
}

impl<W: Write> WriterSink<W> {
    /// Wraps a writer.
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Unwraps the writer.
    pub fn into_inner(self) -> W {
        self.writer.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: Write + Send> LineSink for WriterSink<W> {
    fn deliver(&self, line: &str) -> io::Result<()> {
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()
    }
}

/// Sink forwarding lines over a channel.
///
/// Delivery fails once the receiving side has been dropped.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: Sender<String>,
}

impl ChannelSink {
    /// Wraps the sending half of a channel.
    pub fn new(tx: Sender<String>) -> Self {
        Self { tx }
    }
}

impl LineSink for ChannelSink {
    fn deliver(&self, line: &str) -> io::Result<()> {
        self.tx
            .send(line.to_string())
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "channel receiver dropped"))
    }
}
