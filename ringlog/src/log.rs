//! The shareable ring log.
//!
//! [`RingLog`] wraps a [`LineRing`] in a mutex so one writer thread and any
//! number of reader threads can use it at once, usually through an
//! `Arc<RingLog>`. Every read copies the lines it returns while holding the
//! lock and hands back owned `Vec<String>`s; no lock is held across I/O.
//!
//! # Readers
//!
//! There are two ways to read:
//!
//! - **Positions** (`usize` slot indices) with the stateless walks
//!   [`seek`](RingLog::seek), [`list_forward`](RingLog::list_forward) and
//!   [`list_backward`](RingLog::list_backward), plus the log's own *default*
//!   cursor ([`list_new_lines`](RingLog::list_new_lines) and friends). The
//!   default cursor is pushed forward by the writer when it is about to be
//!   lapped.
//! - **[`Cursor`]s**, independent per-consumer positions that track sequence
//!   numbers and report lapped loss exactly through
//!   [`Cursor::dropped`].
//!
//! # Example
//!
//! ```rust
//! use ringlog::RingLog;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let log = RingLog::new(5)?;
//! let mut cursor = log.cursor_at_tail();
//!
//! for line in ["a", "b", "c", "d", "e", "f"] {
//!     log.write(line);
//! }
//!
//! assert_eq!(log.list_all(), vec!["b", "c", "d", "e", "f"]);
//! assert_eq!(log.list_new_since(&mut cursor), vec!["b", "c", "d", "e", "f"]);
//! assert_eq!(cursor.dropped(), 1);
//! assert!(log.list_new_since(&mut cursor).is_empty());
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;

use crate::config::RingLogConfig;
use crate::cursor::Cursor;
use crate::error::Result;
use crate::ring::LineRing;
use crate::sink::{LineFilter, LineSink};

/// Point-in-time counters for a log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RingLogStats {
    /// The log's name.
    pub name: String,
    /// Fixed capacity in lines.
    pub capacity: usize,
    /// Lines currently stored.
    pub len: usize,
    /// Lines ever stored.
    pub total_written: u64,
    /// Lines dropped by the filter before storage.
    pub filtered: u64,
    /// Lines the default cursor lost to lapping.
    pub lapped: u64,
    /// Next slot to be written.
    pub write_pos: usize,
    /// The default cursor.
    pub read_pos: usize,
}

/// A fixed-capacity, thread-safe log of text lines.
///
/// Writes never block on readers and never fail. When the log is full the
/// oldest line is overwritten.
pub struct RingLog {
    name: String,
    capacity: usize,
    poll_interval: Duration,
    ring: Mutex<LineRing>,
    filtered: AtomicU64,
    filter: Option<Box<dyn LineFilter>>,
    sinks: Vec<Box<dyn LineSink>>,
    control: Option<Box<dyn LineSink>>,
}

impl RingLog {
    /// Creates a log holding up to `capacity` lines, with default settings
    /// otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidCapacity`](crate::error::ConfigError::InvalidCapacity)
    /// if `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self> {
        Self::from_config(&RingLogConfig {
            capacity,
            ..RingLogConfig::default()
        })
    }

    /// Creates a log from a configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`](crate::error::ConfigError) if the configuration
    /// is invalid.
    pub fn from_config(config: &RingLogConfig) -> Result<Self> {
        config.validate()?;
        let ring = LineRing::new(config.capacity)?;
        Ok(Self::from_ring(config, ring))
    }

    /// Creates a log on top of preallocated storage.
    ///
    /// The storage length must equal `capacity`; its contents are discarded.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::StorageMismatch`](crate::error::ConfigError::StorageMismatch)
    /// if the lengths differ, or
    /// [`ConfigError::InvalidCapacity`](crate::error::ConfigError::InvalidCapacity)
    /// if `capacity` is zero.
    pub fn with_storage(storage: Vec<Option<String>>, capacity: usize) -> Result<Self> {
        let config = RingLogConfig {
            capacity,
            ..RingLogConfig::default()
        };
        let ring = LineRing::with_storage(storage, capacity)?;
        Ok(Self::from_ring(&config, ring))
    }

    fn from_ring(config: &RingLogConfig, ring: LineRing) -> Self {
        Self {
            name: config.name.clone(),
            capacity: ring.capacity(),
            poll_interval: config.poll_interval,
            ring: Mutex::new(ring),
            filtered: AtomicU64::new(0),
            filter: None,
            sinks: Vec::new(),
            control: None,
        }
    }

    /// Sets the line filter, replacing any previous one.
    #[must_use]
    pub fn with_filter(mut self, filter: impl LineFilter + 'static) -> Self {
        self.filter = Some(Box::new(filter));
        self
    }

    /// Adds a sink that receives every stored line.
    #[must_use]
    pub fn with_sink(mut self, sink: impl LineSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    /// Sets the control sink that receives filter-derived messages.
    #[must_use]
    pub fn with_control(mut self, control: impl LineSink + 'static) -> Self {
        self.control = Some(Box::new(control));
        self
    }

    /// Returns the log's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns how often consumers should poll for new lines.
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    fn lock(&self) -> MutexGuard<'_, LineRing> {
        self.ring.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // Write path

    /// Appends a line.
    ///
    /// The filter may rewrite or drop the line first. Sinks and the control
    /// sink run after the line is stored and the lock is released.
    pub fn write(&self, line: impl Into<String>) {
        self.write_with(line, |_| {});
    }

    /// Appends a line and hands any derived control message to
    /// `on_message`, in addition to the control sink.
    pub fn write_with(&self, line: impl Into<String>, on_message: impl FnOnce(&str)) {
        let line = line.into();
        let line = match &self.filter {
            Some(filter) => filter.mutate(line),
            None => Some(line),
        };
        let Some(line) = line else {
            self.filtered.fetch_add(1, Ordering::Relaxed);
            return;
        };

        let message = self.filter.as_ref().and_then(|filter| filter.parse(&line));
        let echo = (!self.sinks.is_empty()).then(|| line.clone());

        self.lock().write(line);

        if let Some(message) = message {
            on_message(&message);
            if let Some(control) = &self.control {
                self.deliver(control.as_ref(), &message);
            }
        }
        if let Some(echo) = echo {
            for sink in &self.sinks {
                self.deliver(sink.as_ref(), &echo);
            }
        }
    }

    /// Appends several lines in order.
    pub fn write_lines<I, S>(&self, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for line in lines {
            self.write(line);
        }
    }

    fn deliver(&self, sink: &dyn LineSink, line: &str) {
        if let Err(e) = sink.deliver(line) {
            tracing::debug!(log = %self.name, error = %e, "sink delivery failed, skipping");
        }
    }

    // Stateless position reads

    /// Returns the position of the newest line (tail mode).
    pub fn most_recent_read_pos(&self) -> usize {
        self.lock().most_recent_pos()
    }

    /// Moves `pos` by `n` lines, clamping at the newest and oldest lines.
    pub fn seek(&self, pos: usize, n: isize) -> usize {
        self.lock().seek(pos, n)
    }

    /// Returns up to `count` lines from `pos` toward newer lines, oldest
    /// first. `None` reads up to the newest line.
    pub fn list_forward(&self, pos: usize, count: Option<usize>) -> Vec<String> {
        let ring = self.lock();
        collect(ring.forward(pos), count)
    }

    /// Returns up to `count` lines from `pos` toward older lines, newest
    /// first. `None` reads back to the oldest line.
    pub fn list_backward(&self, pos: usize, count: Option<usize>) -> Vec<String> {
        let ring = self.lock();
        collect(ring.backward(pos), count)
    }

    /// Returns every stored line, oldest to newest.
    ///
    /// Does not move any cursor.
    pub fn list_all(&self) -> Vec<String> {
        let ring = self.lock();
        collect(ring.all(), None)
    }

    // Independent cursors

    /// Returns the lines written since the cursor's last read and moves the
    /// cursor to the end.
    ///
    /// A cursor lapped by the writer resumes at the oldest stored line and
    /// counts the skipped lines in [`Cursor::dropped`].
    pub fn list_new_since(&self, cursor: &mut Cursor) -> Vec<String> {
        let ring = self.lock();
        collect(cursor.drain(&ring), None)
    }

    /// Moves a cursor by `n` lines, clamping at the newest and oldest lines.
    pub fn seek_cursor(&self, cursor: &mut Cursor, n: isize) {
        cursor.seek(&self.lock(), n);
    }

    /// Returns a cursor that only sees lines written from now on.
    pub fn cursor_at_tail(&self) -> Cursor {
        let ring = self.lock();
        Cursor::at_seq(&ring, ring.total_written())
    }

    /// Returns a cursor on the newest line.
    pub fn cursor_at_most_recent(&self) -> Cursor {
        let ring = self.lock();
        Cursor::at_seq(&ring, ring.total_written().saturating_sub(1))
    }

    /// Returns a cursor on the oldest stored line.
    pub fn cursor_at_oldest(&self) -> Cursor {
        let ring = self.lock();
        Cursor::at_seq(&ring, ring.oldest_seq())
    }

    /// Returns the current history and a cursor positioned right after it.
    ///
    /// Both are taken under one lock, so following the cursor afterwards
    /// neither misses nor repeats a line.
    pub fn attach(&self) -> (Vec<String>, Cursor) {
        let ring = self.lock();
        let history = collect(ring.all(), None);
        (history, Cursor::at_seq(&ring, ring.total_written()))
    }

    /// Returns whether the cursor has read every line written so far.
    pub fn is_caught_up(&self, cursor: &Cursor) -> bool {
        cursor.is_caught_up(&self.lock())
    }

    // Default cursor

    /// Returns the default cursor.
    pub fn read_pos(&self) -> usize {
        self.lock().read_pos()
    }

    /// Moves the default cursor to `pos`.
    ///
    /// Positions that hold no stored line (other than `write_pos`) are
    /// ignored.
    pub fn set_read_pos(&self, pos: usize) {
        self.lock().set_read_pos(pos);
    }

    /// Moves the default cursor by `n` lines and returns its new position.
    pub fn seek_read(&self, n: isize) -> usize {
        self.lock().seek_read(n)
    }

    /// Moves the default cursor one line newer.
    pub fn advance_read(&self) -> usize {
        self.seek_read(1)
    }

    /// Moves the default cursor one line older.
    pub fn rewind_read(&self) -> usize {
        self.seek_read(-1)
    }

    /// Puts the default cursor on the newest line.
    pub fn most_recent_read(&self) {
        self.lock().most_recent_read();
    }

    /// Returns up to `n` lines forward from the default cursor.
    pub fn list_lines(&self, n: usize) -> Vec<String> {
        let ring = self.lock();
        collect(ring.forward(ring.read_pos()), Some(n))
    }

    /// Returns up to `n` lines backward from the default cursor, newest
    /// first.
    pub fn list_prev_lines(&self, n: usize) -> Vec<String> {
        let ring = self.lock();
        collect(ring.backward(ring.read_pos()), Some(n))
    }

    /// Returns the `n` newest lines, newest first.
    pub fn list_recent_lines(&self, n: usize) -> Vec<String> {
        let ring = self.lock();
        collect(ring.backward(ring.most_recent_pos()), Some(n))
    }

    /// Returns the lines the default cursor has not read and marks them
    /// read.
    pub fn list_new_lines(&self) -> Vec<String> {
        let mut ring = self.lock();
        let lines = collect(ring.unread(), None);
        ring.catch_up();
        lines
    }

    /// Returns every stored line and marks everything read for the default
    /// cursor.
    pub fn list_all_and_catch_up(&self) -> Vec<String> {
        let mut ring = self.lock();
        let lines = collect(ring.all(), None);
        ring.catch_up();
        lines
    }

    // Introspection

    /// Returns the fixed capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of stored lines.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns whether nothing has been stored yet.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Returns whether the log holds `capacity` lines.
    pub fn is_full(&self) -> bool {
        self.lock().is_full()
    }

    /// Returns the next slot to be written.
    pub fn write_pos(&self) -> usize {
        self.lock().write_pos()
    }

    /// Returns the number of lines ever stored.
    pub fn total_written(&self) -> u64 {
        self.lock().total_written()
    }

    /// Returns a snapshot of the log's counters.
    pub fn stats(&self) -> RingLogStats {
        let ring = self.lock();
        RingLogStats {
            name: self.name.clone(),
            capacity: self.capacity,
            len: ring.len(),
            total_written: ring.total_written(),
            filtered: self.filtered.load(Ordering::Relaxed),
            lapped: ring.lapped(),
            write_pos: ring.write_pos(),
            read_pos: ring.read_pos(),
        }
    }
}

impl fmt::Debug for RingLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RingLog")
            .field("name", &self.name)
            .field("capacity", &self.capacity)
            .field("poll_interval", &self.poll_interval)
            .field("filter", &self.filter.is_some())
            .field("sinks", &self.sinks.len())
            .field("control", &self.control.is_some())
            .finish_non_exhaustive()
    }
}

fn collect<'a>(lines: impl Iterator<Item = &'a str>, count: Option<usize>) -> Vec<String> {
    lines
        .take(count.unwrap_or(usize::MAX))
        .map(str::to_string)
        .collect()
}
