//! One-shot consumer.
//!
//! A [`Watcher`] waits for one particular line, such as a server printing
//! `Saved the world` after a save was requested. It attaches caught up, so
//! only lines written after [`Watcher::attach`] are examined and a stale
//! match already in the history never counts.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::cursor::Cursor;
use crate::error::{Result, WatchError};
use crate::log::RingLog;

/// Waits for a line matching a predicate.
#[derive(Debug)]
pub struct Watcher {
    log: Arc<RingLog>,
    cursor: Cursor,
}

impl Watcher {
    /// Attaches to `log`, ignoring everything already written.
    pub fn attach(log: Arc<RingLog>) -> Self {
        let cursor = log.cursor_at_tail();
        Self { log, cursor }
    }

    /// Checks the lines written since the last poll and returns the first
    /// one matching `predicate`.
    ///
    /// Every new line is consumed, including the ones after a match.
    pub fn poll(&mut self, mut predicate: impl FnMut(&str) -> bool) -> Option<String> {
        self.log
            .list_new_since(&mut self.cursor)
            .into_iter()
            .find(|line| predicate(line))
    }

    /// Polls at the log's poll interval until a line matches or `timeout`
    /// passes.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::DeadlineExpired`] if no line matched in time.
    pub fn wait_for(
        &mut self,
        mut predicate: impl FnMut(&str) -> bool,
        timeout: Duration,
    ) -> Result<String> {
        let start = Instant::now();

        loop {
            if let Some(line) = self.poll(&mut predicate) {
                tracing::debug!(log = %self.log.name(), line = %line, "watched line appeared");
                return Ok(line);
            }

            let waited = start.elapsed();
            if waited >= timeout {
                tracing::debug!(log = %self.log.name(), ?waited, "watch deadline expired");
                return Err(WatchError::DeadlineExpired { waited }.into());
            }
            thread::sleep(self.log.poll_interval().min(timeout - waited));
        }
    }

    /// Returns how many lines went by unexamined because the watcher fell
    /// more than a full log behind.
    pub fn dropped(&self) -> u64 {
        self.cursor.dropped()
    }
}
