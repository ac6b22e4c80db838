//! Relay consumer.
//!
//! A [`Follower`] is what a remote session attaches to a log: it gets the
//! current history once, then repeatedly pulls only the lines written since
//! its last poll.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::cursor::Cursor;
use crate::log::RingLog;

/// Streams a log's lines to one consumer.
#[derive(Debug)]
pub struct Follower {
    log: Arc<RingLog>,
    cursor: Cursor,
}

impl Follower {
    /// Attaches to `log`, returning its current history and a follower that
    /// continues right after it.
    pub fn attach(log: Arc<RingLog>) -> (Vec<String>, Self) {
        let (history, cursor) = log.attach();
        (history, Self { log, cursor })
    }

    /// Returns the lines written since the last poll.
    pub fn poll(&mut self) -> Vec<String> {
        self.log.list_new_since(&mut self.cursor)
    }

    /// Polls at the log's poll interval until new lines arrive or `timeout`
    /// passes. Returns an empty batch on timeout.
    pub fn poll_timeout(&mut self, timeout: Duration) -> Vec<String> {
        let start = Instant::now();
        loop {
            let lines = self.poll();
            let elapsed = start.elapsed();
            if !lines.is_empty() || elapsed >= timeout {
                return lines;
            }
            thread::sleep(self.log.poll_interval().min(timeout - elapsed));
        }
    }

    /// Returns how many lines this follower missed because it fell more
    /// than a full log behind.
    pub fn dropped(&self) -> u64 {
        self.cursor.dropped()
    }

    /// Returns the log being followed.
    pub fn log(&self) -> &Arc<RingLog> {
        &self.log
    }
}
