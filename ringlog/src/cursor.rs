//! Independent reader cursors.
//!
//! A [`Cursor`] is one consumer's position in a log. Unlike the log's
//! default cursor, it is not pushed forward by the writer. Instead it
//! remembers the sequence number of the line it points at, so when the
//! writer laps it the next read can tell exactly how many lines were lost.
//!
//! # Design
//!
//! Sequence numbers count every line ever written to a log, starting at
//! zero. The log retains the window `[total_written - len, total_written)`.
//! A cursor whose sequence number has fallen below that window jumps to the
//! oldest surviving line and adds the gap to its [`dropped`](Cursor::dropped)
//! counter. Everything still stored is recovered; nothing is raised.
//!
//! Cursors are created by [`RingLog`](crate::log::RingLog) and only mean
//! something against the log that created them.

use crate::ring::{Forward, LineRing};

/// An independent read position in a log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor {
    /// Slot of the next line to read.
    pos: usize,
    /// Sequence number of the next line to read.
    seq: u64,
    /// Lines skipped because the writer lapped this cursor.
    dropped: u64,
}

impl Cursor {
    pub(crate) fn at_seq(ring: &LineRing, seq: u64) -> Self {
        Self {
            pos: ring.slot_of(seq),
            seq,
            dropped: 0,
        }
    }

    /// Returns the slot of the next line this cursor will read.
    ///
    /// When the cursor is caught up this equals the log's write position.
    pub fn read_pos(&self) -> usize {
        self.pos
    }

    /// Returns the sequence number of the next line this cursor will read.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Returns how many lines this cursor lost to lapping so far.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Returns whether the cursor has read everything written to `ring`.
    pub(crate) fn is_caught_up(&self, ring: &LineRing) -> bool {
        self.seq >= ring.total_written()
    }

    /// Pulls a lapped cursor back into the retained window.
    fn recover(&mut self, ring: &LineRing) {
        let oldest = ring.oldest_seq();
        if self.seq < oldest {
            self.dropped += oldest - self.seq;
            self.seq = oldest;
        }
        self.seq = self.seq.min(ring.total_written());
        self.pos = ring.slot_of(self.seq);
    }

    /// Returns the unread lines and marks them as read.
    pub(crate) fn drain<'a>(&mut self, ring: &'a LineRing) -> Forward<'a> {
        self.recover(ring);
        let lines = ring.since(self.seq);

        self.seq = ring.total_written();
        self.pos = ring.write_pos();
        lines
    }

    /// Moves the cursor by `n` lines.
    ///
    /// Positive `n` stops at the newest line and leaves a caught-up cursor
    /// alone. Negative `n` stops at the oldest stored line.
    pub(crate) fn seek(&mut self, ring: &LineRing, n: isize) {
        self.recover(ring);
        let steps = u64::try_from(n.unsigned_abs()).unwrap_or(u64::MAX);
        let written = ring.total_written();

        if n > 0 && self.seq < written {
            self.seq = self.seq.saturating_add(steps).min(written - 1);
        } else if n < 0 {
            self.seq = self.seq.saturating_sub(steps).max(ring.oldest_seq());
        }
        self.pos = ring.slot_of(self.seq);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_ring(capacity: usize, lines: &[&str]) -> LineRing {
        let mut ring = LineRing::new(capacity).unwrap();
        for line in lines {
            ring.write((*line).to_string());
        }
        ring
    }

    #[test]
    fn test_drain_returns_only_new_lines() {
        let mut ring = create_test_ring(8, &["a", "b"]);
        let mut cursor = Cursor::at_seq(&ring, 0);

        assert_eq!(cursor.drain(&ring).collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(cursor.drain(&ring).count(), 0);
        assert!(cursor.is_caught_up(&ring));

        ring.write("c".to_string());
        assert!(!cursor.is_caught_up(&ring));
        assert_eq!(cursor.drain(&ring).collect::<Vec<_>>(), vec!["c"]);
        assert_eq!(cursor.read_pos(), ring.write_pos());
    }

    #[test]
    fn test_lapped_cursor_recovers_everything_stored() {
        let ring = create_test_ring(5, &["a", "b", "c", "d", "e", "f"]);
        let mut cursor = Cursor::at_seq(&LineRing::new(5).unwrap(), 0);

        assert_eq!(
            cursor.drain(&ring).collect::<Vec<_>>(),
            vec!["b", "c", "d", "e", "f"]
        );
        assert_eq!(cursor.dropped(), 1);
        assert_eq!(cursor.seq(), 6);
    }

    #[test]
    fn test_dropped_accumulates() {
        let mut ring = LineRing::new(3).unwrap();
        let mut cursor = Cursor::at_seq(&ring, 0);

        for k in 0..5 {
            ring.write(k.to_string());
        }
        assert_eq!(cursor.drain(&ring).collect::<Vec<_>>(), vec!["2", "3", "4"]);
        assert_eq!(cursor.dropped(), 2);

        for k in 5..12 {
            ring.write(k.to_string());
        }
        assert_eq!(cursor.drain(&ring).collect::<Vec<_>>(), vec!["9", "10", "11"]);
        assert_eq!(cursor.dropped(), 6);
    }

    #[test]
    fn test_seek_clamps_to_window() {
        let ring = create_test_ring(4, &["a", "b", "c", "d", "e", "f"]);
        let mut cursor = Cursor::at_seq(&ring, ring.total_written());

        cursor.seek(&ring, 1);
        assert_eq!(cursor.seq(), 6, "caught-up cursor does not move forward");

        cursor.seek(&ring, -2);
        assert_eq!(cursor.seq(), 4);
        assert_eq!(cursor.drain(&ring).collect::<Vec<_>>(), vec!["e", "f"]);

        cursor.seek(&ring, isize::MIN);
        assert_eq!(cursor.seq(), ring.oldest_seq());
        assert_eq!(cursor.read_pos(), ring.write_pos());
        assert_eq!(cursor.dropped(), 0);

        cursor.seek(&ring, isize::MAX);
        assert_eq!(cursor.seq(), 5);
        assert_eq!(cursor.read_pos(), ring.most_recent_pos());
    }

    #[test]
    fn test_cursor_ahead_of_log_is_clamped() {
        let big = create_test_ring(8, &["a", "b", "c", "d"]);
        let small = create_test_ring(8, &["x"]);
        let mut cursor = Cursor::at_seq(&big, big.total_written());

        assert_eq!(cursor.drain(&small).count(), 0);
        assert_eq!(cursor.seq(), 1);
    }
}
