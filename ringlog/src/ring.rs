//! Fixed-capacity line ring with cursor arithmetic.
//!
//! This module provides [`LineRing`], the unsynchronized storage behind a
//! [`RingLog`](crate::log::RingLog). It owns the slot array, the write
//! cursor, and the *default* read cursor, and implements every positional
//! walk over the ring as a lazy, restartable iterator.
//!
//! # Positions
//!
//! A position is a slot index in `[0, capacity)`. The slot at `write_pos`
//! is the next one to be overwritten, so position-based reads never return
//! it. A position equal to `write_pos` means "caught up": there is nothing
//! newer to read, but seeking backward from it reaches the newest line.
//!
//! With `A = min(total_written, capacity - 1)` addressable lines, positions
//! fall into three groups, measured as an offset from the oldest
//! addressable slot:
//!
//! - `offset < A` - live: points at a stored line
//! - `offset == A` - caught up (`write_pos`)
//! - `offset > A` - never written; reads return nothing, seeks do nothing
//!
//! [`LineRing::all`] is the one walk that also returns the line at
//! `write_pos` when the ring is full, so it always yields up to
//! `capacity` lines.
//!
//! # Default cursor
//!
//! The ring carries one read cursor of its own. When the writer is about
//! to lap it, the writer pushes it forward one slot (the `advance_flag`
//! bookkeeping below). A slow default reader therefore silently loses its
//! oldest unread line instead of blocking the writer.

use crate::error::{ConfigError, Result};

/// Unsynchronized fixed-capacity storage of text lines.
///
/// # Thread Safety
///
/// `LineRing` has no interior locking. Share it through
/// [`RingLog`](crate::log::RingLog), which wraps it in a mutex.
#[derive(Debug, Clone)]
pub struct LineRing {
    /// Stored lines; `None` marks a slot that has never been written.
    slots: Vec<Option<String>>,
    /// Index of the next slot to be written.
    write_pos: usize,
    /// The default read cursor.
    read_pos: usize,
    /// Set when `read_pos` is one slot ahead of `write_pos`, so the next
    /// write must push it forward.
    advance_flag: bool,
    /// Number of lines ever written.
    total_written: u64,
    /// Number of lines the default cursor skipped because it was lapped.
    lapped: u64,
}

impl LineRing {
    /// Creates an empty ring holding up to `capacity` lines.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidCapacity`] if `capacity` is zero.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use ringlog::ring::LineRing;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let mut ring = LineRing::new(3)?;
    /// ring.write("hello".to_string());
    /// assert_eq!(ring.all().collect::<Vec<_>>(), vec!["hello"]);
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(ConfigError::InvalidCapacity { capacity }.into());
        }

        Ok(Self::from_slots(vec![None; capacity]))
    }

    /// Creates an empty ring on top of caller-provided storage.
    ///
    /// The storage length must equal `capacity`. Existing entries are reset
    /// to absent; only the allocation is reused.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidCapacity`] if `capacity` is zero, or
    /// [`ConfigError::StorageMismatch`] if the storage length differs.
    pub fn with_storage(mut storage: Vec<Option<String>>, capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(ConfigError::InvalidCapacity { capacity }.into());
        }

        if storage.len() != capacity {
            return Err(ConfigError::StorageMismatch {
                expected: capacity,
                actual: storage.len(),
            }
            .into());
        }

        storage.iter_mut().for_each(|slot| *slot = None);
        Ok(Self::from_slots(storage))
    }

    fn from_slots(slots: Vec<Option<String>>) -> Self {
        Self {
            slots,
            write_pos: 0,
            read_pos: 0,
            advance_flag: false,
            total_written: 0,
            lapped: 0,
        }
    }

    /// Returns the fixed capacity.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Returns the number of lines currently stored.
    #[allow(clippy::cast_possible_truncation)] // Bounded by capacity (usize)
    pub fn len(&self) -> usize {
        self.total_written.min(self.capacity() as u64) as usize
    }

    /// Returns whether nothing has been written yet.
    pub fn is_empty(&self) -> bool {
        self.total_written == 0
    }

    /// Returns whether every slot holds a line.
    pub fn is_full(&self) -> bool {
        self.len() == self.capacity()
    }

    /// Returns the index of the next slot to be written.
    pub fn write_pos(&self) -> usize {
        self.write_pos
    }

    /// Returns the number of lines ever written.
    pub fn total_written(&self) -> u64 {
        self.total_written
    }

    /// Returns how many lines the default cursor lost to lapping.
    pub fn lapped(&self) -> u64 {
        self.lapped
    }

    /// Appends one line, overwriting the oldest when full.
    ///
    /// This never fails and never waits. If the default cursor is about to
    /// be overtaken, it is moved forward one slot and its oldest unread line
    /// is dropped.
    pub fn write(&mut self, line: String) {
        self.slots[self.write_pos] = Some(line);
        self.total_written += 1;
        self.advance_write();
    }

    fn advance_write(&mut self) {
        let capacity = self.capacity();
        self.write_pos = (self.write_pos + 1) % capacity;

        if self.advance_flag {
            if self.write_pos == self.read_pos {
                self.read_pos = (self.read_pos + 1) % capacity;
                self.lapped += 1;
            } else {
                self.advance_flag = false;
            }
        }

        // The next write lands on the slot right behind the default cursor;
        // the write after that would lap it.
        if (self.read_pos + capacity - self.write_pos) % capacity == 1 {
            self.advance_flag = true;
        }
    }

    /// Number of lines reachable through positions.
    #[allow(clippy::cast_possible_truncation)] // Bounded by capacity (usize)
    fn addressable(&self) -> usize {
        self.total_written.min(self.capacity() as u64 - 1) as usize
    }

    /// Offset of `pos` from the oldest addressable slot, or `None` if `pos`
    /// is out of range.
    fn offset(&self, pos: usize) -> Option<usize> {
        let capacity = self.capacity();
        if pos >= capacity {
            return None;
        }
        let oldest = (self.write_pos + capacity - self.addressable()) % capacity;
        Some((pos + capacity - oldest) % capacity)
    }

    /// Returns the slot holding the oldest stored line.
    ///
    /// The oldest line is the first populated slot at or after `write_pos`.
    /// For an empty ring this is `write_pos` itself.
    pub fn oldest_pos(&self) -> usize {
        let capacity = self.capacity();
        (self.write_pos + capacity - self.len()) % capacity
    }

    /// Returns the position of the most recently written line.
    ///
    /// This is `(write_pos - 1) mod capacity`; a reader set here is in tail
    /// mode.
    pub fn most_recent_pos(&self) -> usize {
        let capacity = self.capacity();
        (self.write_pos + capacity - 1) % capacity
    }

    /// Moves a position by `n` lines and returns the result.
    ///
    /// Positive `n` moves toward newer lines and stops at the newest one.
    /// Negative `n` moves toward older lines and stops at the oldest
    /// addressable one. Positions that point at nothing are returned as-is.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use ringlog::ring::LineRing;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let mut ring = LineRing::new(3)?;
    /// ring.write("x".to_string());
    /// ring.write("y".to_string());
    ///
    /// // Forward seeks clamp at the newest line.
    /// assert_eq!(ring.seek(0, 100), ring.most_recent_pos());
    /// // Backward seeks clamp at the oldest line.
    /// assert_eq!(ring.seek(1, -100), 0);
    /// # Ok(())
    /// # }
    /// ```
    pub fn seek(&self, pos: usize, n: isize) -> usize {
        let Some(offset) = self.offset(pos) else {
            return pos;
        };
        let addressable = self.addressable();
        let capacity = self.capacity();

        if n > 0 && offset < addressable {
            let steps = n.unsigned_abs().min(addressable - 1 - offset);
            (pos + steps) % capacity
        } else if n < 0 && offset <= addressable {
            let steps = n.unsigned_abs().min(offset);
            (pos + capacity - steps) % capacity
        } else {
            pos
        }
    }

    /// Walks from `pos` toward `write_pos`, oldest first.
    ///
    /// Yields the line at `pos` first and stops before `write_pos` or at the
    /// first absent slot.
    pub fn forward(&self, pos: usize) -> Forward<'_> {
        let remaining = match self.offset(pos) {
            Some(offset) if offset < self.addressable() => self.addressable() - offset,
            _ => 0,
        };
        Forward::new(&self.slots, pos, remaining)
    }

    /// Walks from `pos` toward older lines, newest first.
    ///
    /// Yields the line at `pos` first and stops after the oldest addressable
    /// line or at the first absent slot.
    pub fn backward(&self, pos: usize) -> Backward<'_> {
        let remaining = match self.offset(pos) {
            Some(offset) if offset < self.addressable() => offset + 1,
            _ => 0,
        };
        Backward::new(&self.slots, pos, remaining)
    }

    /// Walks every stored line, oldest to newest.
    ///
    /// When the ring is full this includes the line at `write_pos`, so up
    /// to `capacity` lines are returned.
    pub fn all(&self) -> Forward<'_> {
        Forward::new(&self.slots, self.oldest_pos(), self.len())
    }

    /// Walks the lines stored from sequence number `seq` up to the newest.
    ///
    /// Sequence numbers count every line ever written, starting at zero.
    /// Lines that have already been overwritten are skipped; the walk
    /// starts at the oldest surviving line in that case.
    #[allow(clippy::cast_possible_truncation)] // Bounded by capacity (usize)
    pub fn since(&self, seq: u64) -> Forward<'_> {
        let seq = seq.clamp(self.oldest_seq(), self.total_written);
        let remaining = (self.total_written - seq) as usize;
        Forward::new(&self.slots, self.slot_of(seq), remaining)
    }

    /// Sequence number of the oldest stored line.
    pub fn oldest_seq(&self) -> u64 {
        self.total_written - self.len() as u64
    }

    /// Slot that holds (or will hold) the line with sequence number `seq`.
    #[allow(clippy::cast_possible_truncation)] // Result is bounded by capacity (usize)
    pub fn slot_of(&self, seq: u64) -> usize {
        (seq % self.capacity() as u64) as usize
    }

    /// Returns the default read cursor.
    pub fn read_pos(&self) -> usize {
        self.read_pos
    }

    /// Sets the default read cursor.
    ///
    /// Only live positions and `write_pos` are accepted. Out-of-range and
    /// never-written positions are ignored.
    pub fn set_read_pos(&mut self, pos: usize) {
        if self
            .offset(pos)
            .is_some_and(|offset| offset <= self.addressable())
        {
            self.read_pos = pos;
            self.refresh_advance_flag();
        }
    }

    /// Moves the default read cursor by `n` lines. See [`LineRing::seek`].
    pub fn seek_read(&mut self, n: isize) -> usize {
        self.set_read_pos(self.seek(self.read_pos, n));
        self.read_pos
    }

    /// Puts the default read cursor in tail mode (on the newest line).
    pub fn most_recent_read(&mut self) {
        self.set_read_pos(self.most_recent_pos());
    }

    /// Marks everything as read by moving the default cursor to `write_pos`.
    pub fn catch_up(&mut self) {
        self.set_read_pos(self.write_pos);
    }

    /// Walks the lines the default cursor has not consumed yet.
    pub fn unread(&self) -> Forward<'_> {
        let capacity = self.capacity();
        let remaining = match self.offset(self.read_pos) {
            Some(offset) if offset < self.addressable() => {
                (self.write_pos + capacity - self.read_pos) % capacity
            }
            _ => 0,
        };
        Forward::new(&self.slots, self.read_pos, remaining)
    }

    fn refresh_advance_flag(&mut self) {
        let capacity = self.capacity();
        self.advance_flag = (self.read_pos + capacity - self.write_pos) % capacity == 1;
    }
}

/// Iterator walking the ring toward newer lines.
///
/// Borrowed from a [`LineRing`]; yields `&str` and stops at the first
/// absent slot. Each walk is started from an explicit position, so no state
/// is shared between walks.
#[derive(Debug, Clone)]
pub struct Forward<'a> {
    slots: &'a [Option<String>],
    pos: usize,
    remaining: usize,
}

impl<'a> Forward<'a> {
    fn new(slots: &'a [Option<String>], pos: usize, remaining: usize) -> Self {
        Self {
            slots,
            pos,
            remaining,
        }
    }
}

impl<'a> Iterator for Forward<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let Some(line) = self.slots[self.pos].as_deref() else {
            self.remaining = 0;
            return None;
        };

        self.pos = (self.pos + 1) % self.slots.len();
        self.remaining -= 1;
        Some(line)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining))
    }
}

/// Iterator walking the ring toward older lines.
///
/// The mirror image of [`Forward`]: yields newest first and stops at the
/// first absent slot.
#[derive(Debug, Clone)]
pub struct Backward<'a> {
    slots: &'a [Option<String>],
    pos: usize,
    remaining: usize,
}

impl<'a> Backward<'a> {
    fn new(slots: &'a [Option<String>], pos: usize, remaining: usize) -> Self {
        Self {
            slots,
            pos,
            remaining,
        }
    }
}

impl<'a> Iterator for Backward<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let Some(line) = self.slots[self.pos].as_deref() else {
            self.remaining = 0;
            return None;
        };

        let capacity = self.slots.len();
        self.pos = (self.pos + capacity - 1) % capacity;
        self.remaining -= 1;
        Some(line)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining))
    }
}
