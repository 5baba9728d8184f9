//! `RingBuffer<T>`: fixed-capacity FIFO ring with explicit overflow handling.
//!
//! The ring owns no lock; [`AdmissionBuffer`][crate::AdmissionBuffer] wraps
//! it in one.  Keeping the data structure synchronous makes every invariant
//! checkable in plain unit tests.

use qs_core::OverflowPolicy;

use crate::{QueueError, QueueResult};

// ── Admission ─────────────────────────────────────────────────────────────────

/// Outcome of [`RingBuffer::push`].
#[derive(Debug, PartialEq, Eq)]
pub enum Admission<T> {
    /// The item was stored and nothing was lost.
    Enqueued,
    /// The item was stored; a previously queued item was pushed out.
    Displaced(T),
    /// The ring was full and left untouched; the item is handed back.
    Refused(T),
}

impl<T> Admission<T> {
    #[inline]
    pub fn is_enqueued(&self) -> bool {
        matches!(self, Admission::Enqueued)
    }

    /// The item that was lost, if any.
    pub fn lost(&self) -> Option<&T> {
        match self {
            Admission::Enqueued => None,
            Admission::Displaced(t) | Admission::Refused(t) => Some(t),
        }
    }
}

// ── RingBuffer ────────────────────────────────────────────────────────────────

/// Fixed-capacity ring of optional slots.
#[derive(Debug)]
pub struct RingBuffer<T> {
    slots: Vec<Option<T>>,
    /// Next write slot.
    head:  usize,
    /// Next read slot.
    tail:  usize,
    full:  bool,
}

impl<T> RingBuffer<T> {
    pub fn new(capacity: usize) -> QueueResult<Self> {
        if capacity == 0 {
            return Err(QueueError::ZeroCapacity);
        }
        Ok(Self {
            slots: std::iter::repeat_with(|| None).take(capacity).collect(),
            head:  0,
            tail:  0,
            full:  false,
        })
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.full
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.head == self.tail && !self.full
    }

    /// Number of occupied slots, always in `0..=capacity`.
    pub fn len(&self) -> usize {
        if self.full {
            self.capacity()
        } else {
            (self.head + self.capacity() - self.tail) % self.capacity()
        }
    }

    /// Insert `item`, resolving a full ring according to `policy`.
    pub fn push(&mut self, item: T, policy: OverflowPolicy) -> Admission<T> {
        if !self.full {
            self.write(item);
            return Admission::Enqueued;
        }

        match policy {
            OverflowPolicy::ReplaceNewest => {
                // Step back onto the most recent entry and overwrite it; the
                // fill level does not change.
                self.head = self.retreat(self.head);
                let victim = self.slots[self.head].take();
                self.write(item);
                match victim {
                    Some(v) => Admission::Displaced(v),
                    None => Admission::Enqueued, // unreachable for a full ring
                }
            }
            OverflowPolicy::EvictOldest => {
                let victim = self.pop();
                self.write(item);
                match victim {
                    Some(v) => Admission::Displaced(v),
                    None => Admission::Enqueued,
                }
            }
            OverflowPolicy::RejectIncoming => Admission::Refused(item),
        }
    }

    /// Remove and return the entry at `tail`.
    pub fn pop(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        let item = self.slots[self.tail].take();
        self.tail = self.advance(self.tail);
        self.full = false;
        item
    }

    /// Peek at the entry `pop` would return.
    pub fn front(&self) -> Option<&T> {
        if self.is_empty() {
            return None;
        }
        self.slots[self.tail].as_ref()
    }

    /// Remove the first entry (in FIFO order) matching `pred`.
    ///
    /// Later entries shift one slot towards `tail` and `head` retreats, so
    /// FIFO order of the survivors is preserved.  O(len).
    pub fn remove_where<F>(&mut self, mut pred: F) -> Option<T>
    where
        F: FnMut(&T) -> bool,
    {
        let len = self.len();
        let cap = self.capacity();
        let offset = (0..len).find(|&o| {
            self.slots[(self.tail + o) % cap].as_ref().is_some_and(&mut pred)
        })?;

        let removed = self.slots[(self.tail + offset) % cap].take();
        for k in offset..len - 1 {
            let from = (self.tail + k + 1) % cap;
            let to = (self.tail + k) % cap;
            self.slots[to] = self.slots[from].take();
        }
        self.head = self.retreat(self.head);
        self.full = false;
        removed
    }

    /// Iterate live entries from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        let cap = self.capacity();
        (0..self.len()).filter_map(move |o| self.slots[(self.tail + o) % cap].as_ref())
    }

    // ── Internals ─────────────────────────────────────────────────────────

    fn write(&mut self, item: T) {
        self.slots[self.head] = Some(item);
        self.head = self.advance(self.head);
        if self.head == self.tail {
            self.full = true;
        }
    }

    #[inline]
    fn advance(&self, i: usize) -> usize {
        (i + 1) % self.capacity()
    }

    #[inline]
    fn retreat(&self, i: usize) -> usize {
        (i + self.capacity() - 1) % self.capacity()
    }
}
