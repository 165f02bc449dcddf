//! Ring storage addressed by absolute stream positions
//!
//! The buffered source never deals with slot arithmetic directly. Every
//! position it hands to the ring is an absolute offset into the stream, and
//! the ring maps that offset onto a slot. Position `p` always lives in slot
//! `p % capacity`, so the ring retains the most recent `capacity` positions
//! that were written and nothing older.

/// Fixed-capacity circular byte storage.
///
/// Invariant: `capacity() > 0`. The ring does not track which positions are
/// valid; that bookkeeping belongs to the owner, which must only read
/// positions inside `[fetched - capacity, fetched)`.
#[derive(Debug)]
pub struct Ring {
    slots: Box<[u8]>,
}

impl Ring {
    /// Create a ring with `capacity` slots.
    ///
    /// A zero capacity is bumped to one slot so that slot arithmetic stays
    /// well defined.
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![0u8; capacity.max(1)].into_boxed_slice(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Slot holding absolute position `pos`.
    ///
    /// Post: the result is `< capacity()`.
    pub fn slot(&self, pos: u64) -> usize {
        (pos % self.slots.len() as u64) as usize
    }

    /// Number of positions starting at `pos` that occupy consecutive slots
    /// before the ring wraps around.
    ///
    /// Post: `1 <= run_len(pos) <= capacity()`.
    pub fn run_len(&self, pos: u64) -> usize {
        self.capacity() - self.slot(pos)
    }

    /// Contiguous slots for positions `pos..pos + n`, where
    /// `n = min(max, run_len(pos))`.
    pub fn writable(&mut self, pos: u64, max: usize) -> &mut [u8] {
        let start = self.slot(pos);
        let len = max.min(self.run_len(pos));
        &mut self.slots[start..start + len]
    }

    /// Contiguous bytes for positions `pos..pos + n`, where
    /// `n = min(max, run_len(pos))`.
    pub fn readable(&self, pos: u64, max: usize) -> &[u8] {
        let start = self.slot(pos);
        let len = max.min(self.run_len(pos));
        &self.slots[start..start + len]
    }

    pub fn byte_at(&self, pos: u64) -> u8 {
        self.slots[self.slot(pos)]
    }
}
