//! Fixed-size counter table indexed by catalog slot.

use crate::error::{CounterError, Result};

/// One `u64` counter per catalog slot, unknown bucket included.
///
/// The table is dumb on purpose: it knows nothing about status codes, only
/// slot indices. Classification happens in the catalog, synchronization in
/// whatever store wraps the table.
#[derive(Debug, Clone)]
pub struct StatusTable {
    counts: Vec<u64>,
}

impl StatusTable {
    /// A zeroed table with `slots` counters.
    pub fn new(slots: usize) -> Self {
        Self {
            counts: vec![0; slots],
        }
    }

    /// Number of slots.
    pub fn slots(&self) -> usize {
        self.counts.len()
    }

    /// Increment a slot and return the post-increment value.
    pub fn bump(&mut self, slot: usize) -> Result<u64> {
        match self.counts.get_mut(slot) {
            Some(count) => {
                *count = count.wrapping_add(1);
                Ok(*count)
            }
            None => Err(CounterError::SlotOutOfBounds {
                slot,
                slots: self.counts.len(),
            }),
        }
    }

    /// Current counts in slot order.
    pub fn counts(&self) -> &[u64] {
        &self.counts
    }
}
