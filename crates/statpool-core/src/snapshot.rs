//! Point-in-time copy of a counter table, paired with its catalog.

use std::sync::Arc;

use serde::Serialize;

use crate::catalog::StatusCatalog;

/// A consistent copy of every slot, taken while the table was locked.
///
/// Snapshots own their counts, so rendering and serialization never touch
/// the live table. `counts` always has exactly `catalog.slots()` elements;
/// stores construct snapshots from their own catalog and table, which share
/// that length.
#[derive(Debug, Clone)]
pub struct Snapshot {
    catalog: Arc<StatusCatalog>,
    counts: Vec<u64>,
}

/// One slot of a snapshot, resolved against the catalog. The unknown bucket
/// has neither code nor label.
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotEntry<'a> {
    pub slot: usize,
    pub code: Option<u16>,
    pub label: Option<&'a str>,
    pub count: u64,
}

impl Snapshot {
    pub fn new(catalog: Arc<StatusCatalog>, counts: Vec<u64>) -> Self {
        Self { catalog, counts }
    }

    pub fn catalog(&self) -> &StatusCatalog {
        &self.catalog
    }

    /// Raw counts in slot order, unknown bucket last.
    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    /// Sum over every slot, unknown bucket included.
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Count recorded for one status code (the unknown bucket's count for
    /// codes the catalog does not list).
    pub fn count_for(&self, code: u16) -> u64 {
        self.counts
            .get(self.catalog.slot_of(code))
            .copied()
            .unwrap_or(0)
    }

    /// Count absorbed by the unknown bucket.
    pub fn unknown_count(&self) -> u64 {
        self.counts
            .get(self.catalog.unknown_slot())
            .copied()
            .unwrap_or(0)
    }

    /// Every slot in order, resolved against the catalog.
    pub fn entries(&self) -> impl Iterator<Item = SnapshotEntry<'_>> {
        self.counts.iter().enumerate().map(|(slot, &count)| {
            let entry = self.catalog.entry(slot);
            SnapshotEntry {
                slot,
                code: entry.map(|e| e.code),
                label: entry.map(|e| e.label.as_str()),
                count,
            }
        })
    }
}
