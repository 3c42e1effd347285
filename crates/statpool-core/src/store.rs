//! Counter store seam: how callers record outcomes and take snapshots.

use std::sync::{Arc, Mutex, PoisonError};

use crate::catalog::StatusCatalog;
use crate::error::Result;
use crate::snapshot::Snapshot;
use crate::table::StatusTable;

/// Where recorded outcomes live.
///
/// Implementations serialize table access internally; callers hold `&self`
/// and may share the store across threads.
pub trait CounterStore: Send + Sync {
    /// Record one outcome. Codes the catalog does not list land in the
    /// unknown bucket. Returns the post-increment value of the bumped slot.
    fn increment(&self, code: u16) -> Result<u64>;

    /// Consistent copy of every slot.
    fn snapshot(&self) -> Result<Snapshot>;
}

/// In-process store backed by ordinary memory and a plain mutex.
///
/// Same observable semantics as the process-shared store minus cross-process
/// visibility. Used by unit tests and single-process embeddings.
pub struct LocalCounterStore {
    catalog: Arc<StatusCatalog>,
    table: Mutex<StatusTable>,
}

impl LocalCounterStore {
    pub fn new(catalog: Arc<StatusCatalog>) -> Self {
        let table = Mutex::new(StatusTable::new(catalog.slots()));
        Self { catalog, table }
    }
}

impl CounterStore for LocalCounterStore {
    fn increment(&self, code: u16) -> Result<u64> {
        let slot = self.catalog.slot_of(code);
        let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
        table.bump(slot)
    }

    fn snapshot(&self) -> Result<Snapshot> {
        let table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(Snapshot::new(
            Arc::clone(&self.catalog),
            table.counts().to_vec(),
        ))
    }
}
