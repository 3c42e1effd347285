//! Process-shared implementation of the `CounterStore` trait.

use std::sync::Arc;

use statpool_core::{CounterStore, Result, Snapshot, StatusCatalog};

use crate::lock::CrossProcessLock;
use crate::region::TableView;

/// One process's binding of {catalog, table view, lock}. Every handle built
/// from the same region refers to the same underlying table; the lock is the
/// sole correctness mechanism for its slots.
pub struct SharedCounterStore {
    catalog: Arc<StatusCatalog>,
    view: TableView,
    lock: Arc<CrossProcessLock>,
}

impl SharedCounterStore {
    pub(crate) fn new(
        catalog: Arc<StatusCatalog>,
        view: TableView,
        lock: Arc<CrossProcessLock>,
    ) -> Self {
        Self {
            catalog,
            view,
            lock,
        }
    }
}

impl CounterStore for SharedCounterStore {
    fn increment(&self, code: u16) -> Result<u64> {
        let slot = self.catalog.slot_of(code);
        let count = {
            let _guard = self.lock.acquire()?;
            let next = self.view.load(slot)?.wrapping_add(1);
            self.view.store(slot, next)?;
            next
        };
        // Best-effort observability, outside the critical section.
        tracing::debug!(code, count, "counter updated");
        Ok(count)
    }

    fn snapshot(&self) -> Result<Snapshot> {
        let counts = {
            let _guard = self.lock.acquire()?;
            self.view.copy_all()
        };
        Ok(Snapshot::new(Arc::clone(&self.catalog), counts))
    }
}
