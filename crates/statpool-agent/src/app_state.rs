//! Shared application state for the ops surface.
//!
//! The counter store is carried as an explicit value, never a process-wide
//! global: tests inject an in-process store, binaries inject the shared one.

use std::sync::Arc;

use statpool_core::CounterStore;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    store: Arc<dyn CounterStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn CounterStore>) -> Self {
        Self {
            inner: Arc::new(AppStateInner { store }),
        }
    }

    pub fn store(&self) -> &Arc<dyn CounterStore> {
        &self.inner.store
    }
}
