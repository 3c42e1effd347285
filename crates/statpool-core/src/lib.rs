//! statpool core: status catalog, counter table, snapshots, and text export.
//!
//! This crate defines the counting domain shared by the agent and any embedding
//! process. It intentionally carries no runtime, shared-memory, or transport
//! dependencies so it can be reused in single-process contexts.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! All fallible paths must surface as `CounterError`/`Result` so worker
//! processes do not crash on an out-of-range slot or a bad catalog.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod catalog;
pub mod error;
pub mod export;
pub mod snapshot;
pub mod store;
pub mod table;

pub use catalog::{StatusCatalog, StatusEntry};
pub use error::{CounterError, Result, Severity};
pub use snapshot::{Snapshot, SnapshotEntry};
pub use store::{CounterStore, LocalCounterStore};
pub use table::StatusTable;
