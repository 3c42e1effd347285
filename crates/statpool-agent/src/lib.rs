//! statpool agent library entry.
//!
//! This crate wires the shared region, cross-process lock, and lifecycle
//! capabilities into the store the ops surface serves. It is consumed by the
//! binaries (`main.rs`, `bin/statpool-worker.rs`) and by integration tests.

pub mod app_state;
pub mod config;
pub mod lifecycle;
pub mod lock;
pub mod ops;
pub mod region;
pub mod router;
pub mod store;

pub use lifecycle::{Bootstrap, Coordinator, RegionLocator, StartupMarker, Worker, REGION_ENV_VAR};
pub use store::SharedCounterStore;
