//! Shared error type across statpool crates.

use std::path::PathBuf;

use thiserror::Error;

/// How a failure must be handled by the surrounding process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Bootstrap cannot complete; the process must not start.
    FatalBoot,
    /// The shared region or lock is unusable; the worker must exit.
    FatalWorker,
    /// Only the current operation fails; the table was not modified.
    Operation,
}

impl Severity {
    /// String representation used in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::FatalBoot => "FATAL_BOOT",
            Severity::FatalWorker => "FATAL_WORKER",
            Severity::Operation => "OPERATION",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, CounterError>;

/// Unified error type used by core and agent.
#[derive(Debug, Error)]
pub enum CounterError {
    #[error("invalid catalog: {0}")]
    InvalidCatalog(String),
    #[error("slot {slot} out of bounds (table has {slots} slots)")]
    SlotOutOfBounds { slot: usize, slots: usize },
    #[error("failed to create shared region at {}: {source}", .path.display())]
    RegionCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to attach shared region at {}: {source}", .path.display())]
    RegionAttach {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("shared region at {} is {found} bytes, expected {expected}", .path.display())]
    RegionSize {
        path: PathBuf,
        expected: u64,
        found: u64,
    },
    #[error("failed to create lock file at {}: {source}", .path.display())]
    LockCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to reopen lock file at {}: {source}", .path.display())]
    LockReopen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to acquire cross-process lock: {0}")]
    LockAcquire(#[source] std::io::Error),
    #[error("config: {0}")]
    Config(String),
}

impl CounterError {
    /// Map an error to the handling policy the caller must apply.
    pub fn severity(&self) -> Severity {
        match self {
            CounterError::InvalidCatalog(_)
            | CounterError::RegionCreate { .. }
            | CounterError::LockCreate { .. }
            | CounterError::Config(_) => Severity::FatalBoot,
            CounterError::RegionAttach { .. }
            | CounterError::RegionSize { .. }
            | CounterError::LockReopen { .. } => Severity::FatalWorker,
            CounterError::SlotOutOfBounds { .. } | CounterError::LockAcquire(_) => {
                Severity::Operation
            }
        }
    }
}
