//! Top-level facade crate for statpool.
//!
//! Re-exports the core counting types and the agent library so users can
//! depend on a single crate.

pub mod core {
    pub use statpool_core::*;
}

pub mod agent {
    pub use statpool_agent::*;
}
