//! Top-level facade crate for wsPlex.
//!
//! Re-exports core types and the gateway library so users can depend on a single crate.

pub mod core {
    pub use wsplex_core::*;
}

pub mod gateway {
    pub use wsplex_gateway::*;
}
