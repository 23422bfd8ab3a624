//! Transports: axum WebSocket and in-process channels.
//!
//! Both translate their traffic into inbound events for a spawned consumer
//! and carry its outbound events back out.

pub mod memory;
pub mod ws;

pub use memory::MemoryConnection;
