//! wsPlex gateway library entry.
//!
//! Consumer lifecycle runtime, channel layer, stream demultiplexer, scope
//! middleware and transports, plus the config and ops surface used by the
//! binary (`main.rs`) and by integration tests.

pub mod app_state;
pub mod config;
pub mod consumer;
pub mod demux;
pub mod layer;
pub mod middleware;
pub mod obs;
pub mod ops;
pub mod router;
pub mod services;
pub mod transport;
