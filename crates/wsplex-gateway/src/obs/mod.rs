//! Lightweight in-process metrics (dependency-free).
//!
//! Counters are bumped from the consumer driver, the demultiplexer and the
//! transport, and rendered by the `/metrics` handler.

pub mod metrics;
