//! Stream multiplexing over a single physical connection.
//!
//! Inbound text frames carry `{"stream": <name>, "payload": <json>}`. Each
//! named stream is served by its own child consumer; child output is wrapped
//! back into the same envelope shape.

pub mod demultiplexer;
pub mod routes;
pub mod sink;

pub use demultiplexer::{DemuxSettings, Demultiplexer};
pub use routes::{Route, SpawnMode, StreamRoutes};
pub use sink::StreamSink;
