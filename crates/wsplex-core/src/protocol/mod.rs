//! Protocol modules (transport events + multiplexing envelope).
//!
//! - `event`: the key/value event records exchanged with a transport.
//! - `envelope`: the `{stream, payload}` wrapper used to multiplex logical
//!   streams over one socket.
//!
//! All parsers are panic-free: malformed input is reported as `WsPlexError`
//! instead of panicking, keeping a connection's failure local to it.

pub mod envelope;
pub mod event;
