//! wsPlex core: transport-agnostic event types, codec, scope and errors.
//!
//! This crate defines the wire-level contracts and error surface shared by the
//! gateway runtime and by applications. It carries no transport or runtime
//! dependencies so it can be reused in multiple contexts.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! All fallible paths must surface as `WsPlexError`/`Result` so a malformed
//! frame fails one connection instead of the process.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod codec;
pub mod error;
pub mod protocol;
pub mod scope;

/// Shared result type.
pub use error::{Result, WsPlexError};
