//! Built-in demo applications served by the binary.

pub mod chat;
pub mod echo;

pub use chat::{ChatConsumer, LOBBY};
pub use echo::EchoConsumer;
