//! Consumers: application hooks, the lifecycle state machine and its driver.
//!
//! An [`App`] produces one hook executor per connection. [`driver::spawn`]
//! wires it to a [`Context`] and runs the [`Lifecycle`] on its own task.

pub mod app;
pub mod context;
pub mod driver;
pub mod executor;
mod groups;
pub mod hooks;
pub mod lifecycle;
pub mod sink;

pub use app::{App, ConsumerConfig};
pub use context::{CloseCode, ConnectionState, Context, SyncContext};
pub use driver::{spawn, ConsumerHandle, Spawn};
pub use executor::{AsyncExecutor, BlockingExecutor, HookExecutor};
pub use hooks::{
    ConnectOutcome, Consumer, Json, JsonConsumer, Passive, SyncConsumer, SyncJson, SyncJsonConsumer,
};
pub use lifecycle::{Flow, Lifecycle};
pub use sink::{Outbound, TransportSink};
