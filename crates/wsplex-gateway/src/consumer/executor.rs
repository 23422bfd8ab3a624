//! Hook executors: how the lifecycle calls into an application.
//!
//! The lifecycle only ever talks to a [`HookExecutor`]. `AsyncExecutor` awaits
//! hooks on the connection task; `BlockingExecutor` ships each call to a
//! dedicated worker thread and awaits the reply, so a blocking hook stalls
//! only its own connection.

use std::thread;

use async_trait::async_trait;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};

use wsplex_core::error::{Result, WsPlexError};
use wsplex_core::protocol::event::Frame;

use crate::consumer::context::{Context, SyncContext};
use crate::consumer::hooks::{ConnectOutcome, Consumer, SyncConsumer};
use crate::layer::GroupMessage;

#[async_trait]
pub trait HookExecutor: Send {
    async fn connect(&mut self, ctx: &Context) -> Result<ConnectOutcome>;
    async fn receive(&mut self, ctx: &Context, frame: Frame) -> Result<()>;
    async fn group_message(&mut self, ctx: &Context, msg: GroupMessage) -> Result<()>;
    async fn disconnect(&mut self, ctx: &Context, code: u16) -> Result<()>;

    /// Runs when the disconnect arrives, before the declared groups are left.
    async fn before_disconnect(&mut self, _ctx: &Context, _code: u16) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl HookExecutor for Box<dyn HookExecutor> {
    async fn connect(&mut self, ctx: &Context) -> Result<ConnectOutcome> {
        (**self).connect(ctx).await
    }
    async fn receive(&mut self, ctx: &Context, frame: Frame) -> Result<()> {
        (**self).receive(ctx, frame).await
    }
    async fn group_message(&mut self, ctx: &Context, msg: GroupMessage) -> Result<()> {
        (**self).group_message(ctx, msg).await
    }
    async fn disconnect(&mut self, ctx: &Context, code: u16) -> Result<()> {
        (**self).disconnect(ctx, code).await
    }
    async fn before_disconnect(&mut self, ctx: &Context, code: u16) -> Result<()> {
        (**self).before_disconnect(ctx, code).await
    }
}

/// Awaits [`Consumer`] hooks in place.
pub struct AsyncExecutor<C> {
    consumer: C,
}

impl<C: Consumer> AsyncExecutor<C> {
    pub fn new(consumer: C) -> Self {
        Self { consumer }
    }
}

#[async_trait]
impl<C: Consumer> HookExecutor for AsyncExecutor<C> {
    async fn connect(&mut self, ctx: &Context) -> Result<ConnectOutcome> {
        self.consumer.connect(ctx).await
    }
    async fn receive(&mut self, ctx: &Context, frame: Frame) -> Result<()> {
        self.consumer.receive(ctx, frame).await
    }
    async fn group_message(&mut self, ctx: &Context, msg: GroupMessage) -> Result<()> {
        self.consumer.group_message(ctx, msg).await
    }
    async fn disconnect(&mut self, ctx: &Context, code: u16) -> Result<()> {
        self.consumer.disconnect(ctx, code).await
    }
}

enum Call {
    Connect(SyncContext, oneshot::Sender<Result<ConnectOutcome>>),
    Receive(SyncContext, Frame, oneshot::Sender<Result<()>>),
    Group(SyncContext, GroupMessage, oneshot::Sender<Result<()>>),
    Disconnect(SyncContext, u16, oneshot::Sender<Result<()>>),
}

/// Runs [`SyncConsumer`] hooks on a worker thread owned by one connection.
///
/// The worker exits when the executor is dropped. A panicking hook kills the
/// worker; the pending call and every later one fail with an internal error.
pub struct BlockingExecutor {
    calls: mpsc::UnboundedSender<Call>,
    handle: Handle,
}

impl BlockingExecutor {
    /// Must be called from within a tokio runtime.
    pub fn spawn<C: SyncConsumer>(consumer: C) -> Result<Self> {
        let handle = Handle::try_current()
            .map_err(|e| WsPlexError::Internal(format!("sync consumer outside runtime: {e}")))?;
        let (calls, rx) = mpsc::unbounded_channel();
        thread::Builder::new()
            .name("wsplex-sync".into())
            .spawn(move || worker(consumer, rx))
            .map_err(|e| WsPlexError::Internal(format!("sync worker spawn failed: {e}")))?;
        Ok(Self { calls, handle })
    }

    fn sync_ctx(&self, ctx: &Context) -> SyncContext {
        SyncContext::new(ctx.clone(), self.handle.clone())
    }

    async fn call<T>(&self, make: impl FnOnce(oneshot::Sender<Result<T>>) -> Call) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.calls
            .send(make(tx))
            .map_err(|_| WsPlexError::Internal("sync worker gone".into()))?;
        rx.await
            .map_err(|_| WsPlexError::Internal("sync worker dropped the call".into()))?
    }
}

fn worker<C: SyncConsumer>(mut consumer: C, mut rx: mpsc::UnboundedReceiver<Call>) {
    while let Some(call) = rx.blocking_recv() {
        match call {
            Call::Connect(ctx, reply) => {
                let _ = reply.send(consumer.connect(&ctx));
            }
            Call::Receive(ctx, frame, reply) => {
                let _ = reply.send(consumer.receive(&ctx, frame));
            }
            Call::Group(ctx, msg, reply) => {
                let _ = reply.send(consumer.group_message(&ctx, msg));
            }
            Call::Disconnect(ctx, code, reply) => {
                let _ = reply.send(consumer.disconnect(&ctx, code));
            }
        }
    }
}

#[async_trait]
impl HookExecutor for BlockingExecutor {
    async fn connect(&mut self, ctx: &Context) -> Result<ConnectOutcome> {
        let sctx = self.sync_ctx(ctx);
        self.call(|reply| Call::Connect(sctx, reply)).await
    }
    async fn receive(&mut self, ctx: &Context, frame: Frame) -> Result<()> {
        let sctx = self.sync_ctx(ctx);
        self.call(|reply| Call::Receive(sctx, frame, reply)).await
    }
    async fn group_message(&mut self, ctx: &Context, msg: GroupMessage) -> Result<()> {
        let sctx = self.sync_ctx(ctx);
        self.call(|reply| Call::Group(sctx, msg, reply)).await
    }
    async fn disconnect(&mut self, ctx: &Context, code: u16) -> Result<()> {
        let sctx = self.sync_ctx(ctx);
        self.call(|reply| Call::Disconnect(sctx, code, reply)).await
    }
}
