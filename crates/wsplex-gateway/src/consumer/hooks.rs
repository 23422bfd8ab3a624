//! Application hook traits.
//!
//! `Consumer` is the native async convention, `SyncConsumer` the blocking one.
//! The JSON flavours receive decoded content instead of raw frames; wrap them
//! in [`Json`] / [`SyncJson`] to get a plain consumer.

use async_trait::async_trait;
use serde_json::Value;

use wsplex_core::error::{Result, WsPlexError};
use wsplex_core::protocol::event::Frame;

use crate::consumer::context::{Context, SyncContext};
use crate::layer::GroupMessage;

pub const NO_TEXT_SECTION: &str = "no text section for incoming frame";

/// Decision returned by a connect hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectOutcome {
    /// Emit `accept`.
    Accept,
    /// Emit `close`; the connection never opens.
    Deny,
    /// Emit nothing: the hook already called `accept`/`close` on the context.
    Continue,
}

#[async_trait]
pub trait Consumer: Send + 'static {
    async fn connect(&mut self, _ctx: &Context) -> Result<ConnectOutcome> {
        Ok(ConnectOutcome::Accept)
    }

    async fn receive(&mut self, _ctx: &Context, _frame: Frame) -> Result<()> {
        Ok(())
    }

    async fn group_message(&mut self, _ctx: &Context, _msg: GroupMessage) -> Result<()> {
        Ok(())
    }

    async fn disconnect(&mut self, _ctx: &Context, _code: u16) -> Result<()> {
        Ok(())
    }
}

pub trait SyncConsumer: Send + 'static {
    fn connect(&mut self, _ctx: &SyncContext) -> Result<ConnectOutcome> {
        Ok(ConnectOutcome::Accept)
    }

    fn receive(&mut self, _ctx: &SyncContext, _frame: Frame) -> Result<()> {
        Ok(())
    }

    fn group_message(&mut self, _ctx: &SyncContext, _msg: GroupMessage) -> Result<()> {
        Ok(())
    }

    fn disconnect(&mut self, _ctx: &SyncContext, _code: u16) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
pub trait JsonConsumer: Send + 'static {
    async fn connect(&mut self, _ctx: &Context) -> Result<ConnectOutcome> {
        Ok(ConnectOutcome::Accept)
    }

    async fn receive_json(&mut self, _ctx: &Context, _content: Value) -> Result<()> {
        Ok(())
    }

    async fn group_message(&mut self, _ctx: &Context, _msg: GroupMessage) -> Result<()> {
        Ok(())
    }

    async fn disconnect(&mut self, _ctx: &Context, _code: u16) -> Result<()> {
        Ok(())
    }
}

pub trait SyncJsonConsumer: Send + 'static {
    fn connect(&mut self, _ctx: &SyncContext) -> Result<ConnectOutcome> {
        Ok(ConnectOutcome::Accept)
    }

    fn receive_json(&mut self, _ctx: &SyncContext, _content: Value) -> Result<()> {
        Ok(())
    }

    fn group_message(&mut self, _ctx: &SyncContext, _msg: GroupMessage) -> Result<()> {
        Ok(())
    }

    fn disconnect(&mut self, _ctx: &SyncContext, _code: u16) -> Result<()> {
        Ok(())
    }
}

/// Text payload of a JSON frame. Binary and empty frames have no text section.
pub(crate) fn text_section(frame: Frame) -> Result<String> {
    match frame {
        Frame::Text(text) if !text.is_empty() => Ok(text),
        _ => Err(WsPlexError::Protocol(NO_TEXT_SECTION.into())),
    }
}

/// Adapts a [`JsonConsumer`] to [`Consumer`].
pub struct Json<C>(pub C);

#[async_trait]
impl<C: JsonConsumer> Consumer for Json<C> {
    async fn connect(&mut self, ctx: &Context) -> Result<ConnectOutcome> {
        self.0.connect(ctx).await
    }

    async fn receive(&mut self, ctx: &Context, frame: Frame) -> Result<()> {
        let text = text_section(frame)?;
        let content = ctx.codec().decode(&text)?;
        self.0.receive_json(ctx, content).await
    }

    async fn group_message(&mut self, ctx: &Context, msg: GroupMessage) -> Result<()> {
        self.0.group_message(ctx, msg).await
    }

    async fn disconnect(&mut self, ctx: &Context, code: u16) -> Result<()> {
        self.0.disconnect(ctx, code).await
    }
}

/// Adapts a [`SyncJsonConsumer`] to [`SyncConsumer`].
pub struct SyncJson<C>(pub C);

impl<C: SyncJsonConsumer> SyncConsumer for SyncJson<C> {
    fn connect(&mut self, ctx: &SyncContext) -> Result<ConnectOutcome> {
        self.0.connect(ctx)
    }

    fn receive(&mut self, ctx: &SyncContext, frame: Frame) -> Result<()> {
        let text = text_section(frame)?;
        let content = ctx.codec().decode(&text)?;
        self.0.receive_json(ctx, content)
    }

    fn group_message(&mut self, ctx: &SyncContext, msg: GroupMessage) -> Result<()> {
        self.0.group_message(ctx, msg)
    }

    fn disconnect(&mut self, ctx: &SyncContext, code: u16) -> Result<()> {
        self.0.disconnect(ctx, code)
    }
}

/// Consumer with every hook left at its default.
pub struct Passive;

impl Consumer for Passive {}
