//! Hook-facing connection handle.
//!
//! `Context` is cheap to clone (one `Arc`) and is what application hooks use
//! to accept, send, close and talk to groups. `SyncContext` is the same handle
//! for blocking hooks: every operation is bridged into the runtime with
//! `Handle::block_on`, so the sync and async conventions share one
//! implementation of each operation.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use serde_json::Value;
use tokio::runtime::Handle;

use wsplex_core::codec::JsonCodec;
use wsplex_core::error::{Result, WsPlexError};
use wsplex_core::protocol::event::{Frame, OutboundEvent};
use wsplex_core::scope::Scope;

use crate::consumer::sink::Outbound;
use crate::layer::{ChannelLayer, GroupMessage};

pub(crate) const UNSUPPORTED_GROUPS: &str = "channel layer unconfigured or doesn't support groups";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ConnectionState {
    Init = 0,
    Connecting = 1,
    Open = 2,
    Closing = 3,
    Closed = 4,
}

impl ConnectionState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => ConnectionState::Init,
            1 => ConnectionState::Connecting,
            2 => ConnectionState::Open,
            3 => ConnectionState::Closing,
            _ => ConnectionState::Closed,
        }
    }
}

/// How to close.
///
/// `Implied` is what `send(.., close)` asks for when the caller wants the
/// socket closed but gave no code; it renders as a bare close like
/// `Unspecified`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseCode {
    Unspecified,
    Implied,
    Code(u16),
}

impl CloseCode {
    pub fn code(self) -> Option<u16> {
        match self {
            CloseCode::Unspecified | CloseCode::Implied => None,
            CloseCode::Code(c) => Some(c),
        }
    }
}

impl From<u16> for CloseCode {
    fn from(code: u16) -> Self {
        CloseCode::Code(code)
    }
}

#[derive(Clone)]
pub struct Context {
    inner: Arc<ContextInner>,
}

struct ContextInner {
    scope: Scope,
    channel_name: String,
    layer: Option<Arc<dyn ChannelLayer>>,
    outbound: Arc<dyn Outbound>,
    codec: Arc<dyn JsonCodec>,
    state: AtomicU8,
}

impl Context {
    pub fn new(
        scope: Scope,
        channel_name: String,
        layer: Option<Arc<dyn ChannelLayer>>,
        outbound: Arc<dyn Outbound>,
        codec: Arc<dyn JsonCodec>,
    ) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                scope,
                channel_name,
                layer,
                outbound,
                codec,
                state: AtomicU8::new(ConnectionState::Init as u8),
            }),
        }
    }

    pub fn scope(&self) -> &Scope { &self.inner.scope }
    pub fn channel_name(&self) -> &str { &self.inner.channel_name }
    pub fn codec(&self) -> &Arc<dyn JsonCodec> { &self.inner.codec }
    pub fn outbound(&self) -> &Arc<dyn Outbound> { &self.inner.outbound }
    pub fn layer_opt(&self) -> Option<&Arc<dyn ChannelLayer>> { self.inner.layer.as_ref() }

    pub fn state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.inner.state.load(Ordering::Acquire))
    }

    pub(crate) fn set_state(&self, state: ConnectionState) {
        self.inner.state.store(state as u8, Ordering::Release);
    }

    /// Channel layer, or a configuration error if none is installed.
    pub fn layer(&self) -> Result<&Arc<dyn ChannelLayer>> {
        self.inner
            .layer
            .as_ref()
            .ok_or_else(|| WsPlexError::Configuration(UNSUPPORTED_GROUPS.into()))
    }

    /// Accept the socket. Only valid while the connect hook is deciding.
    pub async fn accept(&self) -> Result<()> {
        let state = self.state();
        if state != ConnectionState::Connecting {
            return Err(WsPlexError::InvalidArgument(format!(
                "cannot accept a connection in state {state:?}"
            )));
        }
        self.inner.outbound.emit(OutboundEvent::Accept).await?;
        self.set_state(ConnectionState::Open);
        Ok(())
    }

    /// Send one frame; `text` wins if both are given. `close` closes right after.
    pub async fn send(
        &self,
        text: Option<String>,
        bytes: Option<Bytes>,
        close: Option<CloseCode>,
    ) -> Result<()> {
        let frame = match (text, bytes) {
            (Some(t), _) => Frame::Text(t),
            (None, Some(b)) => Frame::Bytes(b),
            (None, None) => {
                return Err(WsPlexError::InvalidArgument(
                    "you must pass one of bytes_data or text_data".into(),
                ))
            }
        };
        let state = self.state();
        if state != ConnectionState::Open {
            return Err(WsPlexError::InvalidArgument(format!(
                "cannot send on a connection in state {state:?}"
            )));
        }
        self.inner.outbound.emit(OutboundEvent::Send(frame)).await?;
        if let Some(code) = close {
            self.close(code).await?;
        }
        Ok(())
    }

    pub async fn send_text(&self, text: impl Into<String> + Send) -> Result<()> {
        self.send(Some(text.into()), None, None).await
    }

    pub async fn send_bytes(&self, bytes: impl Into<Bytes> + Send) -> Result<()> {
        self.send(None, Some(bytes.into()), None).await
    }

    pub async fn send_json(&self, content: &Value, close: Option<CloseCode>) -> Result<()> {
        let text = self.inner.codec.encode(content)?;
        self.send(Some(text), None, close).await
    }

    /// Close from the server side. Closing twice is a no-op.
    pub async fn close(&self, code: CloseCode) -> Result<()> {
        let next = match self.state() {
            ConnectionState::Connecting => ConnectionState::Closed,
            ConnectionState::Open => ConnectionState::Closing,
            state => {
                tracing::debug!(channel = %self.channel_name(), ?state, "close ignored");
                return Ok(());
            }
        };
        self.inner
            .outbound
            .emit(OutboundEvent::Close { code: code.code() })
            .await?;
        self.set_state(next);
        Ok(())
    }

    pub async fn group_add(&self, group: &str) -> Result<()> {
        self.layer()?.group_add(group, self.channel_name()).await
    }

    pub async fn group_discard(&self, group: &str) -> Result<()> {
        self.layer()?.group_discard(group, self.channel_name()).await
    }

    pub async fn group_send(&self, group: &str, msg: GroupMessage) -> Result<()> {
        self.layer()?.group_send(group, msg).await
    }
}

/// Blocking view of a [`Context`] for hooks running on a sync worker.
#[derive(Clone)]
pub struct SyncContext {
    ctx: Context,
    handle: Handle,
}

impl SyncContext {
    pub(crate) fn new(ctx: Context, handle: Handle) -> Self {
        Self { ctx, handle }
    }

    pub fn scope(&self) -> &Scope { self.ctx.scope() }
    pub fn channel_name(&self) -> &str { self.ctx.channel_name() }
    pub fn state(&self) -> ConnectionState { self.ctx.state() }
    pub fn codec(&self) -> &Arc<dyn JsonCodec> { self.ctx.codec() }

    pub fn accept(&self) -> Result<()> {
        self.handle.block_on(self.ctx.accept())
    }

    pub fn send(&self, text: Option<String>, bytes: Option<Bytes>, close: Option<CloseCode>) -> Result<()> {
        self.handle.block_on(self.ctx.send(text, bytes, close))
    }

    pub fn send_text(&self, text: impl Into<String>) -> Result<()> {
        self.send(Some(text.into()), None, None)
    }

    pub fn send_bytes(&self, bytes: impl Into<Bytes>) -> Result<()> {
        self.send(None, Some(bytes.into()), None)
    }

    pub fn send_json(&self, content: &Value, close: Option<CloseCode>) -> Result<()> {
        self.handle.block_on(self.ctx.send_json(content, close))
    }

    pub fn close(&self, code: CloseCode) -> Result<()> {
        self.handle.block_on(self.ctx.close(code))
    }

    pub fn group_add(&self, group: &str) -> Result<()> {
        self.handle.block_on(self.ctx.group_add(group))
    }

    pub fn group_discard(&self, group: &str) -> Result<()> {
        self.handle.block_on(self.ctx.group_discard(group))
    }

    pub fn group_send(&self, group: &str, msg: GroupMessage) -> Result<()> {
        self.handle.block_on(self.ctx.group_send(group, msg))
    }
}
