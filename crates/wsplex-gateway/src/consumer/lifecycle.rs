//! Connection lifecycle state machine.
//!
//! `Init -> Connecting -> Open -> Closing -> Closed`. Written once over a
//! [`HookExecutor`], so async, blocking and demultiplexing consumers share
//! every transition.

use std::sync::Arc;
use std::time::Instant;

use wsplex_core::error::{Result, WsPlexError};
use wsplex_core::protocol::event::{Frame, InboundEvent, OutboundEvent};

use crate::consumer::context::{CloseCode, ConnectionState, Context};
use crate::consumer::executor::HookExecutor;
use crate::consumer::groups;
use crate::consumer::hooks::ConnectOutcome;
use crate::layer::GroupMessage;
use crate::obs::metrics;

/// What the driving loop should do after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// Disconnect has been fully processed; drop the consumer.
    Stop,
}

pub struct Lifecycle<H> {
    hooks: H,
    ctx: Context,
    groups: Arc<[String]>,
    stopped: bool,
}

impl<H: HookExecutor> Lifecycle<H> {
    pub fn new(hooks: H, ctx: Context, groups: Arc<[String]>) -> Self {
        Self {
            hooks,
            ctx,
            groups,
            stopped: false,
        }
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn state(&self) -> ConnectionState {
        self.ctx.state()
    }

    pub async fn handle(&mut self, event: InboundEvent) -> Result<Flow> {
        if self.stopped {
            tracing::debug!(channel = %self.ctx.channel_name(), kind = event.kind(), "event after stop ignored");
            return Ok(Flow::Stop);
        }
        match event {
            InboundEvent::Connect => self.on_connect().await,
            InboundEvent::Receive(frame) => self.on_receive(frame).await,
            InboundEvent::Disconnect { code } => self.on_disconnect(code).await,
        }
    }

    /// Hand a channel-layer message to the application.
    pub async fn deliver(&mut self, msg: GroupMessage) -> Result<Flow> {
        if self.stopped {
            return Ok(Flow::Stop);
        }
        match self.ctx.state() {
            ConnectionState::Open | ConnectionState::Closing => {
                let started = Instant::now();
                let res = self.hooks.group_message(&self.ctx, msg).await;
                observe("group_message", started);
                res.map(|()| Flow::Continue)
            }
            state => {
                tracing::debug!(channel = %self.ctx.channel_name(), ?state, kind = %msg.kind, "group message before open dropped");
                Ok(Flow::Continue)
            }
        }
    }

    async fn on_connect(&mut self) -> Result<Flow> {
        let state = self.ctx.state();
        if state != ConnectionState::Init {
            return Err(WsPlexError::Protocol(format!("connect received in state {state:?}")));
        }
        groups::join(&self.ctx, &self.groups).await?;
        self.ctx.set_state(ConnectionState::Connecting);

        let started = Instant::now();
        let outcome = self.hooks.connect(&self.ctx).await;
        observe("connect", started);

        match outcome? {
            ConnectOutcome::Accept => {
                // The hook may already have accepted through the context.
                if self.ctx.state() == ConnectionState::Connecting {
                    self.ctx.accept().await?;
                }
            }
            ConnectOutcome::Deny => self.ctx.close(CloseCode::Unspecified).await?,
            ConnectOutcome::Continue => {}
        }
        Ok(Flow::Continue)
    }

    async fn on_receive(&mut self, frame: Frame) -> Result<Flow> {
        match self.ctx.state() {
            ConnectionState::Open | ConnectionState::Closing => {
                let started = Instant::now();
                let res = self.hooks.receive(&self.ctx, frame).await;
                observe("receive", started);
                res.map(|()| Flow::Continue)
            }
            ConnectionState::Closed => {
                tracing::debug!(channel = %self.ctx.channel_name(), "frame on closed connection dropped");
                Ok(Flow::Continue)
            }
            ConnectionState::Init | ConnectionState::Connecting => Err(WsPlexError::Protocol(
                "frame received before the connection was accepted".into(),
            )),
        }
    }

    async fn on_disconnect(&mut self, code: u16) -> Result<Flow> {
        self.ctx.set_state(ConnectionState::Closed);
        self.hooks.before_disconnect(&self.ctx, code).await?;
        groups::leave(&self.ctx, &self.groups).await?;

        let started = Instant::now();
        let res = self.hooks.disconnect(&self.ctx, code).await;
        observe("disconnect", started);
        res?;

        self.stopped = true;
        Ok(Flow::Stop)
    }

    /// Best-effort teardown after a hook or protocol failure.
    ///
    /// Leaves groups (ignoring errors) and, if the peer is still attached,
    /// closes with the error's close code.
    pub async fn abort(&mut self, err: &WsPlexError) {
        if self.stopped {
            return;
        }
        self.stopped = true;

        if let Some(layer) = self.ctx.layer_opt() {
            for group in self.groups.iter() {
                let _ = layer.group_discard(group, self.ctx.channel_name()).await;
            }
        }

        let attached = matches!(
            self.ctx.state(),
            ConnectionState::Init | ConnectionState::Connecting | ConnectionState::Open
        );
        self.ctx.set_state(ConnectionState::Closed);
        if attached {
            let close = OutboundEvent::Close { code: Some(err.close_code()) };
            if let Err(e) = self.ctx.outbound().emit(close).await {
                tracing::debug!(channel = %self.ctx.channel_name(), error = %e, "close after failure not delivered");
            }
        }
    }
}

fn observe(hook: &str, started: Instant) {
    metrics::global()
        .hook_duration
        .observe(&[("hook", hook)], started.elapsed());
}
