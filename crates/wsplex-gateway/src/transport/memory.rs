//! In-process transport: events in and out over tokio channels.
//!
//! Used by the integration tests and by embedders that already own the
//! socket.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use serde_json::Value;
use tokio::sync::mpsc;

use wsplex_core::error::{Result, WsPlexError};
use wsplex_core::protocol::event::{Frame, InboundEvent, OutboundEvent};
use wsplex_core::scope::Scope;

use crate::consumer::{self, App, ConsumerHandle, Spawn, TransportSink};
use crate::layer::ChannelLayer;

const OUTBOUND_QUEUE: usize = 1024;

pub struct MemoryConnection {
    handle: ConsumerHandle,
    outbound: mpsc::Receiver<OutboundEvent>,
}

impl MemoryConnection {
    /// Spawn `app` without sending `connect`.
    pub async fn spawn(app: &App, scope: Scope, layer: Option<Arc<dyn ChannelLayer>>) -> Result<Self> {
        let (tx, outbound) = mpsc::channel(OUTBOUND_QUEUE);
        let handle = consumer::spawn(
            app,
            Spawn {
                scope,
                layer,
                outbound: Arc::new(TransportSink::new(tx)),
                queue: 64,
                prefix: "memory",
            },
        )
        .await?;
        Ok(Self { handle, outbound })
    }

    /// Spawn `app` and deliver `connect`.
    pub async fn open(app: &App, scope: Scope, layer: Option<Arc<dyn ChannelLayer>>) -> Result<Self> {
        let conn = Self::spawn(app, scope, layer).await?;
        conn.connect().await?;
        Ok(conn)
    }

    pub fn channel_name(&self) -> &str {
        self.handle.channel_name()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub async fn connect(&self) -> Result<()> {
        self.handle.send(InboundEvent::Connect).await
    }

    pub async fn send_text(&self, text: impl Into<String>) -> Result<()> {
        self.handle
            .send(InboundEvent::Receive(Frame::Text(text.into())))
            .await
    }

    pub async fn send_bytes(&self, bytes: impl Into<Bytes>) -> Result<()> {
        self.handle
            .send(InboundEvent::Receive(Frame::Bytes(bytes.into())))
            .await
    }

    pub async fn send_json(&self, value: &Value) -> Result<()> {
        let text = serde_json::to_string(value)
            .map_err(|e| WsPlexError::Internal(format!("encode failed: {e}")))?;
        self.send_text(text).await
    }

    pub async fn disconnect(&self, code: u16) -> Result<()> {
        self.handle.send(InboundEvent::Disconnect { code }).await
    }

    /// Next outbound event; `None` once the consumer is gone and the queue is
    /// drained.
    pub async fn recv(&mut self) -> Option<OutboundEvent> {
        self.outbound.recv().await
    }

    pub async fn recv_timeout(&mut self, timeout: Duration) -> Option<OutboundEvent> {
        tokio::time::timeout(timeout, self.outbound.recv())
            .await
            .ok()
            .flatten()
    }

    /// Wait for the consumer to finish and collect everything it emitted
    /// that has not been received yet.
    pub async fn finish(self) -> (Result<()>, Vec<OutboundEvent>) {
        let MemoryConnection { handle, mut outbound } = self;
        let res = handle.join().await;
        let mut rest = Vec::new();
        while let Ok(ev) = outbound.try_recv() {
            rest.push(ev);
        }
        (res, rest)
    }
}
