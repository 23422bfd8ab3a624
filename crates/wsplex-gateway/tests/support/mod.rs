//! Shared helpers for gateway integration tests.

#![allow(dead_code)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use wsplex_core::error::{Result, WsPlexError};
use wsplex_core::protocol::event::{Frame, OutboundEvent};
use wsplex_core::scope::Scope;
use wsplex_gateway::layer::{Channel, ChannelLayer, GroupMessage, InMemoryLayer};
use wsplex_gateway::transport::MemoryConnection;

pub const WAIT: Duration = Duration::from_secs(2);

pub fn scope() -> Scope {
    Scope::websocket("/v1/ws", Vec::new(), Vec::new())
}

/// Next outbound event, failing the test if none arrives in time.
pub async fn next(conn: &mut MemoryConnection) -> OutboundEvent {
    conn.recv_timeout(WAIT).await.expect("expected an outbound event")
}

/// Assert nothing is emitted for a short while.
pub async fn quiet(conn: &mut MemoryConnection) {
    if let Some(ev) = conn.recv_timeout(Duration::from_millis(100)).await {
        panic!("unexpected outbound event: {ev:?}");
    }
}

pub fn text(s: &str) -> OutboundEvent {
    OutboundEvent::Send(Frame::Text(s.to_string()))
}

/// Decoded JSON of an outbound text frame.
pub fn json_of(ev: &OutboundEvent) -> Value {
    match ev {
        OutboundEvent::Send(Frame::Text(t)) => serde_json::from_str(t).unwrap(),
        other => panic!("expected a text send, got {other:?}"),
    }
}

/// Ordered log shared between test consumers and layers.
#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, entry: &str) -> usize {
        self.0.lock().unwrap().iter().filter(|e| *e == entry).count()
    }

    pub fn position(&self, entry: &str) -> Option<usize> {
        self.0.lock().unwrap().iter().position(|e| e == entry)
    }
}

/// In-memory layer that journals and counts group operations.
pub struct CountingLayer {
    inner: InMemoryLayer,
    pub journal: Journal,
    pub group_ops: AtomicUsize,
}

impl CountingLayer {
    pub fn new(journal: Journal) -> Self {
        Self {
            inner: InMemoryLayer::default(),
            journal,
            group_ops: AtomicUsize::new(0),
        }
    }

    pub fn ops(&self) -> usize {
        self.group_ops.load(Ordering::SeqCst)
    }

    pub fn members(&self, group: &str) -> Vec<String> {
        self.inner.members(group)
    }
}

#[async_trait]
impl ChannelLayer for CountingLayer {
    async fn new_channel(&self, prefix: &str) -> Result<Channel> {
        self.inner.new_channel(prefix).await
    }

    async fn send(&self, channel: &str, msg: GroupMessage) -> Result<()> {
        self.inner.send(channel, msg).await
    }

    async fn release(&self, channel: &str) {
        self.inner.release(channel).await
    }

    async fn group_add(&self, group: &str, channel: &str) -> Result<()> {
        self.group_ops.fetch_add(1, Ordering::SeqCst);
        self.journal.push(format!("add:{group}"));
        self.inner.group_add(group, channel).await
    }

    async fn group_discard(&self, group: &str, channel: &str) -> Result<()> {
        self.group_ops.fetch_add(1, Ordering::SeqCst);
        self.journal.push(format!("discard:{group}"));
        self.inner.group_discard(group, channel).await
    }

    async fn group_send(&self, group: &str, msg: GroupMessage) -> Result<()> {
        self.group_ops.fetch_add(1, Ordering::SeqCst);
        self.inner.group_send(group, msg).await
    }
}

/// Point-to-point only: keeps the default group methods.
#[derive(Default)]
pub struct PointToPointLayer {
    inner: InMemoryLayer,
}

#[async_trait]
impl ChannelLayer for PointToPointLayer {
    async fn new_channel(&self, prefix: &str) -> Result<Channel> {
        self.inner.new_channel(prefix).await
    }

    async fn send(&self, channel: &str, msg: GroupMessage) -> Result<()> {
        self.inner.send(channel, msg).await
    }

    async fn release(&self, channel: &str) {
        self.inner.release(channel).await
    }
}

/// Supports groups, but every group operation fails at the backend.
#[derive(Default)]
pub struct FlakyLayer {
    inner: InMemoryLayer,
}

#[async_trait]
impl ChannelLayer for FlakyLayer {
    async fn new_channel(&self, prefix: &str) -> Result<Channel> {
        self.inner.new_channel(prefix).await
    }

    async fn send(&self, channel: &str, msg: GroupMessage) -> Result<()> {
        self.inner.send(channel, msg).await
    }

    async fn release(&self, channel: &str) {
        self.inner.release(channel).await
    }

    async fn group_add(&self, _group: &str, _channel: &str) -> Result<()> {
        Err(WsPlexError::Layer("backend unavailable".into()))
    }

    async fn group_discard(&self, _group: &str, _channel: &str) -> Result<()> {
        Err(WsPlexError::Layer("backend unavailable".into()))
    }
}
