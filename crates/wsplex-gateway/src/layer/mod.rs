//! Channel layer contract (pub/sub backend).
//!
//! A channel layer hands out channel names (consumer identities) with an inbox,
//! delivers point-to-point messages, and optionally manages named groups.
//! Layers without group support keep the default group methods, which fail
//! with `WsPlexError::GroupsUnsupported`.

mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;

use wsplex_core::error::{Result, WsPlexError};

pub use memory::InMemoryLayer;

/// Message delivered through the layer to a consumer's `group_message` hook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupMessage {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub body: Value,
}

impl GroupMessage {
    pub fn new(kind: impl Into<String>, body: Value) -> Self {
        Self {
            kind: kind.into(),
            body,
        }
    }
}

/// A freshly allocated consumer identity and its inbox.
pub struct Channel {
    pub name: String,
    pub inbox: mpsc::Receiver<GroupMessage>,
}

#[async_trait]
pub trait ChannelLayer: Send + Sync {
    /// Allocate a unique channel name (prefix is informational).
    async fn new_channel(&self, prefix: &str) -> Result<Channel>;

    /// Deliver to one channel.
    async fn send(&self, channel: &str, msg: GroupMessage) -> Result<()>;

    /// Forget a channel and drop its inbox sender.
    async fn release(&self, channel: &str);

    async fn group_add(&self, _group: &str, _channel: &str) -> Result<()> {
        Err(WsPlexError::GroupsUnsupported)
    }

    async fn group_discard(&self, _group: &str, _channel: &str) -> Result<()> {
        Err(WsPlexError::GroupsUnsupported)
    }

    async fn group_send(&self, _group: &str, _msg: GroupMessage) -> Result<()> {
        Err(WsPlexError::GroupsUnsupported)
    }
}
