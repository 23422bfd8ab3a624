use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use tokio::sync::mpsc;

use wsplex_core::error::{Result, WsPlexError};

use super::{Channel, ChannelLayer, GroupMessage};

/// In-process channel layer.
///
/// - `channel -> inbox sender`
/// - `group -> {channel...}` and the reverse index `channel -> {group...}`
///
/// Group fan-out is lossy: a full inbox drops the message for that member.
pub struct InMemoryLayer {
    capacity: usize,
    channels: DashMap<String, mpsc::Sender<GroupMessage>>,
    group_to_channels: DashMap<String, DashSet<String>>,
    channel_to_groups: DashMap<String, DashSet<String>>,
    seq: AtomicU64,
}

impl InMemoryLayer {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            channels: DashMap::new(),
            group_to_channels: DashMap::new(),
            channel_to_groups: DashMap::new(),
            seq: AtomicU64::new(1),
        }
    }

    pub fn members(&self, group: &str) -> Vec<String> {
        self.group_to_channels
            .get(group)
            .map(|set| set.iter().map(|c| c.key().to_string()).collect())
            .unwrap_or_default()
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    fn remove_member(&self, group: &str, channel: &str) {
        if let Some(set) = self.group_to_channels.get(group) {
            set.remove(channel);
            if set.is_empty() {
                drop(set);
                self.group_to_channels.remove(group);
            }
        }
        if let Some(set) = self.channel_to_groups.get(channel) {
            set.remove(group);
            if set.is_empty() {
                drop(set);
                self.channel_to_groups.remove(channel);
            }
        }
    }
}

impl Default for InMemoryLayer {
    fn default() -> Self {
        Self::new(100)
    }
}

#[async_trait]
impl ChannelLayer for InMemoryLayer {
    async fn new_channel(&self, prefix: &str) -> Result<Channel> {
        let (tx, inbox) = mpsc::channel(self.capacity);
        let name = format!("{prefix}.{}", self.seq.fetch_add(1, Ordering::Relaxed));
        self.channels.insert(name.clone(), tx);
        Ok(Channel { name, inbox })
    }

    async fn send(&self, channel: &str, msg: GroupMessage) -> Result<()> {
        let tx = self
            .channels
            .get(channel)
            .map(|r| r.value().clone())
            .ok_or_else(|| WsPlexError::Layer(format!("unknown channel: {channel}")))?;
        tx.try_send(msg)
            .map_err(|e| WsPlexError::Layer(format!("channel {channel} unavailable: {e}")))
    }

    async fn release(&self, channel: &str) {
        self.channels.remove(channel);
        if let Some(groups) = self.channel_to_groups.remove(channel).map(|(_, v)| v) {
            for g in groups.iter() {
                if let Some(set) = self.group_to_channels.get(g.key()) {
                    set.remove(channel);
                    if set.is_empty() {
                        drop(set);
                        self.group_to_channels.remove(g.key());
                    }
                }
            }
        }
    }

    async fn group_add(&self, group: &str, channel: &str) -> Result<()> {
        self.group_to_channels
            .entry(group.to_string())
            .or_insert_with(DashSet::new)
            .insert(channel.to_string());

        self.channel_to_groups
            .entry(channel.to_string())
            .or_insert_with(DashSet::new)
            .insert(group.to_string());
        Ok(())
    }

    async fn group_discard(&self, group: &str, channel: &str) -> Result<()> {
        self.remove_member(group, channel);
        Ok(())
    }

    async fn group_send(&self, group: &str, msg: GroupMessage) -> Result<()> {
        for member in self.members(group) {
            let Some(tx) = self.channels.get(&member).map(|r| r.value().clone()) else {
                continue;
            };
            if tx.try_send(msg.clone()).is_err() {
                tracing::debug!(%group, channel = %member, "group message dropped");
            }
        }
        Ok(())
    }
}
