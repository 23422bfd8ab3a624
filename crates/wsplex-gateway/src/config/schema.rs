use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;
use wsplex_core::error::{Result, WsPlexError};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    pub version: u32,

    #[serde(default)]
    pub gateway: GatewaySection,

    #[serde(default)]
    pub consumer: ConsumerSection,

    #[serde(default)]
    pub layer: LayerSection,

    #[serde(default)]
    pub auth: AuthSection,
}

impl GatewayConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(WsPlexError::UnsupportedVersion);
        }
        self.gateway.validate()?;
        self.consumer.validate()?;
        self.layer.validate()?;
        self.auth.validate()?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewaySection {
    #[serde(default = "default_listen")]
    pub listen: String,

    #[serde(default = "default_ping_interval_ms")]
    pub ping_interval_ms: u64,

    #[serde(default = "default_idle_timeout_ms")]
    pub idle_timeout_ms: u64,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            ping_interval_ms: default_ping_interval_ms(),
            idle_timeout_ms: default_idle_timeout_ms(),
        }
    }
}

impl GatewaySection {
    pub fn validate(&self) -> Result<()> {
        if !(1000..=120_000).contains(&self.ping_interval_ms) {
            return Err(invalid("gateway.ping_interval_ms must be between 1000 and 120000"));
        }
        if !(2000..=600_000).contains(&self.idle_timeout_ms) {
            return Err(invalid("gateway.idle_timeout_ms must be between 2000 and 600000"));
        }
        if self.idle_timeout_ms <= self.ping_interval_ms {
            return Err(invalid("gateway.idle_timeout_ms must be greater than ping_interval_ms"));
        }
        Ok(())
    }

    pub fn ping_interval(&self) -> Duration {
        Duration::from_millis(self.ping_interval_ms)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConsumerSection {
    /// How long a demultiplexer waits for its streams after a disconnect.
    #[serde(default = "default_close_timeout_ms")]
    pub close_timeout_ms: u64,

    #[serde(default = "default_queue")]
    pub inbound_queue: usize,

    #[serde(default = "default_queue")]
    pub outbound_queue: usize,
}

impl Default for ConsumerSection {
    fn default() -> Self {
        Self {
            close_timeout_ms: default_close_timeout_ms(),
            inbound_queue: default_queue(),
            outbound_queue: default_queue(),
        }
    }
}

impl ConsumerSection {
    pub fn validate(&self) -> Result<()> {
        if !(10..=60_000).contains(&self.close_timeout_ms) {
            return Err(invalid("consumer.close_timeout_ms must be between 10 and 60000"));
        }
        if !(1..=65_536).contains(&self.inbound_queue) {
            return Err(invalid("consumer.inbound_queue must be between 1 and 65536"));
        }
        if !(1..=65_536).contains(&self.outbound_queue) {
            return Err(invalid("consumer.outbound_queue must be between 1 and 65536"));
        }
        Ok(())
    }

    pub fn close_timeout(&self) -> Duration {
        Duration::from_millis(self.close_timeout_ms)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayerSection {
    /// Inbox capacity of every channel created by the in-memory layer.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for LayerSection {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
        }
    }
}

impl LayerSection {
    pub fn validate(&self) -> Result<()> {
        if !(1..=65_536).contains(&self.channel_capacity) {
            return Err(invalid("layer.channel_capacity must be between 1 and 65536"));
        }
        Ok(())
    }
}

/// Static session key -> user id table.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthSection {
    #[serde(default)]
    pub sessions: BTreeMap<String, String>,
}

impl AuthSection {
    pub fn validate(&self) -> Result<()> {
        for (key, user) in &self.sessions {
            if key.is_empty() || user.is_empty() {
                return Err(invalid("auth.sessions entries must have non-empty keys and user ids"));
            }
        }
        Ok(())
    }
}

fn invalid(msg: &str) -> WsPlexError {
    WsPlexError::Configuration(msg.into())
}

fn default_listen() -> String {
    "0.0.0.0:8080".into()
}
fn default_ping_interval_ms() -> u64 {
    20000
}
fn default_idle_timeout_ms() -> u64 {
    60000
}
fn default_close_timeout_ms() -> u64 {
    5000
}
fn default_queue() -> usize {
    64
}
fn default_channel_capacity() -> usize {
    100
}
