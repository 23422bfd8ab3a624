//! Transport event records.
//!
//! On the wire every event is a key/value record with a mandatory `type`
//! field. Inside the crate they are closed enums, so a receive/send carrying
//! both or neither of `text`/`bytes` cannot be represented.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::{Result, WsPlexError};

pub const CONNECT: &str = "websocket.connect";
pub const RECEIVE: &str = "websocket.receive";
pub const DISCONNECT: &str = "websocket.disconnect";
pub const ACCEPT: &str = "websocket.accept";
pub const SEND: &str = "websocket.send";
pub const CLOSE: &str = "websocket.close";

/// One data frame: text or binary, never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Bytes(Bytes),
}

impl Frame {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Frame::Text(s) => Some(s),
            Frame::Bytes(_) => None,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Frame::Text(s) => s.len(),
            Frame::Bytes(b) => b.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Events a transport delivers to a consumer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawEvent", into = "RawEvent")]
pub enum InboundEvent {
    Connect,
    Receive(Frame),
    Disconnect { code: u16 },
}

/// Events a consumer hands back to its transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawEvent", into = "RawEvent")]
pub enum OutboundEvent {
    Accept,
    Send(Frame),
    Close { code: Option<u16> },
}

impl InboundEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            InboundEvent::Connect => CONNECT,
            InboundEvent::Receive(_) => RECEIVE,
            InboundEvent::Disconnect { .. } => DISCONNECT,
        }
    }

    /// Parse a JSON event record.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        serde_json::from_value(value)
            .map_err(|e| WsPlexError::Protocol(format!("invalid inbound event: {e}")))
    }
}

impl OutboundEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            OutboundEvent::Accept => ACCEPT,
            OutboundEvent::Send(_) => SEND,
            OutboundEvent::Close { .. } => CLOSE,
        }
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        serde_json::from_value(value)
            .map_err(|e| WsPlexError::Protocol(format!("invalid outbound event: {e}")))
    }

    pub fn to_value(&self) -> Result<serde_json::Value> {
        serde_json::to_value(self)
            .map_err(|e| WsPlexError::Internal(format!("event encode failed: {e}")))
    }
}

/// Flat wire shape shared by every event variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawEvent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    bytes: Option<Bytes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    code: Option<u16>,
}

impl RawEvent {
    fn bare(kind: &str) -> Self {
        Self {
            kind: kind.to_string(),
            text: None,
            bytes: None,
            code: None,
        }
    }

    fn with_frame(kind: &str, frame: Frame) -> Self {
        let mut raw = Self::bare(kind);
        match frame {
            Frame::Text(s) => raw.text = Some(s),
            Frame::Bytes(b) => raw.bytes = Some(b),
        }
        raw
    }

    fn into_frame(self) -> std::result::Result<Frame, String> {
        match (self.text, self.bytes) {
            (Some(t), None) => Ok(Frame::Text(t)),
            (None, Some(b)) => Ok(Frame::Bytes(b)),
            (Some(_), Some(_)) => Err(format!("{} carries both text and bytes", self.kind)),
            (None, None) => Err(format!("{} carries neither text nor bytes", self.kind)),
        }
    }
}

impl TryFrom<RawEvent> for InboundEvent {
    type Error = String;

    fn try_from(raw: RawEvent) -> std::result::Result<Self, Self::Error> {
        match raw.kind.as_str() {
            CONNECT => Ok(InboundEvent::Connect),
            RECEIVE => raw.into_frame().map(InboundEvent::Receive),
            DISCONNECT => {
                let code = raw.code.ok_or_else(|| format!("{DISCONNECT} requires code"))?;
                Ok(InboundEvent::Disconnect { code })
            }
            other => Err(format!("unknown inbound event type: {other}")),
        }
    }
}

impl From<InboundEvent> for RawEvent {
    fn from(ev: InboundEvent) -> Self {
        match ev {
            InboundEvent::Connect => RawEvent::bare(CONNECT),
            InboundEvent::Receive(frame) => RawEvent::with_frame(RECEIVE, frame),
            InboundEvent::Disconnect { code } => RawEvent {
                code: Some(code),
                ..RawEvent::bare(DISCONNECT)
            },
        }
    }
}

impl TryFrom<RawEvent> for OutboundEvent {
    type Error = String;

    fn try_from(raw: RawEvent) -> std::result::Result<Self, Self::Error> {
        match raw.kind.as_str() {
            ACCEPT => Ok(OutboundEvent::Accept),
            SEND => raw.into_frame().map(OutboundEvent::Send),
            CLOSE => Ok(OutboundEvent::Close { code: raw.code }),
            other => Err(format!("unknown outbound event type: {other}")),
        }
    }
}

impl From<OutboundEvent> for RawEvent {
    fn from(ev: OutboundEvent) -> Self {
        match ev {
            OutboundEvent::Accept => RawEvent::bare(ACCEPT),
            OutboundEvent::Send(frame) => RawEvent::with_frame(SEND, frame),
            OutboundEvent::Close { code } => RawEvent {
                code,
                ..RawEvent::bare(CLOSE)
            },
        }
    }
}
