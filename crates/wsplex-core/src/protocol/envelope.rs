//! Multiplexing envelope (`{"stream": ..., "payload": ...}`).
//!
//! This is the only bit-exact format of the demultiplexer: both keys are
//! required, `stream` must be a string, `payload` may be any JSON value
//! (including `null`).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, WsPlexError};

pub const INVALID_FRAME: &str = "invalid multiplexed frame received";

/// One routed message on a multiplexed connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Logical stream name.
    pub stream: String,
    /// Application payload for that stream.
    pub payload: Value,
}

impl Envelope {
    pub fn new(stream: impl Into<String>, payload: Value) -> Self {
        Self {
            stream: stream.into(),
            payload,
        }
    }

    /// Validate a decoded frame as an envelope.
    ///
    /// Extra top-level keys are ignored; a missing `payload` key is an error
    /// even though `null` is an acceptable payload value.
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(mut map) = value else {
            return Err(WsPlexError::Protocol(format!("{INVALID_FRAME} (not an object)")));
        };
        let payload = map
            .remove("payload")
            .ok_or_else(|| WsPlexError::Protocol(format!("{INVALID_FRAME} (no payload key)")))?;
        let stream = match map.remove("stream") {
            Some(Value::String(s)) => s,
            Some(_) => {
                return Err(WsPlexError::Protocol(format!(
                    "{INVALID_FRAME} (stream must be a string)"
                )))
            }
            None => return Err(WsPlexError::Protocol(format!("{INVALID_FRAME} (no stream key)"))),
        };
        Ok(Self { stream, payload })
    }

    pub fn into_value(self) -> Value {
        let mut map = serde_json::Map::with_capacity(2);
        map.insert("stream".into(), Value::String(self.stream));
        map.insert("payload".into(), self.payload);
        Value::Object(map)
    }
}
