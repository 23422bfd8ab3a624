//! JSON codec for text frames.
//!
//! Binary frames are never interpreted here; JSON consumers reject them before
//! reaching the codec.

use serde_json::Value;

use crate::error::{Result, WsPlexError};

/// Text <-> JSON conversion used by JSON consumers and the demultiplexer.
///
/// Implementations must be pure: `decode(encode(v))` structurally equals `v`.
pub trait JsonCodec: Send + Sync {
    fn decode(&self, text: &str) -> Result<Value>;
    fn encode(&self, value: &Value) -> Result<String>;
}

/// Compact `serde_json` codec (no whitespace between tokens).
#[derive(Debug, Default, Clone, Copy)]
pub struct SerdeJsonCodec;

impl JsonCodec for SerdeJsonCodec {
    fn decode(&self, text: &str) -> Result<Value> {
        serde_json::from_str(text).map_err(|e| WsPlexError::Decode(format!("invalid json: {e}")))
    }

    fn encode(&self, value: &Value) -> Result<String> {
        serde_json::to_string(value)
            .map_err(|e| WsPlexError::Internal(format!("json encode failed: {e}")))
    }
}

/// Decode with the default codec.
pub fn decode(text: &str) -> Result<Value> {
    SerdeJsonCodec.decode(text)
}

/// Encode with the default codec.
pub fn encode(value: &Value) -> Result<String> {
    SerdeJsonCodec.encode(value)
}
