//! Shared error type across wsPlex crates.

use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Caller misuse of an API (e.g. sending with no payload).
    InvalidArgument,
    /// Missing or unusable server configuration.
    Configuration,
    /// Peer violated the framing protocol.
    ProtocolError,
    /// Text frame was not valid JSON.
    DecodeError,
    /// Auth failed.
    AuthFailed,
    /// Unsupported config/protocol version.
    UnsupportedVersion,
    /// Internal server error.
    Internal,
}

impl ClientCode {
    /// String representation used in JSON responses and metric labels.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::InvalidArgument => "INVALID_ARGUMENT",
            ClientCode::Configuration => "CONFIGURATION",
            ClientCode::ProtocolError => "PROTOCOL_ERROR",
            ClientCode::DecodeError => "DECODE_ERROR",
            ClientCode::AuthFailed => "AUTH_FAILED",
            ClientCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ClientCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, WsPlexError>;

/// Unified error type used by core and gateway.
#[derive(Debug, Error)]
pub enum WsPlexError {
    /// Application bug at a call site; never retried.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// Setup cannot proceed (missing session, unusable channel layer, bad config).
    #[error("configuration error: {0}")]
    Configuration(String),
    /// The peer broke the framing rules; the affected (sub-)connection is torn down.
    #[error("protocol error: {0}")]
    Protocol(String),
    #[error("decode error: {0}")]
    Decode(String),
    /// Raised by channel layers that implement point-to-point delivery only.
    #[error("channel layer does not support groups")]
    GroupsUnsupported,
    #[error("channel layer: {0}")]
    Layer(String),
    #[error("auth failed")]
    AuthFailed,
    #[error("unsupported version")]
    UnsupportedVersion,
    #[error("internal: {0}")]
    Internal(String),
}

impl WsPlexError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            WsPlexError::InvalidArgument(_) => ClientCode::InvalidArgument,
            WsPlexError::Configuration(_) | WsPlexError::GroupsUnsupported => {
                ClientCode::Configuration
            }
            WsPlexError::Protocol(_) => ClientCode::ProtocolError,
            WsPlexError::Decode(_) => ClientCode::DecodeError,
            WsPlexError::AuthFailed => ClientCode::AuthFailed,
            WsPlexError::UnsupportedVersion => ClientCode::UnsupportedVersion,
            WsPlexError::Layer(_) | WsPlexError::Internal(_) => ClientCode::Internal,
        }
    }

    /// WebSocket close code used when this error tears a connection down.
    ///
    /// 1002 protocol error, 1003 unsupported data, 1011 internal error.
    pub fn close_code(&self) -> u16 {
        match self {
            WsPlexError::Protocol(_) => 1002,
            WsPlexError::Decode(_) => 1003,
            _ => 1011,
        }
    }
}

