use std::sync::Arc;

use async_trait::async_trait;

use wsplex_core::codec::JsonCodec;
use wsplex_core::error::{Result, WsPlexError};
use wsplex_core::protocol::envelope::Envelope;
use wsplex_core::protocol::event::{Frame, OutboundEvent};

use crate::consumer::Outbound;

/// Outbound side of one demultiplexed stream.
///
/// Text sends are decoded, wrapped as `{"stream", "payload"}` and forwarded to
/// the physical connection. `accept` and `close` stay local to the stream.
pub struct StreamSink {
    stream: Arc<str>,
    parent: Arc<dyn Outbound>,
    codec: Arc<dyn JsonCodec>,
}

impl StreamSink {
    pub fn new(stream: &str, parent: Arc<dyn Outbound>, codec: Arc<dyn JsonCodec>) -> Self {
        Self {
            stream: Arc::from(stream),
            parent,
            codec,
        }
    }
}

#[async_trait]
impl Outbound for StreamSink {
    async fn emit(&self, event: OutboundEvent) -> Result<()> {
        match event {
            OutboundEvent::Accept => Ok(()),
            OutboundEvent::Close { code } => {
                tracing::debug!(stream = %self.stream, ?code, "stream close kept off the socket");
                Ok(())
            }
            OutboundEvent::Send(Frame::Text(text)) => {
                let payload = self.codec.decode(&text)?;
                let wrapped = Envelope::new(self.stream.as_ref(), payload).into_value();
                let text = self.codec.encode(&wrapped)?;
                self.parent.emit(OutboundEvent::Send(Frame::Text(text))).await
            }
            OutboundEvent::Send(Frame::Bytes(_)) => Err(WsPlexError::Protocol(format!(
                "binary frames cannot be multiplexed (stream {})",
                self.stream
            ))),
        }
    }
}
