use async_trait::async_trait;
use tokio::sync::mpsc;

use wsplex_core::error::{Result, WsPlexError};
use wsplex_core::protocol::event::OutboundEvent;

/// Where a consumer's outbound events go.
///
/// A physical connection writes straight into its transport queue; a
/// demultiplexed stream writes into a sink that re-wraps and forwards to the
/// parent's sink.
#[async_trait]
pub trait Outbound: Send + Sync {
    async fn emit(&self, event: OutboundEvent) -> Result<()>;
}

/// Outbound queue read by a transport writer.
#[derive(Clone)]
pub struct TransportSink {
    tx: mpsc::Sender<OutboundEvent>,
}

impl TransportSink {
    pub fn new(tx: mpsc::Sender<OutboundEvent>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl Outbound for TransportSink {
    async fn emit(&self, event: OutboundEvent) -> Result<()> {
        self.tx
            .send(event)
            .await
            .map_err(|_| WsPlexError::Internal("outbound channel closed".into()))
    }
}
