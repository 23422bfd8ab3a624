use serde_json::Value;

use wsplex_core::error::Result;

use crate::consumer::{App, SyncContext, SyncJsonConsumer};

/// Blocking JSON echo.
#[derive(Default)]
pub struct EchoConsumer {
    seen: u64,
}

impl EchoConsumer {
    pub fn app() -> App {
        App::sync_json(EchoConsumer::default)
    }
}

impl SyncJsonConsumer for EchoConsumer {
    fn receive_json(&mut self, ctx: &SyncContext, content: Value) -> Result<()> {
        self.seen += 1;
        ctx.send_json(&content, None)
    }

    fn disconnect(&mut self, ctx: &SyncContext, code: u16) -> Result<()> {
        tracing::debug!(channel = %ctx.channel_name(), code, seen = self.seen, "echo closed");
        Ok(())
    }
}
