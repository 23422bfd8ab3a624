//! Driving loop: one task per consumer, events processed strictly in order.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use wsplex_core::error::{Result, WsPlexError};
use wsplex_core::protocol::event::InboundEvent;
use wsplex_core::scope::Scope;

use crate::consumer::app::App;
use crate::consumer::context::Context;
use crate::consumer::executor::HookExecutor;
use crate::consumer::lifecycle::{Flow, Lifecycle};
use crate::consumer::sink::Outbound;
use crate::layer::{ChannelLayer, GroupMessage};
use crate::obs::metrics;

/// Close code used when the event source vanishes without a disconnect.
pub const ABNORMAL_CLOSURE: u16 = 1006;

static LOCAL_SEQ: AtomicU64 = AtomicU64::new(1);

/// Everything needed to start one consumer.
pub struct Spawn {
    pub scope: Scope,
    pub layer: Option<Arc<dyn ChannelLayer>>,
    pub outbound: Arc<dyn Outbound>,
    /// Inbound queue depth.
    pub queue: usize,
    /// Channel name prefix (informational).
    pub prefix: &'static str,
}

/// A running consumer task and its inbound queue.
pub struct ConsumerHandle {
    channel_name: String,
    events: mpsc::Sender<InboundEvent>,
    task: JoinHandle<Result<()>>,
}

impl ConsumerHandle {
    pub fn channel_name(&self) -> &str {
        &self.channel_name
    }

    pub async fn send(&self, event: InboundEvent) -> Result<()> {
        self.events
            .send(event)
            .await
            .map_err(|_| WsPlexError::Internal(format!("consumer {} has stopped", self.channel_name)))
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Close the inbound queue and wait for the consumer task.
    ///
    /// A consumer that has not seen a disconnect gets one with code 1006.
    /// A panicked task maps to an internal error.
    pub async fn join(self) -> Result<()> {
        let ConsumerHandle { events, task, .. } = self;
        drop(events);
        match task.await {
            Ok(res) => res,
            Err(e) => Err(WsPlexError::Internal(format!("consumer task failed: {e}"))),
        }
    }
}

/// Instantiate `app` and start its driving task.
pub async fn spawn(app: &App, params: Spawn) -> Result<ConsumerHandle> {
    let (channel_name, inbox) = match &params.layer {
        Some(layer) => {
            let ch = layer.new_channel(params.prefix).await?;
            (ch.name, Some(ch.inbox))
        }
        None => (
            format!("{}.local{}", params.prefix, LOCAL_SEQ.fetch_add(1, Ordering::Relaxed)),
            None,
        ),
    };

    let hooks = match app.instantiate() {
        Ok(hooks) => hooks,
        Err(e) => {
            if let Some(layer) = &params.layer {
                layer.release(&channel_name).await;
            }
            return Err(e);
        }
    };

    let ctx = Context::new(
        params.scope,
        channel_name.clone(),
        params.layer,
        params.outbound,
        Arc::clone(app.config().codec()),
    );
    let lifecycle = Lifecycle::new(hooks, ctx, Arc::clone(app.config().groups()));

    let (events_tx, events_rx) = mpsc::channel(params.queue.max(1));
    let task = tokio::spawn(run(lifecycle, events_rx, inbox));

    Ok(ConsumerHandle {
        channel_name,
        events: events_tx,
        task,
    })
}

async fn run<H: HookExecutor>(
    mut lifecycle: Lifecycle<H>,
    mut events: mpsc::Receiver<InboundEvent>,
    mut inbox: Option<mpsc::Receiver<GroupMessage>>,
) -> Result<()> {
    let channel = lifecycle.context().channel_name().to_string();

    let result = loop {
        let step = tokio::select! {
            biased;
            ev = events.recv() => {
                let ev = ev.unwrap_or(InboundEvent::Disconnect { code: ABNORMAL_CLOSURE });
                lifecycle.handle(ev).await
            }
            Some(msg) = next_message(&mut inbox) => lifecycle.deliver(msg).await,
        };

        match step {
            Ok(Flow::Continue) => {}
            Ok(Flow::Stop) => {
                tracing::debug!(%channel, "consumer stopped");
                break Ok(());
            }
            Err(e) => {
                metrics::global()
                    .consumer_errors
                    .inc(&[("code", e.client_code().as_str())]);
                tracing::warn!(%channel, error = %e, code = e.client_code().as_str(), "consumer failed");
                lifecycle.abort(&e).await;
                break Err(e);
            }
        }
    };

    if let Some(layer) = lifecycle.context().layer_opt() {
        layer.release(&channel).await;
    }
    result
}

async fn next_message(inbox: &mut Option<mpsc::Receiver<GroupMessage>>) -> Option<GroupMessage> {
    match inbox {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
