use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::FuturesUnordered;
use futures_util::StreamExt;
use serde_json::Value;
use tokio::time::{sleep_until, timeout_at, Instant};

use wsplex_core::error::{Result, WsPlexError};
use wsplex_core::protocol::envelope::Envelope;
use wsplex_core::protocol::event::{Frame, InboundEvent};

use crate::consumer::hooks::text_section;
use crate::consumer::{
    self, App, AsyncExecutor, ConnectOutcome, Consumer, ConsumerHandle, Context, HookExecutor,
    Passive, Spawn,
};
use crate::demux::routes::{Route, StreamRoutes};
use crate::demux::sink::StreamSink;
use crate::layer::GroupMessage;
use crate::obs::metrics;

/// Per-connection demultiplexer settings.
#[derive(Debug, Clone)]
pub struct DemuxSettings {
    /// Upper bound on waiting for children after a physical disconnect.
    pub close_timeout: Duration,
    /// Inbound queue depth of each child.
    pub child_queue: usize,
}

impl Default for DemuxSettings {
    fn default() -> Self {
        Self {
            close_timeout: Duration::from_secs(5),
            child_queue: 64,
        }
    }
}

/// Splits one physical connection into named streams, each driven by its own
/// child consumer task.
///
/// The child registry is owned by the parent's driving task, which is the
/// only place children are inserted or pruned.
pub struct Demultiplexer {
    routes: Arc<StreamRoutes>,
    settings: DemuxSettings,
    children: HashMap<String, ConsumerHandle>,
    parent: Box<dyn HookExecutor>,
}

impl Demultiplexer {
    pub fn new(routes: Arc<StreamRoutes>, settings: DemuxSettings, parent: Box<dyn HookExecutor>) -> Self {
        Self {
            routes,
            settings,
            children: HashMap::new(),
            parent,
        }
    }

    /// Application whose instances demultiplex `routes`.
    pub fn app(routes: StreamRoutes, settings: DemuxSettings) -> App {
        Self::app_with_parent(routes, settings, || Passive)
    }

    /// Like [`Demultiplexer::app`], with `parent` receiving the physical
    /// connection's group messages and final disconnect.
    pub fn app_with_parent<F, C>(routes: StreamRoutes, settings: DemuxSettings, parent: F) -> App
    where
        F: Fn() -> C + Send + Sync + 'static,
        C: Consumer,
    {
        let routes = Arc::new(routes);
        App::from_executor(move || {
            let parent: Box<dyn HookExecutor> = Box::new(AsyncExecutor::new(parent()));
            Ok(Box::new(Demultiplexer::new(Arc::clone(&routes), settings.clone(), parent)))
        })
    }

    async fn spawn_child(&mut self, ctx: &Context, stream: &str, route: Route) -> Result<()> {
        let mut scope = ctx.scope().clone();
        scope.insert("stream", Value::String(stream.to_string()))?;

        let outbound = Arc::new(StreamSink::new(
            stream,
            Arc::clone(ctx.outbound()),
            Arc::clone(ctx.codec()),
        ));
        let child = consumer::spawn(
            &route.app,
            Spawn {
                scope,
                layer: ctx.layer_opt().cloned(),
                outbound,
                queue: self.settings.child_queue,
                prefix: "stream",
            },
        )
        .await?;
        child.send(InboundEvent::Connect).await?;

        metrics::global().streams_spawned.inc(&[("stream", stream)]);
        tracing::debug!(%stream, channel = %child.channel_name(), "stream child spawned");
        self.children.insert(stream.to_string(), child);
        Ok(())
    }

    /// Drop registry entries whose task has completed.
    fn prune(&mut self) {
        self.children.retain(|stream, child| {
            let live = !child.is_finished();
            if !live {
                tracing::debug!(%stream, "stream child finished");
            }
            live
        });
    }

    async fn route(&mut self, ctx: &Context, env: Envelope) -> Result<()> {
        let payload = ctx.codec().encode(&env.payload)?;
        self.prune();

        if !self.children.contains_key(&env.stream) {
            let route = self
                .routes
                .get(&env.stream)
                .cloned()
                .ok_or_else(|| WsPlexError::Protocol(format!("unknown stream: {}", env.stream)))?;
            self.spawn_child(ctx, &env.stream, route).await?;
        }

        let Some(child) = self.children.get(&env.stream) else {
            return Ok(());
        };
        if child
            .send(InboundEvent::Receive(Frame::Text(payload)))
            .await
            .is_err()
        {
            tracing::warn!(stream = %env.stream, "stream child stopped; message dropped");
            self.children.remove(&env.stream);
        }
        Ok(())
    }

    /// Forward the disconnect to every child and wait for them, bounded by
    /// `close_timeout`. Children still running at the deadline are detached,
    /// not aborted.
    async fn shutdown_children(&mut self, code: u16) {
        let deadline = Instant::now() + self.settings.close_timeout;
        let children = std::mem::take(&mut self.children);
        let mut pending: BTreeSet<String> = children.keys().cloned().collect();

        let mut waits = FuturesUnordered::new();
        for (stream, child) in children {
            let event = InboundEvent::Disconnect { code };
            match timeout_at(deadline, child.send(event)).await {
                Ok(Ok(())) => {}
                Ok(Err(_)) => tracing::debug!(%stream, "stream child already stopped"),
                Err(_) => tracing::debug!(%stream, "stream child inbox full at shutdown"),
            }
            waits.push(async move {
                let res = child.join().await;
                (stream, res)
            });
        }

        let expired = sleep_until(deadline);
        tokio::pin!(expired);
        loop {
            tokio::select! {
                next = waits.next() => match next {
                    Some((stream, res)) => {
                        pending.remove(&stream);
                        if let Err(e) = res {
                            tracing::debug!(%stream, error = %e, "stream child ended with error");
                        }
                    }
                    None => break,
                },
                _ = &mut expired => {
                    metrics::global().shutdown_timeouts.inc(&[]);
                    tracing::warn!(
                        abandoned = ?pending,
                        timeout_ms = self.settings.close_timeout.as_millis() as u64,
                        "stream children still running after close timeout; detaching"
                    );
                    break;
                }
            }
        }
    }
}

#[async_trait]
impl HookExecutor for Demultiplexer {
    /// Accept the physical socket at once, then start the eager streams.
    async fn connect(&mut self, ctx: &Context) -> Result<ConnectOutcome> {
        ctx.accept().await?;

        let eager: Vec<(String, Route)> = self
            .routes
            .eager()
            .map(|(name, route)| (name.to_string(), route.clone()))
            .collect();
        for (stream, route) in eager {
            self.spawn_child(ctx, &stream, route).await?;
        }
        Ok(ConnectOutcome::Continue)
    }

    async fn receive(&mut self, ctx: &Context, frame: Frame) -> Result<()> {
        let text = text_section(frame)?;
        let content = ctx.codec().decode(&text)?;
        let env = Envelope::from_value(content)?;
        self.route(ctx, env).await
    }

    async fn group_message(&mut self, ctx: &Context, msg: GroupMessage) -> Result<()> {
        self.parent.group_message(ctx, msg).await
    }

    /// Children finish (or time out) before the parent leaves its groups.
    async fn before_disconnect(&mut self, ctx: &Context, code: u16) -> Result<()> {
        self.shutdown_children(code).await;
        self.parent.before_disconnect(ctx, code).await
    }

    async fn disconnect(&mut self, ctx: &Context, code: u16) -> Result<()> {
        self.parent.disconnect(ctx, code).await
    }
}
