//! Shared application state for the gateway.

use std::sync::Arc;

use wsplex_core::error::Result;

use crate::config::GatewayConfig;
use crate::consumer::App;
use crate::demux::{DemuxSettings, Demultiplexer, StreamRoutes};
use crate::layer::{ChannelLayer, InMemoryLayer};
use crate::middleware::{AuthLayer, ConfigUserResolver, MiddlewareStack, SessionLayer};
use crate::services::{ChatConsumer, EchoConsumer};

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: GatewayConfig,
    layer: Arc<InMemoryLayer>,
    root: App,
    middleware: MiddlewareStack,
}

impl AppState {
    /// State serving the built-in streams: `chat` (eager) and `echo` (lazy).
    pub fn new(cfg: GatewayConfig) -> Result<Self> {
        let routes = StreamRoutes::new()
            .stream("chat", ChatConsumer::app())
            .lazy_stream("echo", EchoConsumer::app());
        tracing::info!(streams = ?routes.names(), "stream routes registered");

        let settings = DemuxSettings {
            close_timeout: cfg.consumer.close_timeout(),
            child_queue: cfg.consumer.inbound_queue,
        };
        let root = Demultiplexer::app(routes, settings);
        Ok(Self::with_app(cfg, root))
    }

    /// State serving an arbitrary root application.
    pub fn with_app(cfg: GatewayConfig, root: App) -> Self {
        let layer = Arc::new(InMemoryLayer::new(cfg.layer.channel_capacity));
        let resolver = ConfigUserResolver::new(cfg.auth.sessions.clone());
        let middleware = MiddlewareStack::new()
            .with(SessionLayer::new())
            .with(AuthLayer::new(Arc::new(resolver)));

        Self {
            inner: Arc::new(AppStateInner {
                cfg,
                layer,
                root,
                middleware,
            }),
        }
    }

    pub fn cfg(&self) -> &GatewayConfig {
        &self.inner.cfg
    }

    pub fn layer(&self) -> Arc<dyn ChannelLayer> {
        self.inner.layer.clone()
    }

    pub fn root(&self) -> &App {
        &self.inner.root
    }

    pub fn middleware(&self) -> &MiddlewareStack {
        &self.inner.middleware
    }
}
