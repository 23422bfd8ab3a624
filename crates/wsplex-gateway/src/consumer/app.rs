use std::sync::Arc;

use wsplex_core::codec::{JsonCodec, SerdeJsonCodec};
use wsplex_core::error::Result;

use crate::consumer::executor::{AsyncExecutor, BlockingExecutor, HookExecutor};
use crate::consumer::hooks::{Consumer, Json, JsonConsumer, SyncConsumer, SyncJson, SyncJsonConsumer};

/// Immutable per-application settings, shared by every instance it spawns.
#[derive(Clone)]
pub struct ConsumerConfig {
    groups: Arc<[String]>,
    codec: Arc<dyn JsonCodec>,
}

impl ConsumerConfig {
    pub fn groups(&self) -> &Arc<[String]> {
        &self.groups
    }

    pub fn codec(&self) -> &Arc<dyn JsonCodec> {
        &self.codec
    }
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            groups: Arc::from(Vec::<String>::new()),
            codec: Arc::new(SerdeJsonCodec),
        }
    }
}

type Build = dyn Fn() -> Result<Box<dyn HookExecutor>> + Send + Sync;

/// A consumer application: a factory producing one fresh hook executor per
/// connection (or per demultiplexed stream), plus its configuration.
pub struct App {
    config: ConsumerConfig,
    build: Box<Build>,
}

impl App {
    /// Native async consumer.
    pub fn new<F, C>(factory: F) -> Self
    where
        F: Fn() -> C + Send + Sync + 'static,
        C: Consumer,
    {
        Self::from_executor(move || Ok(Box::new(AsyncExecutor::new(factory()))))
    }

    /// Async consumer that receives decoded JSON.
    pub fn json<F, C>(factory: F) -> Self
    where
        F: Fn() -> C + Send + Sync + 'static,
        C: JsonConsumer,
    {
        Self::new(move || Json(factory()))
    }

    /// Blocking consumer; each instance gets its own worker thread.
    pub fn sync<F, C>(factory: F) -> Self
    where
        F: Fn() -> C + Send + Sync + 'static,
        C: SyncConsumer,
    {
        Self::from_executor(move || Ok(Box::new(BlockingExecutor::spawn(factory())?)))
    }

    pub fn sync_json<F, C>(factory: F) -> Self
    where
        F: Fn() -> C + Send + Sync + 'static,
        C: SyncJsonConsumer,
    {
        Self::sync(move || SyncJson(factory()))
    }

    pub fn from_executor<F>(build: F) -> Self
    where
        F: Fn() -> Result<Box<dyn HookExecutor>> + Send + Sync + 'static,
    {
        Self {
            config: ConsumerConfig::default(),
            build: Box::new(build),
        }
    }

    pub fn with_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.groups = groups.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_codec(mut self, codec: Arc<dyn JsonCodec>) -> Self {
        self.config.codec = codec;
        self
    }

    pub fn config(&self) -> &ConsumerConfig {
        &self.config
    }

    pub(crate) fn instantiate(&self) -> Result<Box<dyn HookExecutor>> {
        (self.build)()
    }
}
