use std::collections::BTreeMap;
use std::sync::Arc;

use crate::consumer::App;

/// When a stream's child is started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnMode {
    /// On physical connect.
    Eager,
    /// On the first envelope naming the stream.
    Lazy,
}

#[derive(Clone)]
pub struct Route {
    pub app: Arc<App>,
    pub mode: SpawnMode,
}

/// Stream name -> application. Built once, then shared by every connection.
#[derive(Clone, Default)]
pub struct StreamRoutes {
    routes: BTreeMap<String, Route>,
}

impl StreamRoutes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a stream whose child starts with the connection.
    pub fn stream(self, name: impl Into<String>, app: App) -> Self {
        self.register(name, app, SpawnMode::Eager)
    }

    /// Register a stream whose child starts on first use.
    pub fn lazy_stream(self, name: impl Into<String>, app: App) -> Self {
        self.register(name, app, SpawnMode::Lazy)
    }

    fn register(mut self, name: impl Into<String>, app: App, mode: SpawnMode) -> Self {
        self.routes.insert(
            name.into(),
            Route {
                app: Arc::new(app),
                mode,
            },
        );
        self
    }

    pub fn get(&self, name: &str) -> Option<&Route> {
        self.routes.get(name)
    }

    /// Eagerly spawned streams, in name order.
    pub fn eager(&self) -> impl Iterator<Item = (&str, &Route)> {
        self.routes
            .iter()
            .filter(|(_, r)| r.mode == SpawnMode::Eager)
            .map(|(n, r)| (n.as_str(), r))
    }

    pub fn names(&self) -> Vec<&str> {
        self.routes.keys().map(String::as_str).collect()
    }
}
