//! Scope middleware run by transports before a consumer is spawned.
//!
//! Layers run in order and may only add to the scope.

pub mod auth;
pub mod session;

use std::sync::Arc;

use wsplex_core::error::Result;
use wsplex_core::scope::Scope;

pub use auth::{AuthLayer, ConfigUserResolver, UserResolver};
pub use session::SessionLayer;

pub trait ScopeLayer: Send + Sync {
    fn name(&self) -> &'static str;
    fn apply(&self, scope: &mut Scope) -> Result<()>;
}

/// Ordered list of scope layers.
#[derive(Clone, Default)]
pub struct MiddlewareStack {
    layers: Vec<Arc<dyn ScopeLayer>>,
}

impl MiddlewareStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, layer: impl ScopeLayer + 'static) -> Self {
        self.layers.push(Arc::new(layer));
        self
    }

    pub fn apply(&self, scope: &mut Scope) -> Result<()> {
        for layer in &self.layers {
            layer.apply(scope).map_err(|e| {
                tracing::debug!(layer = layer.name(), error = %e, "scope middleware failed");
                e
            })?;
        }
        Ok(())
    }
}
