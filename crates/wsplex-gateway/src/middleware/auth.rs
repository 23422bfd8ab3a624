use std::collections::BTreeMap;
use std::sync::Arc;

use wsplex_core::error::{Result, WsPlexError};
use wsplex_core::scope::{Scope, Session, User};

use crate::middleware::ScopeLayer;

pub const MISSING_SESSION: &str =
    "auth layer cannot find session in scope; session layer must run first";

/// Looks up the identity behind a session.
pub trait UserResolver: Send + Sync {
    fn resolve(&self, session: &Session) -> Result<User>;
}

/// Resolver backed by the `auth.sessions` config table.
/// Unknown sessions resolve to [`User::Anonymous`].
#[derive(Debug, Clone, Default)]
pub struct ConfigUserResolver {
    sessions: BTreeMap<String, String>,
}

impl ConfigUserResolver {
    pub fn new(sessions: BTreeMap<String, String>) -> Self {
        Self { sessions }
    }
}

impl UserResolver for ConfigUserResolver {
    fn resolve(&self, session: &Session) -> Result<User> {
        Ok(match self.sessions.get(&session.key) {
            Some(id) => User::Authenticated { id: id.clone() },
            None => User::Anonymous,
        })
    }
}

/// Resolves `scope.user` from `scope.session` when the connection is set up.
pub struct AuthLayer {
    resolver: Arc<dyn UserResolver>,
}

impl AuthLayer {
    pub fn new(resolver: Arc<dyn UserResolver>) -> Self {
        Self { resolver }
    }
}

impl ScopeLayer for AuthLayer {
    fn name(&self) -> &'static str {
        "auth"
    }

    fn apply(&self, scope: &mut Scope) -> Result<()> {
        let session = scope
            .session()
            .ok_or_else(|| WsPlexError::Configuration(MISSING_SESSION.into()))?;
        if scope.user().is_some() {
            return Ok(());
        }
        let user = self.resolver.resolve(session)?;
        tracing::debug!(session = %session.key, user = ?user.id(), "user resolved");
        scope.set_user(user)
    }
}
