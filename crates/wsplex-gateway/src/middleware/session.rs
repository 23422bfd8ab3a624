use std::sync::atomic::{AtomicU64, Ordering};

use wsplex_core::error::Result;
use wsplex_core::scope::{Scope, Session};

use crate::middleware::ScopeLayer;

pub const SESSION_COOKIE: &str = "sessionid";
pub const SESSION_QUERY: &str = "session";

/// Attaches a [`Session`] to the scope.
///
/// The key comes from the `sessionid` cookie, then the `session` query
/// parameter; otherwise a fresh anonymous key is minted. A scope that already
/// carries a session is left alone.
#[derive(Debug, Default)]
pub struct SessionLayer {
    seq: AtomicU64,
}

impl SessionLayer {
    pub fn new() -> Self {
        Self::default()
    }

    fn key_for(&self, scope: &Scope) -> String {
        if let Some(key) = scope.header("cookie").and_then(|c| cookie_value(c, SESSION_COOKIE)) {
            return key.to_string();
        }
        if let Some(key) = scope.query_param(SESSION_QUERY).filter(|k| !k.is_empty()) {
            return key.to_string();
        }
        format!("anon-{}", self.seq.fetch_add(1, Ordering::Relaxed) + 1)
    }
}

impl ScopeLayer for SessionLayer {
    fn name(&self) -> &'static str {
        "session"
    }

    fn apply(&self, scope: &mut Scope) -> Result<()> {
        if scope.session().is_some() {
            return Ok(());
        }
        let key = self.key_for(scope);
        scope.set_session(Session::new(key))
    }
}

fn cookie_value<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v.trim())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_lookup() {
        assert_eq!(cookie_value("a=1; sessionid=abc; b=2", "sessionid"), Some("abc"));
        assert_eq!(cookie_value("sessionid=", "sessionid"), None);
        assert_eq!(cookie_value("other=x", "sessionid"), None);
    }
}
