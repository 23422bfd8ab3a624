//! Session and auth scope middleware.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

mod support;

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::json;

use wsplex_core::error::{Result, WsPlexError};
use wsplex_core::protocol::event::OutboundEvent;
use wsplex_core::scope::{Scope, Session, User};
use wsplex_gateway::layer::InMemoryLayer;
use wsplex_gateway::middleware::{
    AuthLayer, ConfigUserResolver, MiddlewareStack, ScopeLayer, SessionLayer, UserResolver,
};
use wsplex_gateway::services::ChatConsumer;
use wsplex_gateway::transport::MemoryConnection;

use support::{json_of, next};

fn resolver() -> Arc<dyn UserResolver> {
    let mut sessions = BTreeMap::new();
    sessions.insert("s-alice".to_string(), "alice".to_string());
    Arc::new(ConfigUserResolver::new(sessions))
}

fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
    items.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

fn with_headers(query: &[(&str, &str)], headers: &[(&str, &str)]) -> Scope {
    Scope::websocket("/v1/ws", pairs(query), pairs(headers))
}

#[test]
fn session_from_cookie_wins_over_query() {
    let mut scope = with_headers(
        &[("session", "from-query")],
        &[("Cookie", "theme=dark; sessionid=from-cookie")],
    );
    SessionLayer::new().apply(&mut scope).unwrap();
    assert_eq!(scope.session().unwrap().key, "from-cookie");
}

#[test]
fn session_from_query() {
    let mut scope = with_headers(&[("x", "1"), ("session", "from-query")], &[]);
    SessionLayer::new().apply(&mut scope).unwrap();
    assert_eq!(scope.session().unwrap().key, "from-query");
}

#[test]
fn decoded_query_value_is_used_as_is() {
    let mut scope = with_headers(&[("session", "user@example")], &[]);
    SessionLayer::new().apply(&mut scope).unwrap();
    assert_eq!(scope.session().unwrap().key, "user@example");
}

#[test]
fn anonymous_sessions_are_distinct() {
    let layer = SessionLayer::new();
    let mut a = with_headers(&[], &[]);
    let mut b = with_headers(&[], &[]);
    layer.apply(&mut a).unwrap();
    layer.apply(&mut b).unwrap();
    let (ka, kb) = (&a.session().unwrap().key, &b.session().unwrap().key);
    assert!(ka.starts_with("anon-"));
    assert_ne!(ka, kb);
}

#[test]
fn existing_session_is_kept() {
    let mut scope = with_headers(&[("session", "other")], &[]);
    scope.set_session(Session::new("preset")).unwrap();
    SessionLayer::new().apply(&mut scope).unwrap();
    assert_eq!(scope.session().unwrap().key, "preset");
}

#[test]
fn auth_requires_session() {
    let mut scope = with_headers(&[], &[]);
    let err = AuthLayer::new(resolver()).apply(&mut scope).unwrap_err();
    assert_eq!(err.client_code().as_str(), "CONFIGURATION");
    assert!(err.to_string().contains("session layer must run first"));
    assert!(scope.user().is_none());
}

#[test]
fn auth_resolves_known_and_unknown_sessions() {
    let auth = AuthLayer::new(resolver());

    let mut known = with_headers(&[("session", "s-alice")], &[]);
    SessionLayer::new().apply(&mut known).unwrap();
    auth.apply(&mut known).unwrap();
    assert_eq!(known.user(), Some(&User::Authenticated { id: "alice".into() }));

    let mut unknown = with_headers(&[("session", "s-mallory")], &[]);
    SessionLayer::new().apply(&mut unknown).unwrap();
    auth.apply(&mut unknown).unwrap();
    assert_eq!(unknown.user(), Some(&User::Anonymous));
}

#[test]
fn auth_keeps_existing_user() {
    let mut scope = with_headers(&[("session", "s-alice")], &[]);
    scope.set_user(User::Authenticated { id: "bob".into() }).unwrap();
    let stack = MiddlewareStack::new()
        .with(SessionLayer::new())
        .with(AuthLayer::new(resolver()));
    stack.apply(&mut scope).unwrap();
    assert_eq!(scope.user().and_then(User::id), Some("bob"));
}

#[test]
fn resolver_errors_propagate() {
    struct Down;

    impl UserResolver for Down {
        fn resolve(&self, _session: &Session) -> Result<User> {
            Err(WsPlexError::AuthFailed)
        }
    }

    let stack = MiddlewareStack::new()
        .with(SessionLayer::new())
        .with(AuthLayer::new(Arc::new(Down)));
    let mut scope = with_headers(&[], &[]);
    let err = stack.apply(&mut scope).unwrap_err();
    assert_eq!(err.client_code().as_str(), "AUTH_FAILED");
    assert!(scope.session().is_some());
    assert!(scope.user().is_none());
}

#[tokio::test]
async fn chat_messages_carry_resolved_user() {
    let stack = MiddlewareStack::new()
        .with(SessionLayer::new())
        .with(AuthLayer::new(resolver()));
    let mut scope = with_headers(&[], &[("cookie", "sessionid=s-alice")]);
    stack.apply(&mut scope).unwrap();

    let layer = Arc::new(InMemoryLayer::default());
    let app = ChatConsumer::app();
    let mut conn = MemoryConnection::open(&app, scope, Some(layer)).await.unwrap();
    assert_eq!(next(&mut conn).await, OutboundEvent::Accept);

    conn.send_json(&json!({ "msg": "hello" })).await.unwrap();
    assert_eq!(
        json_of(&next(&mut conn).await),
        json!({ "from": "alice", "msg": "hello" })
    );
}
