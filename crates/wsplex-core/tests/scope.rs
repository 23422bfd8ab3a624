//! Scope add-only semantics.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use serde_json::json;

use wsplex_core::scope::{Scope, Session, User};

fn scope() -> Scope {
    Scope::websocket(
        "/v1/ws",
        vec![
            ("session".to_string(), "abc".to_string()),
            ("x".to_string(), "1".to_string()),
        ],
        vec![("Cookie".to_string(), "sessionid=abc".to_string())],
    )
}

#[test]
fn headers_and_query_are_readable() {
    let s = scope();
    assert_eq!(s.kind(), "websocket");
    assert_eq!(s.header("cookie"), Some("sessionid=abc"));
    assert_eq!(s.query_param("session"), Some("abc"));
    assert_eq!(s.query_param("missing"), None);
}

#[test]
fn keys_are_never_overwritten() {
    let mut s = scope();
    s.set_session(Session::new("abc")).unwrap();
    assert!(s.set_session(Session::new("other")).is_err());
    assert_eq!(s.session().unwrap().key, "abc");

    s.set_user(User::Anonymous).unwrap();
    assert!(s.set_user(User::Authenticated { id: "u".into() }).is_err());

    s.insert("stream", json!("chat")).unwrap();
    assert!(s.insert("stream", json!("echo")).is_err());
    assert_eq!(s.get("stream"), Some(&json!("chat")));
}

#[test]
fn reserved_keys_cannot_be_extensions() {
    let mut s = scope();
    let err = s.insert("user", json!("mallory")).unwrap_err();
    assert_eq!(err.client_code().as_str(), "INVALID_ARGUMENT");
}
