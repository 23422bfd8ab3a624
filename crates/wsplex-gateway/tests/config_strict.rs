#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use wsplex_gateway::config;

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
consumer:
  close_timeout_ms: 100
  inbound_queu: 8 # typo should fail
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.client_code().as_str(), "CONFIGURATION");
}

#[test]
fn ok_minimal_config() {
    let cfg = config::load_from_str("version: 1\n").expect("must parse");
    assert_eq!(cfg.version, 1);
    assert_eq!(cfg.consumer.close_timeout_ms, 5000);
    assert_eq!(cfg.layer.channel_capacity, 100);
    assert!(cfg.auth.sessions.is_empty());
}

#[test]
fn full_config() {
    let ok = r#"
version: 1
gateway:
  listen: "127.0.0.1:9000"
  ping_interval_ms: 10000
  idle_timeout_ms: 30000
consumer:
  close_timeout_ms: 250
  inbound_queue: 16
  outbound_queue: 32
layer:
  channel_capacity: 8
auth:
  sessions:
    s-alice: alice
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    assert_eq!(cfg.gateway.listen, "127.0.0.1:9000");
    assert_eq!(cfg.consumer.close_timeout().as_millis(), 250);
    assert_eq!(cfg.consumer.outbound_queue, 32);
    assert_eq!(cfg.auth.sessions.get("s-alice").map(String::as_str), Some("alice"));
}

#[test]
fn unsupported_version() {
    let err = config::load_from_str("version: 2\n").expect_err("must fail");
    assert_eq!(err.client_code().as_str(), "UNSUPPORTED_VERSION");
}

#[test]
fn idle_must_exceed_ping() {
    let bad = r#"
version: 1
gateway:
  ping_interval_ms: 20000
  idle_timeout_ms: 20000
"#;
    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.client_code().as_str(), "CONFIGURATION");
}

#[test]
fn zero_queue_rejected() {
    let bad = r#"
version: 1
consumer:
  inbound_queue: 0
"#;
    let err = config::load_from_str(bad).expect_err("must fail");
    assert!(err.to_string().contains("inbound_queue"));
}

#[test]
fn shipped_config_is_valid() {
    let cfg = config::load_from_file("../../wsplex.yaml").expect("shipped config must load");
    assert_eq!(cfg.auth.sessions.get("dev").map(String::as_str), Some("user:dev"));
}
