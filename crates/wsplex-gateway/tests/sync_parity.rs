//! Blocking and async consumers with the same logic behave identically.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

mod support;

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::{json, Value};

use wsplex_core::error::Result;
use wsplex_core::protocol::event::{Frame, OutboundEvent};
use wsplex_gateway::consumer::{
    App, CloseCode, ConnectOutcome, Consumer, Context, JsonConsumer, SyncConsumer, SyncContext,
    SyncJsonConsumer,
};
use wsplex_gateway::services::EchoConsumer;
use wsplex_gateway::transport::MemoryConnection;

use support::{next, scope, text};

/// `mode=deny` in the query denies; text frames are answered, "quit"
/// closes with 4000, binary frames are echoed reversed.
struct AsyncScript;
struct SyncScript;

#[async_trait]
impl Consumer for AsyncScript {
    async fn connect(&mut self, ctx: &Context) -> Result<ConnectOutcome> {
        if ctx.scope().query_param("mode") == Some("deny") {
            return Ok(ConnectOutcome::Deny);
        }
        Ok(ConnectOutcome::Accept)
    }

    async fn receive(&mut self, ctx: &Context, frame: Frame) -> Result<()> {
        match frame {
            Frame::Text(t) if t == "quit" => {
                ctx.send(Some("bye".into()), None, Some(CloseCode::Code(4000))).await
            }
            Frame::Text(t) => ctx.send_text(format!("got:{t}")).await,
            Frame::Bytes(b) => {
                let mut v = b.to_vec();
                v.reverse();
                ctx.send_bytes(v).await
            }
        }
    }
}

impl SyncConsumer for SyncScript {
    fn connect(&mut self, ctx: &SyncContext) -> Result<ConnectOutcome> {
        if ctx.scope().query_param("mode") == Some("deny") {
            return Ok(ConnectOutcome::Deny);
        }
        Ok(ConnectOutcome::Accept)
    }

    fn receive(&mut self, ctx: &SyncContext, frame: Frame) -> Result<()> {
        match frame {
            Frame::Text(t) if t == "quit" => {
                ctx.send(Some("bye".into()), None, Some(CloseCode::Code(4000)))
            }
            Frame::Text(t) => ctx.send_text(format!("got:{t}")),
            Frame::Bytes(b) => {
                let mut v = b.to_vec();
                v.reverse();
                ctx.send_bytes(v)
            }
        }
    }
}

struct AsyncJsonEcho;

#[async_trait]
impl JsonConsumer for AsyncJsonEcho {
    async fn receive_json(&mut self, ctx: &Context, content: Value) -> Result<()> {
        ctx.send_json(&content, None).await
    }
}

async fn transcript(
    app: &App,
    query: &[(&str, &str)],
    inputs: &[Frame],
) -> (bool, Vec<OutboundEvent>) {
    let query = query.iter().map(|(k, v)| (k.to_string(), v.to_string()));
    let scope = wsplex_core::scope::Scope::websocket("/v1/ws", query, Vec::new());
    let conn = MemoryConnection::open(app, scope, None).await.unwrap();
    // A failed consumer stops reading, so later sends may be refused.
    for frame in inputs {
        let _ = match frame {
            Frame::Text(t) => conn.send_text(t.clone()).await,
            Frame::Bytes(b) => conn.send_bytes(b.clone()).await,
        };
    }
    let _ = conn.disconnect(1000).await;
    let (res, events) = conn.finish().await;
    (res.is_ok(), events)
}

fn script() -> Vec<Frame> {
    vec![
        Frame::Text("a".into()),
        Frame::Bytes(vec![1u8, 2, 3].into()),
        Frame::Text("b".into()),
        Frame::Text("quit".into()),
        Frame::Text("after".into()),
    ]
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn sync_and_async_produce_identical_sequences() {
    let a = transcript(&App::new(|| AsyncScript), &[], &script()).await;
    let s = transcript(&App::sync(|| SyncScript), &[], &script()).await;
    assert_eq!(a, s);

    let (_, events) = a;
    assert_eq!(events[0], OutboundEvent::Accept);
    assert_eq!(events[1], text("got:a"));
    assert_eq!(events[2], OutboundEvent::Send(Frame::Bytes(vec![3u8, 2, 1].into())));
    assert_eq!(events[3], text("got:b"));
    assert_eq!(events[4], text("bye"));
    assert_eq!(events[5], OutboundEvent::Close { code: Some(4000) });
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn sync_and_async_deny_identically() {
    let a = transcript(&App::new(|| AsyncScript), &[("mode", "deny")], &script()).await;
    let s = transcript(&App::sync(|| SyncScript), &[("mode", "deny")], &script()).await;
    assert_eq!(a, s);
    assert_eq!(a.1, vec![OutboundEvent::Close { code: None }]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn sync_and_async_json_echo_match() {
    let inputs = vec![
        Frame::Text(json!({ "n": 1 }).to_string()),
        Frame::Text(json!(["x", null]).to_string()),
    ];
    let a = transcript(&App::json(|| AsyncJsonEcho), &[], &inputs).await;
    let s = transcript(&EchoConsumer::app(), &[], &inputs).await;
    assert_eq!(a, s);
    assert_eq!(a.1.len(), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn sync_failure_tears_down_like_async() {
    let inputs = vec![Frame::Text("{broken".into())];
    let a = transcript(&App::json(|| AsyncJsonEcho), &[], &inputs).await;
    let s = transcript(&EchoConsumer::app(), &[], &inputs).await;
    assert_eq!(a, s);
    assert!(!a.0);
    assert_eq!(a.1.last(), Some(&OutboundEvent::Close { code: Some(1003) }));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn blocking_hook_stalls_only_its_own_connection() {
    struct Slow;

    impl SyncJsonConsumer for Slow {
        fn receive_json(&mut self, ctx: &SyncContext, content: Value) -> Result<()> {
            std::thread::sleep(Duration::from_millis(800));
            ctx.send_json(&content, None)
        }
    }

    let slow_app = App::sync_json(|| Slow);
    let fast_app = App::json(|| AsyncJsonEcho);

    let mut slow = MemoryConnection::open(&slow_app, scope(), None).await.unwrap();
    let mut fast = MemoryConnection::open(&fast_app, scope(), None).await.unwrap();
    assert_eq!(next(&mut slow).await, OutboundEvent::Accept);
    assert_eq!(next(&mut fast).await, OutboundEvent::Accept);

    slow.send_json(&json!({ "slow": true })).await.unwrap();
    let started = Instant::now();
    fast.send_json(&json!({ "fast": true })).await.unwrap();
    assert_eq!(next(&mut fast).await, text(r#"{"fast":true}"#));
    assert!(started.elapsed() < Duration::from_millis(400));

    assert_eq!(next(&mut slow).await, text(r#"{"slow":true}"#));
}
