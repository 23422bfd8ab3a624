//! WebSocket transport (axum).
//!
//! Responsibilities:
//! - Build the connection scope from the upgrade request and run middleware
//! - Spawn the root application and translate socket traffic to events
//! - Lifecycle: ping + idle timeout, close frames, final disconnect
//!
//! The socket writer runs in its own task and always drains the consumer's
//! outbound queue, so a reader waiting on a full inbound queue never stalls it.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::{HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use futures_util::{stream::SplitSink, SinkExt, StreamExt};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Duration, Instant};

use wsplex_core::error::{Result, WsPlexError};
use wsplex_core::protocol::event::{Frame, InboundEvent, OutboundEvent};
use wsplex_core::scope::Scope;

use crate::app_state::AppState;
use crate::consumer::{self, driver::ABNORMAL_CLOSURE, Spawn, TransportSink};
use crate::obs::metrics;

const NORMAL_CLOSURE: u16 = 1000;
const GOING_AWAY: u16 = 1001;
const NO_STATUS: u16 = 1005;
const CONTROL_QUEUE: usize = 8;

// --------------------
// Entry
// --------------------
pub async fn ws_upgrade(
    State(app): State<AppState>,
    ws: WebSocketUpgrade,
    Query(query): Query<HashMap<String, String>>,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let mut scope = build_scope(&uri, query, &headers);
    if let Err(e) = app.middleware().apply(&mut scope) {
        tracing::warn!(error = %e, code = e.client_code().as_str(), "upgrade rejected by middleware");
        return reject(&e);
    }

    ws.on_upgrade(move |socket| async move {
        if let Err(e) = run_session(app, scope, socket).await {
            tracing::warn!(error = %e, code = e.client_code().as_str(), "ws session failed");
        }
    })
}

fn build_scope(uri: &Uri, query: HashMap<String, String>, headers: &HeaderMap) -> Scope {
    let headers = headers
        .iter()
        .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
        .collect::<Vec<_>>();
    Scope::websocket(uri.path(), query, headers)
}

fn reject(err: &WsPlexError) -> Response {
    let status = match err {
        WsPlexError::AuthFailed => StatusCode::FORBIDDEN,
        WsPlexError::InvalidArgument(_) | WsPlexError::Protocol(_) | WsPlexError::Decode(_) => {
            StatusCode::BAD_REQUEST
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, err.client_code().as_str()).into_response()
}

fn to_message(event: OutboundEvent) -> Option<Message> {
    match event {
        // The HTTP upgrade already completed the handshake.
        OutboundEvent::Accept => None,
        OutboundEvent::Send(Frame::Text(text)) => Some(Message::Text(text)),
        OutboundEvent::Send(Frame::Bytes(bytes)) => Some(Message::Binary(bytes.to_vec())),
        OutboundEvent::Close { code } => Some(close_message(code.unwrap_or(NORMAL_CLOSURE), "")),
    }
}

fn close_message(code: u16, reason: &'static str) -> Message {
    Message::Close(Some(CloseFrame {
        code,
        reason: reason.into(),
    }))
}

// --------------------
// Core session loop
// --------------------
async fn run_session(app: AppState, scope: Scope, socket: WebSocket) -> Result<()> {
    let m = metrics::global();
    m.connections.inc(&[]);
    m.connections_active.inc(&[]);

    let res = drive(&app, scope, socket).await;

    m.connections_active.dec(&[]);
    res
}

async fn drive(app: &AppState, scope: Scope, socket: WebSocket) -> Result<()> {
    let cfg = app.cfg();
    let (out_tx, out_rx) = mpsc::channel::<OutboundEvent>(cfg.consumer.outbound_queue);

    let handle = consumer::spawn(
        app.root(),
        Spawn {
            scope,
            layer: Some(app.layer()),
            outbound: Arc::new(TransportSink::new(out_tx)),
            queue: cfg.consumer.inbound_queue,
            prefix: "ws",
        },
    )
    .await?;
    let channel = handle.channel_name().to_string();
    tracing::debug!(%channel, "ws session started");

    let (ws_tx, mut ws_rx) = socket.split();
    let (ctl_tx, ctl_rx) = mpsc::channel::<Message>(CONTROL_QUEUE);
    let (closed_tx, mut closed_rx) = oneshot::channel::<u16>();
    let writer = tokio::spawn(write_loop(ws_tx, out_rx, ctl_rx, closed_tx));

    handle.send(InboundEvent::Connect).await?;

    let mut ping_tick = tokio::time::interval(cfg.gateway.ping_interval());
    ping_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    let idle_timeout = cfg.gateway.idle_timeout();
    let mut last_activity = Instant::now();

    let code = loop {
        tokio::select! {
            // server close or writer failure
            closed = &mut closed_rx => {
                let code = closed.unwrap_or(ABNORMAL_CLOSURE);
                tracing::debug!(%channel, code, "server closed connection");
                break code;
            }

            // inbound reader
            incoming = ws_rx.next() => {
                let Some(Ok(msg)) = incoming else { break ABNORMAL_CLOSURE; };
                last_activity = Instant::now();

                let frame = match msg {
                    Message::Text(s) => Frame::Text(s),
                    Message::Binary(b) => Frame::Bytes(Bytes::from(b)),
                    Message::Ping(payload) => {
                        let _ = ctl_tx.send(Message::Pong(payload)).await;
                        continue;
                    }
                    Message::Pong(_) => continue,
                    Message::Close(frame) => {
                        break frame.map(|f| f.code).unwrap_or(NO_STATUS);
                    }
                };
                tokio::select! {
                    sent = handle.send(InboundEvent::Receive(frame)) => {
                        if sent.is_err() {
                            // Consumer failed and already emitted its close.
                            break ABNORMAL_CLOSURE;
                        }
                    }
                    closed = &mut closed_rx => break closed.unwrap_or(ABNORMAL_CLOSURE),
                }
            }

            // ping
            _ = ping_tick.tick() => {
                let _ = ctl_tx.send(Message::Ping(Vec::new())).await;
            }

            // idle timeout
            _ = tokio::time::sleep(Duration::from_millis(250)) => {
                if last_activity.elapsed() >= idle_timeout {
                    tracing::debug!(%channel, "idle timeout");
                    let _ = ctl_tx.send(close_message(GOING_AWAY, "idle timeout")).await;
                    break GOING_AWAY;
                }
            }
        }
    };

    // A consumer that already failed has stopped reading; join reports why.
    let _ = handle.send(InboundEvent::Disconnect { code }).await;
    let res = handle.join().await;
    drop(ctl_tx);
    let _ = writer.await;

    tracing::debug!(%channel, code, "ws session closed");
    res
}

/// Socket writer.
///
/// Forwards outbound events and control frames until the control queue
/// closes. After a close frame (or a write error) further output is drained
/// and discarded; `closed` reports the close code once.
async fn write_loop(
    mut ws_tx: SplitSink<WebSocket, Message>,
    mut out_rx: mpsc::Receiver<OutboundEvent>,
    mut ctl_rx: mpsc::Receiver<Message>,
    closed: oneshot::Sender<u16>,
) {
    let mut closed = Some(closed);
    let mut open = true;
    let mut out_open = true;

    loop {
        let (msg, code) = tokio::select! {
            maybe_out = out_rx.recv(), if out_open => match maybe_out {
                Some(event) => {
                    let code = match &event {
                        OutboundEvent::Close { code } => Some(code.unwrap_or(NORMAL_CLOSURE)),
                        _ => None,
                    };
                    (to_message(event), code)
                }
                None => {
                    out_open = false;
                    (None, Some(ABNORMAL_CLOSURE))
                }
            },
            maybe_ctl = ctl_rx.recv() => match maybe_ctl {
                Some(msg) => {
                    let code = match &msg {
                        Message::Close(frame) => Some(frame.as_ref().map_or(NORMAL_CLOSURE, |f| f.code)),
                        _ => None,
                    };
                    (Some(msg), code)
                }
                None => break,
            },
        };

        if let (true, Some(msg)) = (open, msg) {
            if ws_tx.send(msg).await.is_err() {
                open = false;
                if let Some(tx) = closed.take() {
                    let _ = tx.send(ABNORMAL_CLOSURE);
                }
            }
        }
        if let Some(code) = code {
            open = false;
            if let Some(tx) = closed.take() {
                let _ = tx.send(code);
            }
        }
    }

    let _ = ws_tx.close().await;
}
