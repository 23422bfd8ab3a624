use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use wsplex_core::error::{Result, WsPlexError};
use wsplex_core::scope::User;

use crate::consumer::{App, Context, JsonConsumer};
use crate::layer::GroupMessage;

pub const LOBBY: &str = "lobby";
const CHAT_MESSAGE: &str = "chat.message";

/// Broadcast chat over the `lobby` group.
///
/// Inbound `{"msg": "..."}` is published to the group; every member
/// (the sender included) receives `{"from": <user>, "msg": "..."}`.
#[derive(Default)]
pub struct ChatConsumer;

impl ChatConsumer {
    pub fn app() -> App {
        App::json(ChatConsumer::default).with_groups([LOBBY])
    }
}

#[derive(Debug, Deserialize)]
struct SendReq {
    msg: String,
}

#[async_trait]
impl JsonConsumer for ChatConsumer {
    async fn receive_json(&mut self, ctx: &Context, content: Value) -> Result<()> {
        let req: SendReq = serde_json::from_value(content)
            .map_err(|e| WsPlexError::InvalidArgument(format!("chat message invalid: {e}")))?;

        let from = ctx
            .scope()
            .user()
            .and_then(User::id)
            .unwrap_or("anonymous");
        let msg = GroupMessage::new(CHAT_MESSAGE, json!({ "from": from, "msg": req.msg }));
        ctx.group_send(LOBBY, msg).await
    }

    async fn group_message(&mut self, ctx: &Context, msg: GroupMessage) -> Result<()> {
        if msg.kind != CHAT_MESSAGE {
            tracing::debug!(channel = %ctx.channel_name(), kind = %msg.kind, "unexpected group message");
            return Ok(());
        }
        ctx.send_json(&msg.body, None).await
    }
}
