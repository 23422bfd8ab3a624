//! Group membership tied to the connection lifecycle.
//!
//! Adds finish before the connect hook runs and discards finish before the
//! disconnect hook runs. Only a layer that cannot do groups at all is an
//! error; any other backend failure is logged and skipped.

use wsplex_core::error::{Result, WsPlexError};

use crate::consumer::context::{Context, UNSUPPORTED_GROUPS};
use crate::obs::metrics;

#[derive(Clone, Copy)]
enum Op {
    Add,
    Discard,
}

impl Op {
    fn as_str(self) -> &'static str {
        match self {
            Op::Add => "group_add",
            Op::Discard => "group_discard",
        }
    }
}

pub(crate) async fn join(ctx: &Context, groups: &[String]) -> Result<()> {
    apply(ctx, groups, Op::Add).await
}

pub(crate) async fn leave(ctx: &Context, groups: &[String]) -> Result<()> {
    apply(ctx, groups, Op::Discard).await
}

async fn apply(ctx: &Context, groups: &[String], op: Op) -> Result<()> {
    if groups.is_empty() {
        return Ok(());
    }
    let layer = ctx.layer()?;
    let channel = ctx.channel_name();

    for group in groups {
        let res = match op {
            Op::Add => layer.group_add(group, channel).await,
            Op::Discard => layer.group_discard(group, channel).await,
        };
        match res {
            Ok(()) => {}
            Err(WsPlexError::GroupsUnsupported) => {
                return Err(WsPlexError::Configuration(UNSUPPORTED_GROUPS.into()));
            }
            Err(e) => {
                metrics::global().group_op_failures.inc(&[("op", op.as_str())]);
                tracing::warn!(%group, %channel, op = op.as_str(), error = %e, "group operation failed");
            }
        }
    }
    Ok(())
}
