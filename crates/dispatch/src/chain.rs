//! Ordered, short-circuiting action chain.

use {async_trait::async_trait, tracing::debug};

use crate::{ActionInfo, Result};

/// What the chain does after an action ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// Stop here. Not an error: the event was either fully handled or
    /// intentionally ignored.
    Halt,
}

/// One policy step. Side effects (replies, cache writes) happen inline.
#[async_trait]
pub trait Action: Send + Sync {
    fn name(&self) -> &'static str;

    async fn execute(&self, info: &mut ActionInfo) -> Result<Flow>;
}

/// Run `actions` in order until one halts or fails.
///
/// Returns [`Flow::Continue`] only when every action continued. Errors
/// propagate immediately; nothing already sent is rolled back and nothing is
/// retried. A cancelled token halts before the next action starts.
pub async fn run_chain(info: &mut ActionInfo, actions: &[Box<dyn Action>]) -> Result<Flow> {
    for action in actions {
        if info.cancel.is_cancelled() {
            debug!(
                action = action.name(),
                msg_id = info.message_id(),
                "chain cancelled"
            );
            return Ok(Flow::Halt);
        }
        if action.execute(info).await? == Flow::Halt {
            debug!(
                action = action.name(),
                session_id = info.session_id(),
                msg_id = info.message_id(),
                "chain halted"
            );
            return Ok(Flow::Halt);
        }
    }
    Ok(Flow::Continue)
}
