//! Filters that drop events without replying.

use {async_trait::async_trait, larkbot_common::types::ChatType, tracing::debug};

use crate::{
    ActionInfo, Result,
    chain::{Action, Flow},
};

/// Halts on redelivered message ids.
pub struct DedupAction;

#[async_trait]
impl Action for DedupAction {
    fn name(&self) -> &'static str {
        "dedup"
    }

    async fn execute(&self, info: &mut ActionInfo) -> Result<Flow> {
        if info.services.dedup.check_and_record(info.message_id()).await? {
            return Ok(Flow::Continue);
        }
        debug!(msg_id = info.message_id(), "duplicate delivery ignored");
        Ok(Flow::Halt)
    }
}

/// In groups, only continue when the bot is the single mention.
pub struct MentionAction;

#[async_trait]
impl Action for MentionAction {
    fn name(&self) -> &'static str {
        "mention"
    }

    async fn execute(&self, info: &mut ActionInfo) -> Result<Flow> {
        match info.info().chat_type() {
            ChatType::Direct => Ok(Flow::Continue),
            ChatType::Group => {
                let bot_name = info.config().bot.name.as_str();
                match info.info().mentions() {
                    [only] if only.name == bot_name => Ok(Flow::Continue),
                    mentions => {
                        debug!(
                            msg_id = info.message_id(),
                            mentions = mentions.len(),
                            "group message not addressed to the bot"
                        );
                        Ok(Flow::Halt)
                    },
                }
            },
        }
    }
}

/// Halts silently when there is nothing to answer.
pub struct EmptyAction;

#[async_trait]
impl Action for EmptyAction {
    fn name(&self) -> &'static str {
        "empty"
    }

    async fn execute(&self, info: &mut ActionInfo) -> Result<Flow> {
        if info.text.trim().is_empty() {
            return Ok(Flow::Halt);
        }
        Ok(Flow::Continue)
    }
}
