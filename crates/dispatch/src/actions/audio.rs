use {async_trait::async_trait, larkbot_common::types::MessageType, tracing::debug};

use crate::{
    ActionInfo, Error, Result,
    chain::{Action, Flow},
};

/// Replaces the working text of audio messages with their transcript.
pub struct AudioAction;

#[async_trait]
impl Action for AudioAction {
    fn name(&self) -> &'static str {
        "audio"
    }

    async fn execute(&self, info: &mut ActionInfo) -> Result<Flow> {
        if info.info().message_type() != MessageType::Audio {
            return Ok(Flow::Continue);
        }
        let file_key = info.info().file_key().ok_or_else(|| Error::MissingFileKey {
            msg_id: info.message_id().to_string(),
        })?;
        let transcript = info.services.engine.transcribe(file_key).await?;
        debug!(
            msg_id = info.message_id(),
            chars = transcript.len(),
            "audio transcribed"
        );
        info.text = transcript.trim().to_string();
        Ok(Flow::Continue)
    }
}
