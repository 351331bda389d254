use async_trait::async_trait;

use crate::{Result, card::InteractiveCard};

/// Send replies back to the chat platform.
///
/// Every reply is threaded onto the message it answers, so the only address
/// needed is that message's id.
#[async_trait]
pub trait ChannelOutbound: Send + Sync {
    async fn reply_text(&self, msg_id: &str, text: &str) -> Result<()>;

    /// Reply with an image given as base64-encoded PNG bytes.
    async fn reply_image(&self, msg_id: &str, image_base64: &str) -> Result<()>;

    async fn reply_card(&self, msg_id: &str, card: &InteractiveCard) -> Result<()>;
}

/// Resolve a sender's display name (contact lookup).
#[async_trait]
pub trait ProfileLookup: Send + Sync {
    async fn display_name(&self, open_id: &str) -> Result<String>;
}
