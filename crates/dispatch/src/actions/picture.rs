use {
    async_trait::async_trait,
    larkbot_common::types::Resolution,
    tracing::{debug, info},
};

use crate::{
    ActionInfo, BotServices, Result, cards,
    chain::{Action, Flow},
    triggers::strip_trigger,
};

/// Generates an image for `<trigger> <prompt>` using the session's stored
/// resolution. A bare trigger only shows the resolution picker.
pub struct PicAction;

#[async_trait]
impl Action for PicAction {
    fn name(&self) -> &'static str {
        "picture"
    }

    async fn execute(&self, info: &mut ActionInfo) -> Result<Flow> {
        let Some(prompt) =
            strip_trigger(&info.config().commands.picture, &info.text).map(str::to_string)
        else {
            return Ok(Flow::Continue);
        };
        let services = &info.services;
        let resolution = resolution_for(services, info.session_id()).await?;

        if prompt.is_empty() {
            let card = cards::picture_card(info.session_id(), info.message_id(), None, resolution);
            services.outbound.reply_card(info.message_id(), &card).await?;
            return Ok(Flow::Halt);
        }

        generate_more(services, info.session_id(), info.message_id(), &prompt, resolution).await?;
        Ok(Flow::Halt)
    }
}

/// Session resolution, falling back to the configured default.
pub(crate) async fn resolution_for(services: &BotServices, session_id: &str) -> Result<Resolution> {
    Ok(services
        .sessions
        .resolution(session_id)
        .await?
        .unwrap_or(services.config.picture.default_resolution))
}

/// Generate one image, reply with it, then offer another round.
pub async fn generate_more(
    services: &BotServices,
    session_id: &str,
    msg_id: &str,
    prompt: &str,
    resolution: Resolution,
) -> Result<()> {
    debug!(session_id, msg_id, %resolution, "generating image");
    let image = services.engine.generate_image(prompt, resolution).await?;
    services.outbound.reply_image(msg_id, &image).await?;
    let card = cards::picture_card(session_id, msg_id, Some(prompt), resolution);
    services.outbound.reply_card(msg_id, &card).await?;
    info!(session_id, msg_id, %resolution, "image sent");
    Ok(())
}
