//! Text commands: clear, help and role play.

use {async_trait::async_trait, tracing::info};

use crate::{
    ActionInfo, Result, cards,
    chain::{Action, Flow},
    triggers::{matches_exact, strip_trigger},
};

/// Asks for confirmation before clearing. The session is only touched once
/// the confirmation card comes back through the callback dispatcher.
pub struct ClearAction;

#[async_trait]
impl Action for ClearAction {
    fn name(&self) -> &'static str {
        "clear"
    }

    async fn execute(&self, info: &mut ActionInfo) -> Result<Flow> {
        if !matches_exact(&info.config().commands.clear, &info.text) {
            return Ok(Flow::Continue);
        }
        let card = cards::clear_confirm_card(info.session_id(), info.message_id());
        info.services
            .outbound
            .reply_card(info.message_id(), &card)
            .await?;
        Ok(Flow::Halt)
    }
}

pub struct HelpAction;

#[async_trait]
impl Action for HelpAction {
    fn name(&self) -> &'static str {
        "help"
    }

    async fn execute(&self, info: &mut ActionInfo) -> Result<Flow> {
        let config = info.config();
        if !matches_exact(&config.commands.help, &info.text) {
            return Ok(Flow::Continue);
        }
        let card = cards::help_card(&config.commands, config.bot.help_text.as_deref());
        info.services
            .outbound
            .reply_card(info.message_id(), &card)
            .await?;
        Ok(Flow::Halt)
    }
}

/// Starts a persona-scoped conversation: the session is reset and the prompt
/// becomes its system message. A bare trigger is not a match.
pub struct RolePlayAction;

#[async_trait]
impl Action for RolePlayAction {
    fn name(&self) -> &'static str {
        "roleplay"
    }

    async fn execute(&self, info: &mut ActionInfo) -> Result<Flow> {
        let Some(prompt) = strip_trigger(&info.config().commands.roleplay, &info.text)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
        else {
            return Ok(Flow::Continue);
        };

        let sessions = &info.services.sessions;
        sessions.clear(info.session_id()).await?;
        sessions.set_persona(info.session_id(), &prompt).await?;
        info!(session_id = info.session_id(), "persona installed");

        info.services
            .outbound
            .reply_card(info.message_id(), &cards::persona_card(&prompt))
            .await?;
        Ok(Flow::Halt)
    }
}
