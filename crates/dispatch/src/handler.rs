//! Entry points called by the chat transport.

use std::sync::Arc;

use {
    larkbot_channels::InteractiveCard,
    tokio_util::sync::CancellationToken,
    tracing::{debug, warn},
};

use crate::{
    ActionInfo, BotServices, CardCallback, Error, Flow, InboundEvent, MsgInfo,
    actions::default_actions,
    callback,
    chain::{Action, run_chain},
    event::classify,
};

const FAILURE_NOTICE: &str = "Sorry, I could not answer that right now. Please try again later.";

/// Routes inbound messages through the action chain and card interactions
/// to the callback dispatcher. Cheap to clone; each event is handled
/// independently.
#[derive(Clone)]
pub struct MessageHandler {
    services: Arc<BotServices>,
    actions: Arc<Vec<Box<dyn Action>>>,
    shutdown: CancellationToken,
}

impl MessageHandler {
    pub fn new(services: BotServices) -> Self {
        Self::with_actions(services, default_actions())
    }

    pub fn with_actions(services: BotServices, actions: Vec<Box<dyn Action>>) -> Self {
        Self {
            services: Arc::new(services),
            actions: Arc::new(actions),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn services(&self) -> &Arc<BotServices> {
        &self.services
    }

    /// Stop starting new chain steps for in-flight events.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Handle one message-received event.
    ///
    /// Never fails: unsupported events are dropped, and a failing step halts
    /// the chain with no reply unless `bot.notify_on_failure` is set.
    pub async fn on_message(&self, event: InboundEvent) -> Flow {
        let info = match classify(&event) {
            Ok(info) => info,
            Err(e) => {
                debug!(msg_id = %event.message_id, error = %e, "event dropped");
                return Flow::Halt;
            },
        };
        let info = self.resolve_sender(info).await;

        let mut action_info =
            ActionInfo::new(Arc::clone(&self.services), info, self.shutdown.child_token());
        match run_chain(&mut action_info, &self.actions).await {
            Ok(flow) => flow,
            Err(e) => {
                self.report_failure(&action_info, &e).await;
                Flow::Halt
            },
        }
    }

    /// Handle one card interaction. Returns the card that replaces the
    /// clicked one, if any.
    pub async fn on_card_action(&self, callback: CardCallback) -> Option<InteractiveCard> {
        callback::dispatch(&self.services, callback).await
    }

    async fn resolve_sender(&self, info: MsgInfo) -> MsgInfo {
        let Some(profile) = &self.services.profile else {
            return info;
        };
        match profile.display_name(info.sender_id()).await {
            Ok(name) => info.with_sender_name(Some(name)),
            Err(e) => {
                warn!(sender_id = info.sender_id(), error = %e, "profile lookup failed");
                info
            },
        }
    }

    async fn report_failure(&self, info: &ActionInfo, error: &Error) {
        warn!(
            session_id = info.session_id(),
            msg_id = info.message_id(),
            error = %error,
            "message handling failed"
        );
        if !self.services.config.bot.notify_on_failure {
            return;
        }
        if let Err(e) = self
            .services
            .outbound
            .reply_text(info.message_id(), FAILURE_NOTICE)
            .await
        {
            warn!(msg_id = info.message_id(), error = %e, "failed to send failure notice");
        }
    }
}
