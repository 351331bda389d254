//! Interactive-card callback dispatch.

use std::sync::Arc;

use {
    larkbot_channels::InteractiveCard,
    larkbot_common::types::Resolution,
    larkbot_sessions::SessionCache,
    serde::Deserialize,
    serde_json::Value,
    tracing::{debug, info, warn},
};

use crate::{
    BotServices, Result, actions,
    cards::{self, CardMessage, ClearChoice},
};

/// A card interaction as delivered by the chat transport.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CardCallback {
    /// Open id of the user who clicked.
    #[serde(default)]
    pub open_id: String,
    /// The value attached to the clicked element.
    #[serde(default)]
    pub value: Value,
    /// Selected option, for select elements.
    #[serde(default)]
    pub option: Option<String>,
}

impl CardCallback {
    pub fn new(value: Value) -> Self {
        Self {
            value,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_option(mut self, option: impl Into<String>) -> Self {
        self.option = Some(option.into());
        self
    }
}

/// Handle a clear-confirmation answer.
///
/// Returns the replacement card when the value was a recognised yes or no,
/// and `None` when the callback is not handled.
pub async fn process_clear(
    session_id: &str,
    choice: ClearChoice,
    sessions: &dyn SessionCache,
) -> Result<Option<InteractiveCard>> {
    match choice {
        ClearChoice::Confirm => {
            sessions.clear(session_id).await?;
            info!(session_id, "session cleared");
            Ok(Some(cards::cleared_card()))
        },
        ClearChoice::Decline => Ok(Some(cards::kept_card())),
        ClearChoice::Unrecognized => {
            debug!(session_id, "unrecognized clear value ignored");
            Ok(None)
        },
    }
}

/// Dispatch a decoded callback. Never fails: problems are logged and the
/// callback is treated as a no-op.
pub(crate) async fn dispatch(
    services: &Arc<BotServices>,
    callback: CardCallback,
) -> Option<InteractiveCard> {
    let message = match CardMessage::decode(&callback.value) {
        Ok(message) => message,
        Err(e) => {
            debug!(error = %e, "ignoring undecodable card payload");
            return None;
        },
    };

    match message {
        CardMessage::Clear {
            session_id, value, ..
        } => match process_clear(&session_id, value, services.sessions.as_ref()).await {
            Ok(card) => card,
            Err(e) => {
                warn!(session_id, error = %e, "clear callback failed");
                None
            },
        },
        CardMessage::PicResolution {
            session_id,
            msg_id,
            value,
        } => {
            let raw = callback
                .option
                .filter(|option| !option.trim().is_empty())
                .unwrap_or(value);
            if let Err(e) = set_resolution(services, &session_id, &msg_id, &raw).await {
                warn!(session_id, msg_id, error = %e, "resolution callback failed");
            }
            None
        },
        CardMessage::PicMore {
            session_id,
            msg_id,
            value,
        } => {
            spawn_more(services, session_id, msg_id, value);
            None
        },
    }
}

async fn set_resolution(
    services: &BotServices,
    session_id: &str,
    msg_id: &str,
    raw: &str,
) -> Result<()> {
    let resolution: Resolution = match raw.parse() {
        Ok(resolution) => resolution,
        Err(e) => {
            warn!(session_id, value = raw, error = %e, "ignoring invalid resolution");
            return Ok(());
        },
    };
    services
        .sessions
        .set_resolution(session_id, resolution)
        .await?;
    services
        .outbound
        .reply_text(msg_id, &format!("Image resolution updated to {resolution}"))
        .await?;
    Ok(())
}

fn spawn_more(services: &Arc<BotServices>, session_id: String, msg_id: String, prompt: String) {
    if prompt.trim().is_empty() {
        debug!(session_id, "more-images callback without prompt ignored");
        return;
    }
    let task_services = Arc::clone(services);
    services.spawner.spawn(
        "more-images",
        Box::pin(async move {
            let result = async {
                let resolution = actions::resolution_for(&task_services, &session_id).await?;
                actions::generate_more(&task_services, &session_id, &msg_id, &prompt, resolution)
                    .await
            }
            .await;
            if let Err(e) = result {
                warn!(session_id, msg_id, error = %e, "more-images task failed");
            }
        }),
    );
}
