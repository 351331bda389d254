//! Per-event context handed to every action.

use std::{fmt, sync::Arc};

use {
    larkbot_channels::{ChannelOutbound, ProfileLookup},
    larkbot_common::types::{ChatType, MessageType},
    larkbot_config::LarkbotConfig,
    larkbot_providers::CompletionEngine,
    larkbot_records::RecordStore,
    larkbot_sessions::{DedupCache, SessionCache},
    tokio_util::sync::CancellationToken,
};

use crate::{event::Mention, spawn::TaskSpawner};

/// Normalised view of one inbound message. Built once by
/// [`classify`](crate::event::classify) and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MsgInfo {
    pub(crate) sender_id: String,
    pub(crate) sender_name: Option<String>,
    pub(crate) chat_id: String,
    pub(crate) session_id: String,
    pub(crate) message_id: String,
    pub(crate) text: String,
    pub(crate) file_key: Option<String>,
    pub(crate) mentions: Vec<Mention>,
    pub(crate) chat_type: ChatType,
    pub(crate) message_type: MessageType,
}

impl MsgInfo {
    pub fn sender_id(&self) -> &str {
        &self.sender_id
    }

    /// Display name from the profile lookup, when it succeeded.
    pub fn sender_name(&self) -> Option<&str> {
        self.sender_name.as_deref()
    }

    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn message_id(&self) -> &str {
        &self.message_id
    }

    /// Original trimmed text; empty for audio messages.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn file_key(&self) -> Option<&str> {
        self.file_key.as_deref()
    }

    pub fn mentions(&self) -> &[Mention] {
        &self.mentions
    }

    pub fn chat_type(&self) -> ChatType {
        self.chat_type
    }

    pub fn message_type(&self) -> MessageType {
        self.message_type
    }

    /// Attach the sender's display name. Only used while building the
    /// context, before the chain runs.
    pub(crate) fn with_sender_name(mut self, name: Option<String>) -> Self {
        self.sender_name = name;
        self
    }
}

/// Collaborators shared by every event: caches, completion engine, reply
/// channel, optional record store and profile lookup, and the background
/// task spawner.
#[derive(Clone)]
pub struct BotServices {
    pub config: Arc<LarkbotConfig>,
    pub sessions: Arc<dyn SessionCache>,
    pub dedup: Arc<dyn DedupCache>,
    pub engine: Arc<dyn CompletionEngine>,
    pub outbound: Arc<dyn ChannelOutbound>,
    pub spawner: Arc<dyn TaskSpawner>,
    pub records: Option<Arc<dyn RecordStore>>,
    pub profile: Option<Arc<dyn ProfileLookup>>,
}

impl BotServices {
    pub fn new(
        config: Arc<LarkbotConfig>,
        sessions: Arc<dyn SessionCache>,
        dedup: Arc<dyn DedupCache>,
        engine: Arc<dyn CompletionEngine>,
        outbound: Arc<dyn ChannelOutbound>,
        spawner: Arc<dyn TaskSpawner>,
    ) -> Self {
        Self {
            config,
            sessions,
            dedup,
            engine,
            outbound,
            spawner,
            records: None,
            profile: None,
        }
    }

    #[must_use]
    pub fn with_records(mut self, records: Arc<dyn RecordStore>) -> Self {
        self.records = Some(records);
        self
    }

    #[must_use]
    pub fn with_profile(mut self, profile: Arc<dyn ProfileLookup>) -> Self {
        self.profile = Some(profile);
        self
    }
}

impl fmt::Debug for BotServices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotServices")
            .field("bot", &self.config.bot.name)
            .field("records", &self.records.is_some())
            .field("profile", &self.profile.is_some())
            .finish_non_exhaustive()
    }
}

/// Mutable working state for one pass through the action chain.
#[derive(Debug)]
pub struct ActionInfo {
    pub cancel: CancellationToken,
    pub services: Arc<BotServices>,
    info: MsgInfo,
    /// Working text. Starts as the message text; transcription replaces it.
    pub text: String,
}

impl ActionInfo {
    pub fn new(services: Arc<BotServices>, info: MsgInfo, cancel: CancellationToken) -> Self {
        Self {
            cancel,
            services,
            text: info.text.clone(),
            info,
        }
    }

    pub fn info(&self) -> &MsgInfo {
        &self.info
    }

    pub fn session_id(&self) -> &str {
        &self.info.session_id
    }

    pub fn message_id(&self) -> &str {
        &self.info.message_id
    }

    pub fn config(&self) -> &LarkbotConfig {
        &self.services.config
    }
}
