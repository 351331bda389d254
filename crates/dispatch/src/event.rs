//! Inbound event shape and classification.

use {
    larkbot_common::types::{ChatType, MessageType},
    serde::{Deserialize, Serialize},
    tracing::debug,
};

use crate::{Error, Result, info::MsgInfo};

/// A message-received event as delivered by the chat transport.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundEvent {
    /// Sender open id.
    pub sender_id: String,
    pub chat_id: String,
    /// `p2p` or `group`.
    pub chat_type: String,
    pub message_id: String,
    /// Thread root; empty or absent for top-level messages.
    #[serde(default)]
    pub root_id: Option<String>,
    /// `text`, `audio`, ...
    pub message_type: String,
    /// Raw JSON content string, e.g. `{"text":"hi"}` or `{"file_key":"..."}`.
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub mentions: Vec<Mention>,
}

/// One `@` mention, in message order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mention {
    pub name: String,
    #[serde(default)]
    pub id: String,
}

impl Mention {
    pub fn new(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawContent {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    file_key: Option<String>,
}

/// Build a [`MsgInfo`] from a raw event.
///
/// Fails with [`Error::Unsupported`] for chat or message types the dispatcher
/// does not handle; callers log and drop those events.
pub fn classify(event: &InboundEvent) -> Result<MsgInfo> {
    let chat_type = ChatType::from_wire(&event.chat_type)
        .ok_or_else(|| Error::unsupported("chat type", &event.chat_type))?;
    let message_type = MessageType::from_wire(&event.message_type)
        .ok_or_else(|| Error::unsupported("message type", &event.message_type))?;
    let (text, file_key) = parse_content(&event.content);

    Ok(MsgInfo {
        sender_id: event.sender_id.clone(),
        sender_name: None,
        chat_id: event.chat_id.clone(),
        session_id: session_id(event).to_string(),
        message_id: event.message_id.clone(),
        text: text.trim().to_string(),
        file_key,
        mentions: event.mentions.clone(),
        chat_type,
        message_type,
    })
}

/// Root message id when threaded, else the message's own id.
pub fn session_id(event: &InboundEvent) -> &str {
    event
        .root_id
        .as_deref()
        .filter(|r| !r.is_empty())
        .unwrap_or(&event.message_id)
}

/// Extract text (mention placeholders stripped) and an optional file key.
///
/// Malformed content yields empty text, which the empty filter drops later.
pub fn parse_content(raw: &str) -> (String, Option<String>) {
    let content: RawContent = match serde_json::from_str(raw) {
        Ok(content) => content,
        Err(e) => {
            debug!(error = %e, "unparseable message content");
            RawContent::default()
        },
    };
    let text = content
        .text
        .map(|t| strip_at_placeholders(&t))
        .unwrap_or_default();
    let file_key = content.file_key.filter(|k| !k.is_empty());
    (text, file_key)
}

/// Remove `@_user_N` mention placeholders (and one trailing space).
pub fn strip_at_placeholders(text: &str) -> String {
    const MARKER: &str = "@_user_";
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(idx) = rest.find(MARKER) {
        out.push_str(&rest[..idx]);
        let after = &rest[idx + MARKER.len()..];
        let digits = after.len() - after.trim_start_matches(|c: char| c.is_ascii_digit()).len();
        if digits == 0 {
            out.push_str(MARKER);
            rest = after;
            continue;
        }
        let after = &after[digits..];
        rest = after.strip_prefix(' ').unwrap_or(after);
    }
    out.push_str(rest);
    out
}
