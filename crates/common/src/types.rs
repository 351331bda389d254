//! Value types shared by the dispatcher and its collaborators.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::Error;

/// Kind of conversation an inbound event arrived in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatType {
    /// One-to-one chat with the bot (`p2p` on the wire).
    Direct,
    Group,
}

impl ChatType {
    /// Classify a platform chat-type string. Returns `None` for anything the
    /// dispatcher does not handle.
    pub fn from_wire(raw: &str) -> Option<Self> {
        match raw {
            "p2p" | "private" | "direct" => Some(Self::Direct),
            "group" | "topic_group" => Some(Self::Group),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Group => "group",
        }
    }
}

/// Kind of payload carried by an inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Text,
    Audio,
}

impl MessageType {
    pub fn from_wire(raw: &str) -> Option<Self> {
        match raw {
            "text" => Some(Self::Text),
            "audio" => Some(Self::Audio),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Audio => "audio",
        }
    }
}

/// Image size accepted by the image-generation backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Resolution {
    #[default]
    #[serde(rename = "256x256")]
    Small,
    #[serde(rename = "512x512")]
    Medium,
    #[serde(rename = "1024x1024")]
    Large,
}

impl Resolution {
    pub const ALL: [Resolution; 3] = [Self::Small, Self::Medium, Self::Large];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Small => "256x256",
            Self::Medium => "512x512",
            Self::Large => "1024x1024",
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Resolution {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|r| r.as_str() == trimmed)
            .ok_or_else(|| Error::invalid_value("resolution", s))
    }
}

/// Speaker of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One turn of conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    #[rstest]
    #[case("p2p", Some(ChatType::Direct))]
    #[case("group", Some(ChatType::Group))]
    #[case("topic_group", Some(ChatType::Group))]
    #[case("channel", None)]
    #[case("", None)]
    fn chat_type_from_wire(#[case] raw: &str, #[case] expected: Option<ChatType>) {
        assert_eq!(ChatType::from_wire(raw), expected);
    }

    #[test]
    fn message_type_rejects_images() {
        assert_eq!(MessageType::from_wire("audio"), Some(MessageType::Audio));
        assert_eq!(MessageType::from_wire("image"), None);
    }

    #[rstest]
    #[case("256x256", Resolution::Small)]
    #[case(" 512x512 ", Resolution::Medium)]
    #[case("1024x1024", Resolution::Large)]
    fn resolution_parses(#[case] raw: &str, #[case] expected: Resolution) {
        assert_eq!(raw.parse::<Resolution>().unwrap(), expected);
    }

    #[test]
    fn resolution_rejects_unknown_size() {
        let err = "800x600".parse::<Resolution>().unwrap_err();
        assert!(err.to_string().contains("800x600"));
    }

    #[test]
    fn resolution_serializes_as_size_string() {
        let json = serde_json::to_string(&Resolution::Medium).unwrap();
        assert_eq!(json, "\"512x512\"");
        let back: Resolution = serde_json::from_str("\"1024x1024\"").unwrap();
        assert_eq!(back, Resolution::Large);
    }

    #[test]
    fn chat_message_roles_serialize_lowercase() {
        let json = serde_json::to_value(ChatMessage::assistant("hi")).unwrap();
        assert_eq!(json["role"], "assistant");
        assert_eq!(json["content"], "hi");
    }
}
