//! Card callback payloads and the cards the bot sends.

use {
    larkbot_channels::{ButtonStyle, CardAction, CardTemplate, InteractiveCard, SelectOption},
    larkbot_common::types::Resolution,
    larkbot_config::CommandsConfig,
    serde::{Deserialize, Deserializer},
    serde_json::{Value, json},
};

/// Decoded interactive-card callback value.
///
/// Wire shape: `{"kind": "...", "sessionId": "...", "msgId": "...", "value": ...}`
/// where `value` depends on the kind.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum CardMessage {
    Clear {
        session_id: String,
        msg_id: String,
        #[serde(default)]
        value: ClearChoice,
    },
    PicResolution {
        session_id: String,
        msg_id: String,
        /// Select cards carry the choice in the callback option instead.
        #[serde(default)]
        value: String,
    },
    PicMore {
        session_id: String,
        msg_id: String,
        /// The prompt to generate again.
        #[serde(default)]
        value: String,
    },
}

impl CardMessage {
    pub fn decode(value: &Value) -> serde_json::Result<Self> {
        Self::deserialize(value)
    }

    pub fn session_id(&self) -> &str {
        match self {
            Self::Clear { session_id, .. }
            | Self::PicResolution { session_id, .. }
            | Self::PicMore { session_id, .. } => session_id,
        }
    }

    pub fn msg_id(&self) -> &str {
        match self {
            Self::Clear { msg_id, .. }
            | Self::PicResolution { msg_id, .. }
            | Self::PicMore { msg_id, .. } => msg_id,
        }
    }

    /// Encode as the value attached to a card button or select.
    pub fn to_value(&self) -> Value {
        let (kind, value) = match self {
            Self::Clear { value, .. } => ("clear", Value::from(value.as_wire())),
            Self::PicResolution { value, .. } => ("pic_resolution", Value::from(value.as_str())),
            Self::PicMore { value, .. } => ("pic_more", Value::from(value.as_str())),
        };
        json!({
            "kind": kind,
            "sessionId": self.session_id(),
            "msgId": self.msg_id(),
            "value": value,
        })
    }
}

/// Answer to the clear-confirmation card.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ClearChoice {
    Confirm,
    Decline,
    /// Anything that is not a recognisable yes/no.
    #[default]
    Unrecognized,
}

impl ClearChoice {
    fn as_wire(self) -> &'static str {
        match self {
            Self::Confirm => "1",
            Self::Decline => "0",
            Self::Unrecognized => "",
        }
    }
}

impl<'de> Deserialize<'de> for ClearChoice {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        Ok(match raw {
            Value::String(s) if s == "1" => Self::Confirm,
            Value::String(s) if s == "0" => Self::Decline,
            Value::Bool(true) => Self::Confirm,
            Value::Bool(false) => Self::Decline,
            Value::Number(n) if n.as_u64() == Some(1) => Self::Confirm,
            Value::Number(n) if n.as_u64() == Some(0) => Self::Decline,
            _ => Self::Unrecognized,
        })
    }
}

const BOT_NOTICE: &str = "🆑 Bot notice";

pub fn clear_confirm_card(session_id: &str, msg_id: &str) -> InteractiveCard {
    let choice = |value| {
        CardMessage::Clear {
            session_id: session_id.to_string(),
            msg_id: msg_id.to_string(),
            value,
        }
        .to_value()
    };
    InteractiveCard::new()
        .with_header(BOT_NOTICE, CardTemplate::Blue)
        .with_markdown("Clear the context of this topic? The bot will forget everything said so far.")
        .with_actions(vec![
            CardAction::button("Clear", ButtonStyle::Danger, choice(ClearChoice::Confirm)),
            CardAction::button("Keep", ButtonStyle::Default, choice(ClearChoice::Decline)),
        ])
        .with_note("Only the conversation history of this topic is affected.")
}

pub fn cleared_card() -> InteractiveCard {
    InteractiveCard::new()
        .with_header(BOT_NOTICE, CardTemplate::Red)
        .with_markdown("The context of this topic has been cleared.")
        .with_note("Start a brand new topic whenever you like.")
}

pub fn kept_card() -> InteractiveCard {
    InteractiveCard::new()
        .with_header(BOT_NOTICE, CardTemplate::Green)
        .with_markdown("The context of this topic is kept.")
        .with_note("Let's keep going. Ask me anything else about it.")
}

pub fn help_card(commands: &CommandsConfig, help_text: Option<&str>) -> InteractiveCard {
    let body = match help_text {
        Some(text) => text.to_string(),
        None => default_help(commands),
    };
    InteractiveCard::new()
        .with_header("🎒 Need help?", CardTemplate::Blue)
        .with_markdown(body)
}

fn default_help(commands: &CommandsConfig) -> String {
    let show = |triggers: &[String]| -> String {
        triggers
            .iter()
            .map(|t| format!("`{}`", t.trim()))
            .collect::<Vec<_>>()
            .join(" / ")
    };
    format!(
        "**Chat**: just send a message; reply in the thread to keep the context.\n\
         **Clear context**: {}\n\
         **Role play**: {} followed by a persona description\n\
         **Pictures**: {} followed by a description; send it alone to pick a resolution\n\
         **Help**: {}",
        show(&commands.clear),
        show(&commands.roleplay),
        show(&commands.picture),
        show(&commands.help),
    )
}

pub fn persona_card(prompt: &str) -> InteractiveCard {
    InteractiveCard::new()
        .with_header("🥷 Role play mode", CardTemplate::Indigo)
        .with_markdown(prompt.to_string())
        .with_note("Reply in this thread to talk to the persona.")
}

/// First answer of a session. Clearing goes through the clear command and its
/// confirmation card.
pub fn new_topic_card(answer: &str) -> InteractiveCard {
    InteractiveCard::new()
        .with_header("👻 New topic started", CardTemplate::Blue)
        .with_markdown(answer.to_string())
        .with_note("Reply in this thread to continue the conversation.")
}

/// Resolution picker, plus a "more" button when a prompt is known.
pub fn picture_card(
    session_id: &str,
    msg_id: &str,
    prompt: Option<&str>,
    current: Resolution,
) -> InteractiveCard {
    let options = Resolution::ALL
        .into_iter()
        .map(|r| SelectOption::new(r.as_str(), r.as_str()))
        .collect();
    let select = CardMessage::PicResolution {
        session_id: session_id.to_string(),
        msg_id: msg_id.to_string(),
        value: String::new(),
    };
    let mut actions = Vec::new();
    if let Some(prompt) = prompt {
        let more = CardMessage::PicMore {
            session_id: session_id.to_string(),
            msg_id: msg_id.to_string(),
            value: prompt.to_string(),
        };
        actions.push(CardAction::button("More like this", ButtonStyle::Primary, more.to_value()));
    }
    actions.push(CardAction::select("Resolution", options, select.to_value()));

    let body = match prompt {
        Some(prompt) => format!("**Prompt**: {prompt}\n**Resolution**: {current}"),
        None => format!(
            "Describe a picture after the trigger to generate it.\n**Resolution**: {current}"
        ),
    };
    InteractiveCard::new()
        .with_header("🖼️ Picture creation", CardTemplate::Blue)
        .with_markdown(body)
        .with_actions(actions)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    #[rstest]
    #[case(json!("1"), ClearChoice::Confirm)]
    #[case(json!(true), ClearChoice::Confirm)]
    #[case(json!(1), ClearChoice::Confirm)]
    #[case(json!("0"), ClearChoice::Decline)]
    #[case(json!(false), ClearChoice::Decline)]
    #[case(json!(0), ClearChoice::Decline)]
    #[case(json!("yes"), ClearChoice::Unrecognized)]
    #[case(json!(2), ClearChoice::Unrecognized)]
    #[case(json!(null), ClearChoice::Unrecognized)]
    fn clear_values(#[case] raw: Value, #[case] expected: ClearChoice) {
        let msg = CardMessage::decode(&json!({
            "kind": "clear", "sessionId": "s", "msgId": "m", "value": raw
        }))
        .unwrap();
        assert_eq!(msg, CardMessage::Clear {
            session_id: "s".into(),
            msg_id: "m".into(),
            value: expected,
        });
    }

    #[test]
    fn decodes_pic_more_prompt() {
        let msg = CardMessage::decode(&json!({
            "kind": "pic_more", "sessionId": "s", "msgId": "m", "value": "a cat"
        }))
        .unwrap();
        assert_eq!(msg.session_id(), "s");
        assert!(matches!(msg, CardMessage::PicMore { value, .. } if value == "a cat"));
    }

    #[test]
    fn unknown_kind_fails_to_decode() {
        assert!(CardMessage::decode(&json!({"kind": "vote", "sessionId": "s", "msgId": "m"})).is_err());
        assert!(CardMessage::decode(&json!("clear")).is_err());
    }

    #[test]
    fn encoded_button_value_decodes_back() {
        let card = clear_confirm_card("s1", "m1");
        let values: Vec<CardMessage> = card
            .actions()
            .map(|a| CardMessage::decode(a.value()).unwrap())
            .collect();
        assert_eq!(values.len(), 2);
        assert!(matches!(values[0], CardMessage::Clear { value: ClearChoice::Confirm, .. }));
        assert!(matches!(values[1], CardMessage::Clear { value: ClearChoice::Decline, .. }));
        assert_eq!(values[0].session_id(), "s1");
    }

    #[test]
    fn new_topic_card_has_no_actions() {
        let card = new_topic_card("hello");
        assert_eq!(card.actions().count(), 0);
        assert_eq!(card.markdown_text(), "hello");
    }

    #[test]
    fn picture_card_offers_more_only_with_prompt() {
        let with_prompt = picture_card("s", "m", Some("a fox"), Resolution::Medium);
        assert_eq!(with_prompt.actions().count(), 2);
        assert!(with_prompt.markdown_text().contains("512x512"));

        let bare = picture_card("s", "m", None, Resolution::Small);
        let actions: Vec<_> = bare.actions().collect();
        assert_eq!(actions.len(), 1);
        assert!(matches!(actions[0], CardAction::Select { options, .. } if options.len() == 3));
    }

    #[test]
    fn help_lists_configured_triggers() {
        let card = help_card(&CommandsConfig::default(), None);
        let text = card.markdown_text();
        assert!(text.contains("`/clear`"));
        assert!(text.contains("`/picture`"));

        let custom = help_card(&CommandsConfig::default(), Some("custom help"));
        assert_eq!(custom.markdown_text(), "custom help");
    }
}
