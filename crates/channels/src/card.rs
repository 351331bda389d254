//! Interactive card model.
//!
//! Cards are described with plain Rust values and rendered to the platform's
//! card JSON only at the transport edge via [`InteractiveCard::render`].

use serde::Serialize;
use serde_json::{Value, json};

/// Header colour theme.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CardTemplate {
    #[default]
    Blue,
    Wathet,
    Turquoise,
    Green,
    Yellow,
    Orange,
    Red,
    Carmine,
    Violet,
    Purple,
    Indigo,
    Grey,
}

impl CardTemplate {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Blue => "blue",
            Self::Wathet => "wathet",
            Self::Turquoise => "turquoise",
            Self::Green => "green",
            Self::Yellow => "yellow",
            Self::Orange => "orange",
            Self::Red => "red",
            Self::Carmine => "carmine",
            Self::Violet => "violet",
            Self::Purple => "purple",
            Self::Indigo => "indigo",
            Self::Grey => "grey",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardHeader {
    pub title: String,
    pub template: CardTemplate,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ButtonStyle {
    #[default]
    Default,
    Primary,
    Danger,
}

impl ButtonStyle {
    fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Primary => "primary",
            Self::Danger => "danger",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub label: String,
    pub value: String,
}

impl SelectOption {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// An interactive element. `value` is echoed back verbatim in the callback
/// payload when the user clicks or selects.
#[derive(Debug, Clone, PartialEq)]
pub enum CardAction {
    Button {
        label: String,
        style: ButtonStyle,
        value: Value,
    },
    Select {
        placeholder: String,
        options: Vec<SelectOption>,
        value: Value,
    },
}

impl CardAction {
    pub fn button(label: impl Into<String>, style: ButtonStyle, value: Value) -> Self {
        Self::Button {
            label: label.into(),
            style,
            value,
        }
    }

    pub fn select(placeholder: impl Into<String>, options: Vec<SelectOption>, value: Value) -> Self {
        Self::Select {
            placeholder: placeholder.into(),
            options,
            value,
        }
    }

    /// Callback value attached to this action.
    pub fn value(&self) -> &Value {
        match self {
            Self::Button { value, .. } | Self::Select { value, .. } => value,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CardElement {
    Markdown(String),
    Divider,
    /// Row of buttons and selects.
    Actions(Vec<CardAction>),
    /// Small grey footnote.
    Note(String),
}

/// A message card: optional coloured header plus an ordered element list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InteractiveCard {
    header: Option<CardHeader>,
    elements: Vec<CardElement>,
}

impl InteractiveCard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_header(mut self, title: impl Into<String>, template: CardTemplate) -> Self {
        self.header = Some(CardHeader {
            title: title.into(),
            template,
        });
        self
    }

    pub fn with_markdown(mut self, content: impl Into<String>) -> Self {
        self.elements.push(CardElement::Markdown(content.into()));
        self
    }

    pub fn with_divider(mut self) -> Self {
        self.elements.push(CardElement::Divider);
        self
    }

    pub fn with_actions(mut self, actions: Vec<CardAction>) -> Self {
        if !actions.is_empty() {
            self.elements.push(CardElement::Actions(actions));
        }
        self
    }

    pub fn with_note(mut self, content: impl Into<String>) -> Self {
        self.elements.push(CardElement::Note(content.into()));
        self
    }

    pub fn header(&self) -> Option<&CardHeader> {
        self.header.as_ref()
    }

    pub fn elements(&self) -> &[CardElement] {
        &self.elements
    }

    /// All interactive actions, in element order.
    pub fn actions(&self) -> impl Iterator<Item = &CardAction> {
        self.elements.iter().flat_map(|e| match e {
            CardElement::Actions(actions) => actions.as_slice(),
            _ => &[],
        })
    }

    /// Concatenated markdown bodies, one per line.
    pub fn markdown_text(&self) -> String {
        self.elements
            .iter()
            .filter_map(|e| match e {
                CardElement::Markdown(md) => Some(md.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Render to the platform's interactive card JSON.
    pub fn render(&self) -> Value {
        let mut card = json!({
            "config": { "wide_screen_mode": true, "update_multi": true },
            "elements": self.elements.iter().map(render_element).collect::<Vec<_>>(),
        });
        if let Some(header) = &self.header {
            card["header"] = json!({
                "title": { "tag": "plain_text", "content": header.title },
                "template": header.template.as_str(),
            });
        }
        card
    }
}

fn render_element(element: &CardElement) -> Value {
    match element {
        CardElement::Markdown(content) => json!({
            "tag": "div",
            "text": { "tag": "lark_md", "content": content },
        }),
        CardElement::Divider => json!({ "tag": "hr" }),
        CardElement::Actions(actions) => json!({
            "tag": "action",
            "actions": actions.iter().map(render_action).collect::<Vec<_>>(),
        }),
        CardElement::Note(content) => json!({
            "tag": "note",
            "elements": [{ "tag": "plain_text", "content": content }],
        }),
    }
}

fn render_action(action: &CardAction) -> Value {
    match action {
        CardAction::Button {
            label,
            style,
            value,
        } => json!({
            "tag": "button",
            "text": { "tag": "plain_text", "content": label },
            "type": style.as_str(),
            "value": value,
        }),
        CardAction::Select {
            placeholder,
            options,
            value,
        } => json!({
            "tag": "select_static",
            "placeholder": { "tag": "plain_text", "content": placeholder },
            "options": options
                .iter()
                .map(|o| json!({
                    "text": { "tag": "plain_text", "content": o.label },
                    "value": o.value,
                }))
                .collect::<Vec<_>>(),
            "value": value,
        }),
    }
}
