/// Config schema: bot identity, command triggers, session policy, picture
/// defaults, completion backend and record store.
use std::path::Path;

use {
    larkbot_common::types::Resolution,
    secrecy::Secret,
    serde::Deserialize,
};

/// Root configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LarkbotConfig {
    pub bot: BotConfig,
    pub commands: CommandsConfig,
    pub sessions: SessionsConfig,
    pub picture: PictureConfig,
    pub openai: OpenAiConfig,
    pub records: RecordsConfig,
}

/// Bot identity and reply policy.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Display name the platform puts into mentions. In group chats the bot
    /// only answers when it is the single mention and the name matches.
    pub name: String,
    /// Send a short text notice when a completion call fails. Off by default:
    /// failures halt the chain silently and are only logged.
    pub notify_on_failure: bool,
    /// Markdown body of the help card. The built-in text is used when unset.
    pub help_text: Option<String>,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: "larkbot".into(),
            notify_on_failure: false,
            help_text: None,
        }
    }
}

/// Command triggers matched against the trimmed message text.
///
/// `clear` and `help` match the whole text; `roleplay` and `picture` match as
/// prefixes and take the remainder as their argument.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CommandsConfig {
    pub clear: Vec<String>,
    pub help: Vec<String>,
    pub roleplay: Vec<String>,
    pub picture: Vec<String>,
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self {
            clear: vec!["/clear".into(), "清除".into()],
            help: vec!["/help".into(), "帮助".into()],
            roleplay: vec!["/system ".into(), "角色扮演 ".into()],
            picture: vec!["/picture".into(), "图片创作".into()],
        }
    }
}

/// Session lifetime and history policy.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionsConfig {
    /// Idle seconds after which a session is dropped. `0` disables expiry.
    pub idle_ttl_secs: u64,
    /// Upper bound on stored history turns, system prompt included.
    pub max_history_messages: usize,
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            idle_ttl_secs: 12 * 60 * 60,
            max_history_messages: 40,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PictureConfig {
    /// Resolution used when a session has not picked one.
    pub default_resolution: Resolution,
}

/// OpenAI-compatible completion backend.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    pub api_key: Option<Secret<String>>,
    pub base_url: String,
    pub chat_model: String,
    pub image_model: String,
    pub transcription_model: String,
    pub timeout_secs: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com/v1".into(),
            chat_model: "gpt-4o-mini".into(),
            image_model: "dall-e-2".into(),
            transcription_model: "whisper-1".into(),
            timeout_secs: 120,
        }
    }
}

/// Question/answer record persistence.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RecordsConfig {
    pub enabled: bool,
    /// SQLite URL. Defaults to `larkbot.db` in the data directory.
    pub database_url: Option<String>,
}

impl Default for RecordsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            database_url: None,
        }
    }
}

impl RecordsConfig {
    /// The configured URL, or a `sqlite://` URL inside `data_dir`.
    pub fn resolved_database_url(&self, data_dir: &Path) -> String {
        match self.database_url.as_deref().filter(|u| !u.trim().is_empty()) {
            Some(url) => url.to_string(),
            None => format!(
                "sqlite://{}?mode=rwc",
                data_dir.join("larkbot.db").display()
            ),
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, secrecy::ExposeSecret};

    #[test]
    fn defaults() {
        let cfg = LarkbotConfig::default();
        assert_eq!(cfg.bot.name, "larkbot");
        assert!(!cfg.bot.notify_on_failure);
        assert!(cfg.commands.clear.contains(&"/clear".to_string()));
        assert_eq!(cfg.commands.roleplay, ["/system ", "角色扮演 "]);
        assert_eq!(cfg.sessions.idle_ttl_secs, 43_200);
        assert_eq!(cfg.picture.default_resolution, Resolution::Small);
        assert!(cfg.openai.api_key.is_none());
        assert!(cfg.records.enabled);
    }

    #[test]
    fn deserialize_partial_toml() {
        let raw = r#"
            [bot]
            name = "helper"

            [picture]
            default_resolution = "512x512"

            [openai]
            api_key = "sk-abc"
            chat_model = "gpt-4o"
        "#;
        let cfg: LarkbotConfig = toml::from_str(raw).unwrap();
        assert_eq!(cfg.bot.name, "helper");
        assert_eq!(cfg.picture.default_resolution, Resolution::Medium);
        assert_eq!(
            cfg.openai.api_key.as_ref().map(|k| k.expose_secret().as_str()),
            Some("sk-abc")
        );
        assert_eq!(cfg.openai.chat_model, "gpt-4o");
        // untouched sections keep defaults
        assert_eq!(cfg.openai.transcription_model, "whisper-1");
        assert_eq!(cfg.sessions.max_history_messages, 40);
    }

    #[test]
    fn api_key_is_redacted_in_debug() {
        let raw = r#"
            [openai]
            api_key = "sk-secret-value"
        "#;
        let cfg: LarkbotConfig = toml::from_str(raw).unwrap();
        let debug = format!("{cfg:?}");
        assert!(!debug.contains("sk-secret-value"));
    }

    #[test]
    fn database_url_defaults_into_data_dir() {
        let records = RecordsConfig::default();
        let url = records.resolved_database_url(Path::new("/var/lib/larkbot"));
        assert_eq!(url, "sqlite:///var/lib/larkbot/larkbot.db?mode=rwc");

        let explicit = RecordsConfig {
            database_url: Some("sqlite::memory:".into()),
            ..Default::default()
        };
        assert_eq!(
            explicit.resolved_database_url(Path::new("/ignored")),
            "sqlite::memory:"
        );
    }
}
