//! Configuration validation.
//!
//! Checks syntax, unknown sections, type errors and a handful of semantic
//! problems (blank bot name, colliding command triggers, missing API key).

use std::{
    collections::HashMap,
    fmt,
    path::{Path, PathBuf},
};

use secrecy::ExposeSecret;

use crate::schema::LarkbotConfig;

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// One of "syntax", "unknown-field", "type-error", "semantic", "file-ref".
    pub category: &'static str,
    /// Dotted path, e.g. "commands.clear".
    pub path: String,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
    pub config_path: Option<PathBuf>,
}

impl ValidationResult {
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    fn push(&mut self, severity: Severity, category: &'static str, path: &str, message: String) {
        self.diagnostics.push(Diagnostic {
            severity,
            category,
            path: path.to_string(),
            message,
        });
    }
}

const KNOWN_SECTIONS: &[(&str, &[&str])] = &[
    ("bot", &["name", "notify_on_failure", "help_text"]),
    ("commands", &["clear", "help", "roleplay", "picture"]),
    ("sessions", &["idle_ttl_secs", "max_history_messages"]),
    ("picture", &["default_resolution"]),
    ("openai", &[
        "api_key",
        "base_url",
        "chat_model",
        "image_model",
        "transcription_model",
        "timeout_secs",
    ]),
    ("records", &["enabled", "database_url"]),
];

/// Validate a config file, or the discovered one when `path` is `None`.
#[must_use]
pub fn validate(path: Option<&Path>) -> ValidationResult {
    let config_path = path
        .map(Path::to_path_buf)
        .or_else(crate::loader::find_config_file);

    let Some(actual_path) = config_path else {
        let mut result = ValidationResult::default();
        result.push(
            Severity::Info,
            "file-ref",
            "",
            "no config file found; using defaults".into(),
        );
        return result;
    };

    let mut result = match std::fs::read_to_string(&actual_path) {
        Ok(content) => validate_toml_str(&crate::env_subst::substitute_env(&content)),
        Err(e) => {
            let mut result = ValidationResult::default();
            result.push(
                Severity::Error,
                "syntax",
                "",
                format!("failed to read config file: {e}"),
            );
            result
        },
    };
    result.config_path = Some(actual_path);
    result
}

/// Validate a TOML document without touching the filesystem.
#[must_use]
pub fn validate_toml_str(toml_str: &str) -> ValidationResult {
    let mut result = ValidationResult::default();

    let value: toml::Value = match toml::from_str(toml_str) {
        Ok(v) => v,
        Err(e) => {
            result.push(
                Severity::Error,
                "syntax",
                "",
                format!("TOML syntax error: {e}"),
            );
            return result;
        },
    };

    check_unknown_fields(&value, &mut result);

    match toml::from_str::<LarkbotConfig>(toml_str) {
        Ok(config) => check_semantics(&config, &mut result),
        Err(e) => result.push(
            Severity::Error,
            "type-error",
            "",
            format!("type error: {e}"),
        ),
    }

    result
}

fn check_unknown_fields(value: &toml::Value, result: &mut ValidationResult) {
    let Some(table) = value.as_table() else {
        return;
    };
    for (section, body) in table {
        let Some((_, fields)) = KNOWN_SECTIONS.iter().find(|(name, _)| name == section) else {
            result.push(
                Severity::Warning,
                "unknown-field",
                section,
                format!("unknown section `{section}`"),
            );
            continue;
        };
        let Some(body) = body.as_table() else {
            continue;
        };
        for key in body.keys() {
            if !fields.contains(&key.as_str()) {
                result.push(
                    Severity::Warning,
                    "unknown-field",
                    &format!("{section}.{key}"),
                    format!("unknown field `{key}` in [{section}]"),
                );
            }
        }
    }
}

fn check_semantics(config: &LarkbotConfig, result: &mut ValidationResult) {
    if config.bot.name.trim().is_empty() {
        result.push(
            Severity::Error,
            "semantic",
            "bot.name",
            "bot name is empty; group messages can never address the bot".into(),
        );
    }

    let triggers = [
        ("commands.clear", &config.commands.clear),
        ("commands.help", &config.commands.help),
        ("commands.roleplay", &config.commands.roleplay),
        ("commands.picture", &config.commands.picture),
    ];
    let mut owners: HashMap<&str, &str> = HashMap::new();
    for (path, list) in triggers {
        if list.iter().all(|t| t.trim().is_empty()) {
            result.push(
                Severity::Warning,
                "semantic",
                path,
                "no triggers configured; the command is unreachable".into(),
            );
        }
        for trigger in list.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
            if let Some(previous) = owners.insert(trigger, path)
                && previous != path
            {
                result.push(
                    Severity::Error,
                    "semantic",
                    path,
                    format!("trigger `{trigger}` is also used by {previous}"),
                );
            }
        }
    }

    if config.sessions.max_history_messages == 0 {
        result.push(
            Severity::Warning,
            "semantic",
            "sessions.max_history_messages",
            "history is disabled; every message starts a new conversation".into(),
        );
    }
    if config.sessions.idle_ttl_secs == 0 {
        result.push(
            Severity::Info,
            "semantic",
            "sessions.idle_ttl_secs",
            "session expiry disabled; sessions live until cleared".into(),
        );
    }

    let key_missing = config
        .openai
        .api_key
        .as_ref()
        .is_none_or(|k| k.expose_secret().trim().is_empty());
    if key_missing {
        result.push(
            Severity::Warning,
            "semantic",
            "openai.api_key",
            "no API key configured; completion calls will fail".into(),
        );
    }
}
