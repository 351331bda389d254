use std::path::{Path, PathBuf};

use {
    secrecy::Secret,
    tracing::{debug, warn},
};

use crate::{
    Error, Result,
    env_subst::substitute_env,
    schema::LarkbotConfig,
};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "larkbot.toml",
    "larkbot.yaml",
    "larkbot.yml",
    "larkbot.json",
];

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> Result<LarkbotConfig> {
    let raw = std::fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.display().to_string(),
        source,
    })?;
    parse_config(&substitute_env(&raw), path)
}

/// Discover and load config from standard locations, then apply
/// environment overrides.
///
/// Search order:
/// 1. `./larkbot.{toml,yaml,yml,json}`
/// 2. `<user config dir>/larkbot.{toml,yaml,yml,json}`
///
/// Falls back to `LarkbotConfig::default()` when nothing is found or the file
/// fails to parse.
pub fn discover_and_load() -> LarkbotConfig {
    let mut config = match find_config_file() {
        Some(path) => {
            debug!(path = %path.display(), "loading config");
            load_config(&path).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
                LarkbotConfig::default()
            })
        },
        None => {
            debug!("no config file found, using defaults");
            LarkbotConfig::default()
        },
    };
    apply_env_overrides(&mut config);
    config
}

/// Find the first config file in standard locations.
pub(crate) fn find_config_file() -> Option<PathBuf> {
    let local = CONFIG_FILENAMES.iter().map(PathBuf::from);
    let global = config_dir()
        .into_iter()
        .flat_map(|dir| CONFIG_FILENAMES.iter().map(move |name| dir.join(name)));
    local.chain(global).find(|p| p.exists())
}

/// User-global config directory (`~/.config/larkbot/` on Linux).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "larkbot").map(|d| d.config_dir().to_path_buf())
}

/// User data directory, falling back to `./.larkbot` when no home exists.
pub fn data_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "larkbot")
        .map(|d| d.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".larkbot"))
}

/// Apply `LARKBOT_*` environment overrides on top of file values.
///
/// `OPENAI_API_KEY` is honoured when no key is configured anywhere else.
pub fn apply_env_overrides(config: &mut LarkbotConfig) {
    apply_env_overrides_with(config, |name| std::env::var(name).ok());
}

fn apply_env_overrides_with(config: &mut LarkbotConfig, lookup: impl Fn(&str) -> Option<String>) {
    let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(name) = get("LARKBOT_BOT_NAME") {
        config.bot.name = name;
    }
    if let Some(url) = get("LARKBOT_OPENAI_BASE_URL") {
        config.openai.base_url = url;
    }
    if let Some(key) = get("LARKBOT_OPENAI_API_KEY") {
        config.openai.api_key = Some(Secret::new(key));
    } else if config.openai.api_key.is_none()
        && let Some(key) = get("OPENAI_API_KEY")
    {
        config.openai.api_key = Some(Secret::new(key));
    }
    if let Some(url) = get("LARKBOT_DATABASE_URL") {
        config.records.database_url = Some(url);
    }
}

fn parse_config(raw: &str, path: &Path) -> Result<LarkbotConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        other => Err(Error::UnsupportedFormat(other.to_string())),
    }
}
