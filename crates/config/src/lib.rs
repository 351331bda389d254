//! Configuration loading, validation and env substitution.
//!
//! Config files: `larkbot.toml`, `larkbot.yaml`, `larkbot.yml` or
//! `larkbot.json`, searched in `./` then the user config directory
//! (`~/.config/larkbot/` on Linux).
//!
//! String values may reference `${ENV_VAR}` or `${ENV_VAR:-fallback}`.

pub mod env_subst;
pub mod error;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    error::{Error, Result},
    loader::{apply_env_overrides, config_dir, data_dir, discover_and_load, load_config},
    schema::{
        BotConfig, CommandsConfig, LarkbotConfig, OpenAiConfig, PictureConfig, RecordsConfig,
        SessionsConfig,
    },
    validate::{Diagnostic, Severity, ValidationResult},
};
