mod config_commands;
mod console;
mod db_commands;

use std::path::{Path, PathBuf};

use {
    clap::{Parser, Subcommand},
    larkbot_config::LarkbotConfig,
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "larkbot", about = "larkbot, a Feishu/Lark chat bot dispatcher")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file to load instead of searching the standard locations.
    #[arg(long, global = true, env = "LARKBOT_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the bot on stdin/stdout (default when no subcommand is provided).
    Console(console::ConsoleArgs),
    /// Database management.
    Db {
        #[command(subcommand)]
        action: db_commands::DbAction,
    },
    /// Show the most recent question/answer records.
    Records {
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
    /// Configuration management.
    Config {
        #[command(subcommand)]
        action: config_commands::ConfigAction,
    },
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    // Logs go to stderr so console replies on stdout stay readable.
    if cli.json_logs {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

/// Load the explicit config file, or discover one.
fn load_config(path: Option<&Path>) -> anyhow::Result<LarkbotConfig> {
    match path {
        Some(path) => {
            let mut config = larkbot_config::load_config(path)?;
            larkbot_config::apply_env_overrides(&mut config);
            Ok(config)
        },
        None => Ok(larkbot_config::discover_and_load()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "larkbot starting");

    match cli.command {
        None => {
            let config = load_config(cli.config.as_deref())?;
            console::run(config, console::ConsoleArgs::default()).await
        },
        Some(Commands::Console(args)) => {
            let config = load_config(cli.config.as_deref())?;
            console::run(config, args).await
        },
        Some(Commands::Db { action }) => {
            let config = load_config(cli.config.as_deref())?;
            db_commands::handle_db(&config, action).await
        },
        Some(Commands::Records { limit }) => {
            let config = load_config(cli.config.as_deref())?;
            db_commands::show_records(&config, limit).await
        },
        Some(Commands::Config { action }) => {
            config_commands::handle_config(cli.config.as_deref(), action)
        },
    }
}
