//! Console channel: stdin lines in, replies on stdout.
//!
//! Every line is a message in the current topic. Lines starting with `{`
//! are card callbacks (paste the JSON printed under a card button), and a
//! few `:` commands drive the rest.

use std::{
    path::PathBuf,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use {
    async_trait::async_trait,
    base64::{Engine as _, engine::general_purpose::STANDARD},
    clap::Args,
    larkbot_channels::{CardAction, CardElement, ChannelOutbound, InteractiveCard},
    larkbot_config::LarkbotConfig,
    larkbot_dispatch::{BotServices, CardCallback, InboundEvent, MessageHandler, TokioSpawner},
    larkbot_providers::{AudioSource, FsAudioSource, OpenAiCompatEngine},
    larkbot_records::SqliteRecordStore,
    larkbot_sessions::{MemoryDedupCache, MemorySessionCache, SessionCache, SessionPolicy},
    serde_json::{Value, json},
    tokio::io::{AsyncBufReadExt, BufReader},
    tokio_util::sync::CancellationToken,
    tracing::{debug, info, warn},
};

use crate::db_commands;

const SENDER_ID: &str = "ou_console";
const CHAT_ID: &str = "oc_console";
const PURGE_INTERVAL: Duration = Duration::from_secs(600);

const USAGE: &str = "\
Type a message and press enter. Replies continue the current topic.
  :new                 start a new topic
  :audio <path>        send an audio file
  {...}                send a card callback (the JSON printed under a card action)
  :select <opt> {...}  answer a select action with <opt>
  :help                show this help
  :quit                exit";

#[derive(Debug, Default, Args)]
pub struct ConsoleArgs {
    /// Only accept `:audio` paths inside this directory.
    #[arg(long)]
    audio_dir: Option<PathBuf>,
    /// Directory generated images are written to (default: current directory).
    #[arg(long)]
    image_dir: Option<PathBuf>,
}

pub async fn run(config: LarkbotConfig, args: ConsoleArgs) -> anyhow::Result<()> {
    let sessions = Arc::new(MemorySessionCache::new(SessionPolicy::from_secs(
        config.sessions.idle_ttl_secs,
        config.sessions.max_history_messages,
    )));
    let audio: Arc<dyn AudioSource> = match args.audio_dir {
        Some(dir) => Arc::new(FsAudioSource::new(dir)),
        None => Arc::new(FsAudioSource::unrestricted()),
    };
    let engine = Arc::new(OpenAiCompatEngine::from_config(&config.openai, audio)?);
    let outbound = Arc::new(ConsoleOutbound::new(
        args.image_dir.unwrap_or_else(|| PathBuf::from(".")),
    ));
    let spawner = Arc::new(TokioSpawner::new());
    let records = if config.records.enabled {
        let url = db_commands::database_url(&config)?;
        Some(Arc::new(SqliteRecordStore::connect(&url).await?))
    } else {
        None
    };

    let mut services = BotServices::new(
        Arc::new(config),
        sessions.clone(),
        Arc::new(MemoryDedupCache::new()),
        engine,
        outbound,
        spawner.clone(),
    );
    if let Some(store) = &records {
        services = services.with_records(store.clone());
    }
    let handler = MessageHandler::new(services);

    let stop = CancellationToken::new();
    let purge = tokio::spawn(purge_sessions(sessions, stop.clone()));

    println!("{USAGE}\n");
    let mut console = Console::new(handler.clone());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            break;
        };
        match parse_line(&line) {
            Ok(input) => {
                if !console.handle(input).await {
                    break;
                }
            },
            Err(e) => println!("invalid callback JSON: {e}"),
        }
    }

    info!("console shutting down");
    handler.shutdown();
    stop.cancel();
    spawner.wait_idle().await;
    if let Err(e) = purge.await {
        warn!(error = %e, "session purge task failed");
    }
    if let Some(store) = records {
        store.close().await;
    }
    Ok(())
}

async fn purge_sessions(sessions: Arc<MemorySessionCache>, stop: CancellationToken) {
    let mut ticker = tokio::time::interval(PURGE_INTERVAL);
    ticker.tick().await;
    loop {
        tokio::select! {
            _ = stop.cancelled() => break,
            _ = ticker.tick() => match sessions.purge_expired().await {
                Ok(0) => {},
                Ok(purged) => debug!(purged, "expired sessions purged"),
                Err(e) => warn!(error = %e, "session purge failed"),
            },
        }
    }
}

#[derive(Debug)]
enum ConsoleInput {
    Blank,
    Usage,
    Quit,
    NewTopic,
    Text(String),
    Audio(String),
    Callback(CardCallback),
}

fn parse_line(line: &str) -> serde_json::Result<ConsoleInput> {
    let line = line.trim();
    let input = match line {
        "" => ConsoleInput::Blank,
        ":help" => ConsoleInput::Usage,
        ":quit" | ":q" => ConsoleInput::Quit,
        ":new" => ConsoleInput::NewTopic,
        _ if line.starts_with('{') => ConsoleInput::Callback(parse_callback(line)?),
        _ => {
            if let Some(path) = line.strip_prefix(":audio ") {
                ConsoleInput::Audio(path.trim().to_string())
            } else if let Some(rest) = line.strip_prefix(":select ") {
                match rest.trim().split_once(char::is_whitespace) {
                    Some((option, raw)) => {
                        ConsoleInput::Callback(parse_callback(raw.trim())?.with_option(option))
                    },
                    None => ConsoleInput::Usage,
                }
            } else {
                ConsoleInput::Text(line.to_string())
            }
        },
    };
    Ok(input)
}

/// Accepts either a bare action value or a full callback object.
fn parse_callback(raw: &str) -> serde_json::Result<CardCallback> {
    let value: Value = serde_json::from_str(raw)?;
    if value.get("kind").is_some() {
        return Ok(CardCallback {
            open_id: SENDER_ID.to_string(),
            ..CardCallback::new(value)
        });
    }
    let mut callback: CardCallback = serde_json::from_value(value)?;
    if callback.open_id.is_empty() {
        callback.open_id = SENDER_ID.to_string();
    }
    Ok(callback)
}

struct Console {
    handler: MessageHandler,
    thread_root: Option<String>,
}

impl Console {
    fn new(handler: MessageHandler) -> Self {
        Self {
            handler,
            thread_root: None,
        }
    }

    /// Returns `false` when the console should exit.
    async fn handle(&mut self, input: ConsoleInput) -> bool {
        match input {
            ConsoleInput::Blank => {},
            ConsoleInput::Quit => return false,
            ConsoleInput::Usage => println!("{USAGE}"),
            ConsoleInput::NewTopic => {
                self.thread_root = None;
                println!("-- new topic --");
            },
            ConsoleInput::Text(text) => {
                let event = self.next_event("text", json!({ "text": text }));
                self.handler.on_message(event).await;
            },
            ConsoleInput::Audio(path) => {
                let event = self.next_event("audio", json!({ "file_key": path }));
                self.handler.on_message(event).await;
            },
            ConsoleInput::Callback(callback) => {
                if let Some(card) = self.handler.on_card_action(callback).await {
                    println!("{}", render_card(&card));
                }
            },
        }
        true
    }

    /// A direct message in the current topic; the first message of a topic
    /// becomes its root.
    fn next_event(&mut self, message_type: &str, content: Value) -> InboundEvent {
        let message_id = format!("om_{}", uuid::Uuid::new_v4().simple());
        let root_id = self
            .thread_root
            .get_or_insert_with(|| message_id.clone())
            .clone();
        InboundEvent {
            sender_id: SENDER_ID.into(),
            chat_id: CHAT_ID.into(),
            chat_type: "p2p".into(),
            message_id,
            root_id: Some(root_id),
            message_type: message_type.into(),
            content: content.to_string(),
            mentions: Vec::new(),
        }
    }
}

/// Prints replies and writes images to disk.
struct ConsoleOutbound {
    image_dir: PathBuf,
    saved: AtomicUsize,
}

impl ConsoleOutbound {
    fn new(image_dir: PathBuf) -> Self {
        Self {
            image_dir,
            saved: AtomicUsize::new(0),
        }
    }

    async fn save_image(&self, msg_id: &str, image_base64: &str) -> larkbot_channels::Result<PathBuf> {
        let bytes = STANDARD
            .decode(image_base64.trim())
            .map_err(|e| larkbot_channels::Error::external("decode image", e))?;
        let n = self.saved.fetch_add(1, Ordering::Relaxed) + 1;
        let path = self.image_dir.join(format!("{msg_id}-{n}.png"));
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| larkbot_channels::Error::external(format!("write {}", path.display()), e))?;
        Ok(path)
    }
}

#[async_trait]
impl ChannelOutbound for ConsoleOutbound {
    async fn reply_text(&self, _msg_id: &str, text: &str) -> larkbot_channels::Result<()> {
        println!("bot> {text}\n");
        Ok(())
    }

    async fn reply_image(&self, msg_id: &str, image_base64: &str) -> larkbot_channels::Result<()> {
        let path = self.save_image(msg_id, image_base64).await?;
        println!("bot> [image saved to {}]\n", path.display());
        Ok(())
    }

    async fn reply_card(&self, _msg_id: &str, card: &InteractiveCard) -> larkbot_channels::Result<()> {
        println!("{}", render_card(card));
        Ok(())
    }
}

fn render_card(card: &InteractiveCard) -> String {
    let mut out = Vec::new();
    if let Some(header) = card.header() {
        out.push(format!("== {} ==", header.title));
    }
    for element in card.elements() {
        match element {
            CardElement::Markdown(md) => out.push(md.clone()),
            CardElement::Divider => out.push("----".into()),
            CardElement::Note(note) => out.push(format!("({note})")),
            CardElement::Actions(actions) => out.extend(actions.iter().map(render_action)),
        }
    }
    out.push(String::new());
    out.join("\n")
}

fn render_action(action: &CardAction) -> String {
    match action {
        CardAction::Button { label, value, .. } => format!("  [{label}] {value}"),
        CardAction::Select {
            placeholder,
            options,
            value,
        } => {
            let choices: Vec<&str> = options.iter().map(|o| o.value.as_str()).collect();
            format!(
                "  <{placeholder}: {}> :select <option> {value}",
                choices.join(" | ")
            )
        },
    }
}
