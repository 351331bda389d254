use std::path::{Path, PathBuf};

use {
    clap::Subcommand,
    larkbot_config::LarkbotConfig,
    larkbot_records::{QaRecord, SqliteRecordStore},
};

#[derive(Subcommand)]
pub enum DbAction {
    /// Run all pending database migrations.
    Migrate,
    /// Delete the default record database (larkbot.db) completely.
    Reset,
}

/// Path of the default database file inside the data directory.
fn default_db_path(data_dir: &Path) -> PathBuf {
    data_dir.join("larkbot.db")
}

/// Record store URL, creating the data directory for the default location.
pub(crate) fn database_url(config: &LarkbotConfig) -> anyhow::Result<String> {
    let data_dir = larkbot_config::data_dir();
    if config.records.database_url.is_none() {
        std::fs::create_dir_all(&data_dir)?;
    }
    Ok(config.records.resolved_database_url(&data_dir))
}

pub async fn handle_db(config: &LarkbotConfig, action: DbAction) -> anyhow::Result<()> {
    match action {
        DbAction::Migrate => migrate(config).await,
        DbAction::Reset => reset(config),
    }
}

async fn migrate(config: &LarkbotConfig) -> anyhow::Result<()> {
    let url = database_url(config)?;
    println!("Running migrations for {url}...");
    let store = SqliteRecordStore::connect(&url).await?;
    let count = store.count().await?;
    store.close().await;
    println!("Migrations complete ({count} record(s) stored).");
    Ok(())
}

fn reset(config: &LarkbotConfig) -> anyhow::Result<()> {
    if let Some(url) = &config.records.database_url {
        anyhow::bail!("records.database_url is set to {url}; remove that database manually");
    }
    let deleted = remove_db_files(&default_db_path(&larkbot_config::data_dir()))?;
    if deleted.is_empty() {
        println!("No database files found.");
    } else {
        for path in &deleted {
            println!("Deleted: {}", path.display());
        }
        println!("Database files deleted. Run `larkbot db migrate` to recreate them.");
    }
    Ok(())
}

/// Delete a SQLite file and the WAL/SHM files next to it.
fn remove_db_files(db: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut deleted = Vec::new();
    for suffix in ["", "-wal", "-shm"] {
        let mut name = db.as_os_str().to_owned();
        name.push(suffix);
        let path = PathBuf::from(name);
        if path.exists() {
            std::fs::remove_file(&path)?;
            deleted.push(path);
        }
    }
    Ok(deleted)
}

pub async fn show_records(config: &LarkbotConfig, limit: u32) -> anyhow::Result<()> {
    let store = SqliteRecordStore::connect(&database_url(config)?).await?;
    let records = store.recent(limit).await?;
    store.close().await;

    if records.is_empty() {
        println!("No records yet.");
        return Ok(());
    }
    for record in &records {
        println!("{}", format_record(record));
    }
    Ok(())
}

fn format_record(record: &QaRecord) -> String {
    let who = if record.name.is_empty() {
        record.open_id.clone()
    } else {
        format!("{} ({})", record.name, record.open_id)
    };
    format!(
        "[{}] {who}\n  Q: {}\n  A: {}",
        record.created_at, record.question, record.answer
    )
}
