//! Question/answer record persistence.
//!
//! The dispatcher writes one [`QaRecord`] per answered chat message through
//! the [`RecordStore`] trait; [`SqliteRecordStore`] is the bundled backend.

pub mod error;
pub mod store;
pub mod store_sqlite;

pub use {
    error::{Error, Result},
    store::{QaRecord, RecordStore},
    store_sqlite::SqliteRecordStore,
};

/// Run database migrations for the records crate.
///
/// Creates the `qa_records` table. Safe to call on every startup.
pub async fn run_migrations(pool: &sqlx::SqlitePool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .set_ignore_missing(true)
        .run(pool)
        .await?;
    Ok(())
}
