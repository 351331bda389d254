//! SQLite-backed record store using sqlx.

use {
    async_trait::async_trait,
    sqlx::{SqlitePool, sqlite::SqlitePoolOptions},
    tracing::debug,
};

use crate::{
    Result,
    store::{QaRecord, RecordStore},
};

#[derive(sqlx::FromRow)]
struct QaRow {
    open_id: String,
    name: String,
    question: String,
    answer: String,
    created_at: i64,
}

impl From<QaRow> for QaRecord {
    fn from(r: QaRow) -> Self {
        Self {
            open_id: r.open_id,
            name: r.name,
            question: r.question,
            answer: r.answer,
            created_at: r.created_at,
        }
    }
}

pub struct SqliteRecordStore {
    pool: SqlitePool,
}

impl SqliteRecordStore {
    /// Connect to `database_url` with a small pool and run migrations.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect(database_url)
            .await?;
        crate::run_migrations(&pool).await?;
        debug!(database_url, "record store ready");
        Ok(Self { pool })
    }

    /// Use an existing pool. Call [`crate::run_migrations`] first.
    pub fn with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Most recent records, newest first.
    pub async fn recent(&self, limit: u32) -> Result<Vec<QaRecord>> {
        let rows = sqlx::query_as::<_, QaRow>(
            "SELECT open_id, name, question, answer, created_at FROM qa_records \
             ORDER BY created_at DESC, id DESC LIMIT ?",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn count(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM qa_records")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn insert(&self, record: &QaRecord) -> Result<()> {
        sqlx::query(
            "INSERT INTO qa_records (open_id, name, question, answer, created_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&record.open_id)
        .bind(&record.name)
        .bind(&record.question)
        .bind(&record.answer)
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    async fn test_store() -> SqliteRecordStore {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        crate::run_migrations(&pool).await.unwrap();
        SqliteRecordStore::with_pool(pool)
    }

    fn record(question: &str, created_at: i64) -> QaRecord {
        QaRecord {
            open_id: "ou_1".into(),
            name: "Alice".into(),
            question: question.into(),
            answer: format!("answer to {question}"),
            created_at,
        }
    }

    #[tokio::test]
    async fn insert_and_read_back() {
        let store = test_store().await;
        store.insert(&record("hi", 100)).await.unwrap();

        let rows = store.recent(10).await.unwrap();
        assert_eq!(rows, vec![record("hi", 100)]);
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn recent_is_newest_first_and_limited() {
        let store = test_store().await;
        for (i, q) in ["a", "b", "c"].iter().enumerate() {
            store.insert(&record(q, 100 + i as i64)).await.unwrap();
        }

        let rows = store.recent(2).await.unwrap();
        let questions: Vec<&str> = rows.iter().map(|r| r.question.as_str()).collect();
        assert_eq!(questions, ["c", "b"]);
    }

    #[tokio::test]
    async fn migrations_are_idempotent() {
        let store = test_store().await;
        crate::run_migrations(&store.pool).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn connect_creates_database_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("larkbot.db");
        let url = format!("sqlite://{}?mode=rwc", path.display());

        let store = SqliteRecordStore::connect(&url).await.unwrap();
        store.insert(&QaRecord::new("ou_2", "", "q", "a")).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 1);
        store.close().await;
        assert!(path.exists());
    }

    #[test]
    fn new_record_is_timestamped() {
        let rec = QaRecord::new("ou", "n", "q", "a");
        assert!(rec.created_at > 1_600_000_000);
    }
}
