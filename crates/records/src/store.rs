use std::time::{SystemTime, UNIX_EPOCH};

use {
    async_trait::async_trait,
    serde::{Deserialize, Serialize},
};

use crate::Result;

/// One answered question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaRecord {
    pub open_id: String,
    /// Sender display name; empty when the profile lookup failed.
    pub name: String,
    pub question: String,
    pub answer: String,
    /// Unix seconds.
    pub created_at: i64,
}

impl QaRecord {
    /// Build a record stamped with the current time.
    pub fn new(
        open_id: impl Into<String>,
        name: impl Into<String>,
        question: impl Into<String>,
        answer: impl Into<String>,
    ) -> Self {
        Self {
            open_id: open_id.into(),
            name: name.into(),
            question: question.into(),
            answer: answer.into(),
            created_at: now_secs(),
        }
    }
}

fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

/// Write-only sink for question/answer pairs.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn insert(&self, record: &QaRecord) -> Result<()>;
}
