//! Result Sink: persisted tool results that the UI reads back by record id.

pub mod handlers;
pub mod postgres;

use async_trait::async_trait;
use serde_json::Value;

use crate::models::history::HistoryRow;

pub use postgres::PgHistoryStore;

/// Fields supplied when a job (or the UI) stores a new result.
#[derive(Debug, Clone)]
pub struct NewHistoryRecord {
    pub record_id: String,
    pub content: Value,
    pub user_email: String,
    pub ai_agent_type: String,
    pub meta_data: Option<String>,
}

#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn insert(&self, record: NewHistoryRecord) -> Result<HistoryRow, sqlx::Error>;

    /// Replaces the content of every row with `record_id`. Returns rows touched.
    async fn update_content(&self, record_id: &str, content: &Value) -> Result<u64, sqlx::Error>;

    async fn find_by_record_id(&self, record_id: &str) -> Result<Option<HistoryRow>, sqlx::Error>;

    /// All of a user's records, newest first.
    async fn list_for_user(&self, user_email: &str) -> Result<Vec<HistoryRow>, sqlx::Error>;
}
