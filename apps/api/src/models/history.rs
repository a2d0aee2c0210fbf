use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

/// One persisted tool result, keyed by the caller's correlation id.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRow {
    pub id: i64,
    pub record_id: String,
    pub content: Value,
    pub user_email: String,
    pub ai_agent_type: String,
    pub created_at: DateTime<Utc>,
    pub meta_data: Option<String>,
}
