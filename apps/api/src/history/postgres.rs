use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use tracing::info;

use super::{HistoryStore, NewHistoryRecord};
use crate::models::history::HistoryRow;

#[derive(Clone)]
pub struct PgHistoryStore {
    pool: PgPool,
}

impl PgHistoryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HistoryStore for PgHistoryStore {
    async fn insert(&self, record: NewHistoryRecord) -> Result<HistoryRow, sqlx::Error> {
        let row = sqlx::query_as::<_, HistoryRow>(
            r#"
            INSERT INTO history (record_id, content, user_email, ai_agent_type, meta_data)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&record.record_id)
        .bind(&record.content)
        .bind(&record.user_email)
        .bind(&record.ai_agent_type)
        .bind(&record.meta_data)
        .fetch_one(&self.pool)
        .await?;

        info!(
            "Stored {} record {} for {}",
            row.ai_agent_type, row.record_id, row.user_email
        );
        Ok(row)
    }

    async fn update_content(&self, record_id: &str, content: &Value) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("UPDATE history SET content = $1 WHERE record_id = $2")
            .bind(content)
            .bind(record_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn find_by_record_id(&self, record_id: &str) -> Result<Option<HistoryRow>, sqlx::Error> {
        sqlx::query_as::<_, HistoryRow>(
            "SELECT * FROM history WHERE record_id = $1 ORDER BY id DESC LIMIT 1",
        )
        .bind(record_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn list_for_user(&self, user_email: &str) -> Result<Vec<HistoryRow>, sqlx::Error> {
        sqlx::query_as::<_, HistoryRow>(
            "SELECT * FROM history WHERE user_email = $1 ORDER BY id DESC",
        )
        .bind(user_email)
        .fetch_all(&self.pool)
        .await
    }
}
