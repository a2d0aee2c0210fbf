use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::extractors::AppJson;
use crate::history::NewHistoryRecord;
use crate::models::history::HistoryRow;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryQuery {
    pub record_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertHistoryRequest {
    pub record_id: String,
    pub content: Value,
    pub ai_agent_type: String,
    pub meta_data: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateHistoryRequest {
    pub record_id: String,
    pub content: Value,
}

#[derive(Debug, Serialize)]
pub struct HistoryMutationResponse {
    pub message: &'static str,
    pub record: Option<HistoryRow>,
}

/// GET /api/history[?recordId=]
///
/// With a record id, returns that record. Without one, lists the caller's
/// records newest first.
pub async fn handle_get_history(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(params): Query<HistoryQuery>,
) -> Result<Json<Value>, AppError> {
    match params.record_id.filter(|id| !id.is_empty()) {
        Some(record_id) => {
            let row = state
                .history
                .find_by_record_id(&record_id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Record {record_id} not found")))?;
            Ok(Json(json!(row)))
        }
        None => {
            let rows = state.history.list_for_user(&user.email).await?;
            Ok(Json(json!(rows)))
        }
    }
}

/// POST /api/history
pub async fn handle_insert_history(
    State(state): State<AppState>,
    user: CurrentUser,
    AppJson(req): AppJson<InsertHistoryRequest>,
) -> Result<Json<HistoryMutationResponse>, AppError> {
    if req.record_id.trim().is_empty() || req.ai_agent_type.trim().is_empty() {
        return Err(AppError::missing_fields());
    }

    let row = state
        .history
        .insert(NewHistoryRecord {
            record_id: req.record_id,
            content: req.content,
            user_email: user.email,
            ai_agent_type: req.ai_agent_type,
            meta_data: req.meta_data,
        })
        .await?;

    Ok(Json(HistoryMutationResponse {
        message: "Record inserted successfully",
        record: Some(row),
    }))
}

/// PUT /api/history
///
/// Replaces the content of an existing record (edit / regenerate flows).
pub async fn handle_update_history(
    State(state): State<AppState>,
    _user: CurrentUser,
    AppJson(req): AppJson<UpdateHistoryRequest>,
) -> Result<Json<HistoryMutationResponse>, AppError> {
    let updated = state
        .history
        .update_content(&req.record_id, &req.content)
        .await?;
    if updated == 0 {
        return Err(AppError::NotFound(format!(
            "Record {} not found",
            req.record_id
        )));
    }

    Ok(Json(HistoryMutationResponse {
        message: "Record updated successfully",
        record: state.history.find_by_record_id(&req.record_id).await?,
    }))
}
