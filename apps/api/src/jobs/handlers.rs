use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;

use super::signature::SignedJson;
use crate::errors::AppError;
use crate::gateway::ToolKind;
use crate::state::AppState;

/// POST /api/jobs/:event
///
/// Runner callback. The body is the event's `data` object and must carry a
/// valid runner signature; the response body becomes the run's output. Any
/// error status makes the runner mark the run Failed.
pub async fn handle_job_event(
    State(state): State<AppState>,
    Path(event): Path<String>,
    SignedJson(data): SignedJson,
) -> Result<Json<Value>, AppError> {
    let tool = ToolKind::from_event_name(&event)
        .ok_or_else(|| AppError::NotFound(format!("No job function for event {event}")))?;

    let output = state.worker.execute(tool, data).await?;
    Ok(Json(output))
}
