//! Axum route handlers for the tool endpoints.

use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::extractors::AppJson;
use crate::gateway::{ToolKind, ToolRequest};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeAgentRequest {
    pub record_id: Option<String>,
    pub resume_text: Option<String>,
    /// Where the uploaded original is stored, kept as the record's metadata.
    pub resume_file_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CoverLetterAgentRequest {
    pub coverid: Option<String>,
    #[serde(rename = "userInput")]
    pub user_input: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoadmapAgentRequest {
    pub roadmap_id: Option<String>,
    pub user_input: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CareerChatRequest {
    pub user_input: Option<Value>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// Submits the request as a job and waits for its output. The request's
/// cancellation token fires if the handler is dropped (client disconnect) or
/// the server shuts down.
async fn run_tool(
    state: &AppState,
    tool: ToolKind,
    request: ToolRequest,
) -> Result<Json<Value>, AppError> {
    let cancel = state.shutdown.child_token();
    let _guard = cancel.clone().drop_guard();

    let response = state.gateway.run(tool, request, &cancel).await?;
    Ok(Json(response.into_json()))
}

/// POST /api/ai-resume-agent
pub async fn handle_resume_agent(
    State(state): State<AppState>,
    user: Option<CurrentUser>,
    AppJson(body): AppJson<ResumeAgentRequest>,
) -> Result<Json<Value>, AppError> {
    let mut extra = Map::new();
    if let Some(url) = body.resume_file_url {
        extra.insert("resumeFileUrl".to_string(), Value::String(url));
    }

    let request = ToolRequest {
        correlation_id: body.record_id,
        user_email: user.map(|u| u.email),
        input: body.resume_text.map(Value::String),
        extra,
    };
    run_tool(&state, ToolKind::ResumeAnalyzer, request).await
}

/// POST /api/ai-cover-letter-agent
pub async fn handle_cover_letter_agent(
    State(state): State<AppState>,
    user: Option<CurrentUser>,
    AppJson(body): AppJson<CoverLetterAgentRequest>,
) -> Result<Json<Value>, AppError> {
    let request = ToolRequest {
        correlation_id: body.coverid,
        user_email: user.map(|u| u.email),
        input: body.user_input,
        ..Default::default()
    };
    run_tool(&state, ToolKind::CoverLetter, request).await
}

/// POST /api/ai-roadmap-agent
pub async fn handle_roadmap_agent(
    State(state): State<AppState>,
    user: Option<CurrentUser>,
    AppJson(body): AppJson<RoadmapAgentRequest>,
) -> Result<Json<Value>, AppError> {
    let request = ToolRequest {
        correlation_id: body.roadmap_id,
        user_email: user.map(|u| u.email),
        input: body.user_input,
        ..Default::default()
    };
    run_tool(&state, ToolKind::Roadmap, request).await
}

/// POST /api/ai-career-chat-agent
pub async fn handle_career_chat_agent(
    State(state): State<AppState>,
    user: Option<CurrentUser>,
    AppJson(body): AppJson<CareerChatRequest>,
) -> Result<Json<Value>, AppError> {
    let request = ToolRequest {
        user_email: user.map(|u| u.email),
        input: body.user_input,
        ..Default::default()
    };
    run_tool(&state, ToolKind::CareerChat, request).await
}
