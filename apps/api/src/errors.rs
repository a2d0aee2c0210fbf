use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::polling::PollError;
use crate::runner::RunnerError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
/// Bodies are `{"error": <message>, "code": <CODE>}`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Job submission failed: {0}")]
    SubmissionFailed(String),

    #[error("Job run failed: {0}")]
    JobFailed(String),

    #[error("Output not ready: {0}")]
    NotReady(String),

    #[error("Request cancelled")]
    Cancelled,

    #[error("Malformed AI output: {0}")]
    MalformedOutput(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Runner error: {0}")]
    Runner(#[from] RunnerError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn missing_fields() -> Self {
        AppError::Validation("Missing required fields".to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<PollError> for AppError {
    fn from(err: PollError) -> Self {
        match err {
            PollError::JobFailed { .. } | PollError::EmptyCompletion => {
                AppError::JobFailed(err.to_string())
            }
            PollError::Exhausted { .. } => AppError::NotReady(err.to_string()),
            PollError::Cancelled { .. } => AppError::Cancelled,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "User not authenticated".to_string(),
            ),
            AppError::SubmissionFailed(msg) => {
                tracing::error!("Job submission failed: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "SUBMISSION_FAILED",
                    "Failed to initiate job run".to_string(),
                )
            }
            AppError::JobFailed(msg) => {
                tracing::error!("Job run failed: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "JOB_FAILED",
                    "AI generation failed".to_string(),
                )
            }
            AppError::NotReady(msg) => {
                tracing::warn!("Output not ready: {msg}");
                (
                    StatusCode::GATEWAY_TIMEOUT,
                    "NOT_READY",
                    "Output not available yet. Try again later.".to_string(),
                )
            }
            AppError::Cancelled => (
                StatusCode::SERVICE_UNAVAILABLE,
                "CANCELLED",
                "Request cancelled".to_string(),
            ),
            AppError::MalformedOutput(msg) => {
                tracing::error!("Malformed AI output: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "MALFORMED_OUTPUT",
                    "Invalid output returned from AI agent".to_string(),
                )
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Llm(msg) => {
                tracing::error!("LLM error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "LLM_ERROR",
                    "An AI processing error occurred".to_string(),
                )
            }
            AppError::Runner(e) => {
                tracing::error!("Runner error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "RUNNER_ERROR",
                    "The job runner could not be reached".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Internal Server Error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": message,
            "code": code,
        }));

        (status, body).into_response()
    }
}
