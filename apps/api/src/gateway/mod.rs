//! Job Gateway: one request/response cycle per tool call.
//! validate → submit exactly one job → poll → return output with the
//! caller's correlation id.

pub mod handlers;
pub mod tools;

use std::sync::Arc;

use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::errors::AppError;
use crate::polling::poll_for_output;
use crate::runner::{JobEvent, JobRunner};
pub use tools::{ToolKind, ToolSpec};

/// Tool-agnostic view of a client request. Every field is optional here so
/// that missing input surfaces as a validation error, not a decode error.
#[derive(Debug, Clone, Default)]
pub struct ToolRequest {
    pub correlation_id: Option<String>,
    pub user_email: Option<String>,
    pub input: Option<Value>,
    /// Extra event fields passed through untouched.
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToolResponse {
    pub output: Value,
    /// `(field name, correlation id)` echoed back to the client.
    pub correlation: Option<(&'static str, String)>,
}

impl ToolResponse {
    /// `{ "output": .., "<correlationField>": .. }`
    pub fn into_json(self) -> Value {
        let mut body = Map::new();
        body.insert("output".to_string(), self.output);
        if let Some((field, id)) = self.correlation {
            body.insert(field.to_string(), Value::String(id));
        }
        Value::Object(body)
    }
}

/// A request that passed validation.
#[derive(Debug)]
struct ValidRequest {
    correlation_id: Option<String>,
    user_email: Option<String>,
    input: Value,
    extra: Map<String, Value>,
}

fn validate(spec: &ToolSpec, request: ToolRequest) -> Result<ValidRequest, AppError> {
    let correlation_id = non_blank(request.correlation_id);
    let user_email = non_blank(request.user_email);
    let input = request.input.filter(has_content);

    let missing_correlation = spec.correlation_field.is_some() && correlation_id.is_none();
    let missing_user = spec.requires_user && user_email.is_none();

    match input {
        Some(input) if !missing_correlation && !missing_user => Ok(ValidRequest {
            correlation_id,
            user_email,
            input,
            extra: request.extra,
        }),
        _ => Err(AppError::missing_fields()),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

fn has_content(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        Value::Object(map) => !map.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Bool(_) | Value::Number(_) => true,
    }
}

fn build_event(spec: &ToolSpec, request: &ValidRequest) -> JobEvent {
    let mut data = request.extra.clone();
    if let (Some(field), Some(id)) = (spec.correlation_field, &request.correlation_id) {
        data.insert(field.to_string(), Value::String(id.clone()));
    }
    data.insert(spec.input_field.to_string(), request.input.clone());
    data.insert(
        "aiAgentType".to_string(),
        Value::String(spec.agent_type.to_string()),
    );
    if let Some(email) = &request.user_email {
        data.insert("userEmail".to_string(), Value::String(email.clone()));
    }

    JobEvent {
        name: spec.event_name.to_string(),
        data: Value::Object(data),
    }
}

#[derive(Clone)]
pub struct JobGateway {
    runner: Arc<dyn JobRunner>,
}

impl JobGateway {
    pub fn new(runner: Arc<dyn JobRunner>) -> Self {
        Self { runner }
    }

    /// Runs one full tool call. Submission is never retried; status queries
    /// are retried within the tool's poll budget.
    pub async fn run(
        &self,
        tool: ToolKind,
        request: ToolRequest,
        cancel: &CancellationToken,
    ) -> Result<ToolResponse, AppError> {
        let spec = tool.spec();
        let request = validate(spec, request)?;

        if cancel.is_cancelled() {
            return Err(AppError::Cancelled);
        }

        let event = build_event(spec, &request);
        let submitted = self
            .runner
            .submit(&event)
            .await
            .map_err(|e| AppError::SubmissionFailed(format!("{}: {e}", spec.event_name)))?;
        let handle = submitted.handle().ok_or_else(|| {
            AppError::SubmissionFailed(format!("{}: runner returned no run id", spec.event_name))
        })?;

        info!(
            "Submitted {} as {} (correlation id {:?})",
            spec.event_name, handle, request.correlation_id
        );

        let output = poll_for_output(self.runner.as_ref(), handle, &spec.poll, cancel).await?;

        Ok(ToolResponse {
            output,
            correlation: spec.correlation_field.zip(request.correlation_id),
        })
    }
}
