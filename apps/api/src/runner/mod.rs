//! Job runner boundary: the external service that executes submitted events
//! and records per-run status and output.
//!
//! The gateway only ever talks to the runner through [`JobRunner`], so handlers
//! and the poll loop can be exercised against a scripted fake.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub mod inngest;

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Runner API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// A named event plus its payload, as submitted to the runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobEvent {
    pub name: String,
    pub data: Value,
}

/// Response to a submission. The first id is the handle used for polling.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmitResponse {
    #[serde(default)]
    pub ids: Vec<String>,
}

impl SubmitResponse {
    pub fn handle(&self) -> Option<&str> {
        self.ids.first().map(String::as_str).filter(|id| !id.is_empty())
    }
}

/// Lifecycle state of one run. Anything the runner reports that we do not
/// recognise is treated as still pending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
    Cancelled,
    #[default]
    #[serde(other)]
    Pending,
}

impl RunStatus {
    /// True for states the run can never leave successfully.
    pub fn is_failure(self) -> bool {
        matches!(self, RunStatus::Failed | RunStatus::Cancelled)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    #[serde(default)]
    pub run_id: Option<String>,
    #[serde(default)]
    pub status: RunStatus,
    /// Untyped on purpose: different agent frameworks nest their output
    /// differently. See `polling::extract`.
    #[serde(default)]
    pub output: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunsResponse {
    #[serde(default)]
    pub data: Vec<RunRecord>,
}

impl RunsResponse {
    /// The run the gateway cares about. `None` means the runner has not
    /// scheduled it yet.
    pub fn current(&self) -> Option<&RunRecord> {
        self.data.first()
    }
}

#[async_trait]
pub trait JobRunner: Send + Sync {
    /// Schedules one durable job. Never retried by callers.
    async fn submit(&self, event: &JobEvent) -> Result<SubmitResponse, RunnerError>;

    /// Reads the runs spawned by a previously submitted event.
    async fn get_runs(&self, handle: &str) -> Result<RunsResponse, RunnerError>;
}
