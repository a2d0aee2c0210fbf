//! In-process fakes for the injected collaborators, shared by unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

use crate::gateway::JobGateway;
use crate::history::{HistoryStore, NewHistoryRecord};
use crate::jobs::signature::SigningKey;
use crate::jobs::JobWorker;
use crate::llm_client::{LanguageModel, LlmError};
use crate::models::history::HistoryRow;
use crate::runner::{
    JobEvent, JobRunner, RunRecord, RunStatus, RunnerError, RunsResponse, SubmitResponse,
};
use crate::state::AppState;

pub const TEST_SIGNING_KEY: &str = "signkey-test-5ec2e7";

pub fn run(status: RunStatus, output: Option<Value>) -> RunRecord {
    RunRecord {
        run_id: Some("run-test".to_string()),
        status,
        output,
    }
}

#[derive(Clone)]
enum Step {
    Runs(Vec<RunRecord>),
    Error,
}

#[derive(Clone, Copy, PartialEq)]
enum SubmitMode {
    Accept,
    NoIds,
    Error,
}

/// A scripted [`JobRunner`]. Status queries consume the script in order, then
/// repeat the fallback step (or report no runs).
pub struct FakeRunner {
    script: Mutex<VecDeque<Step>>,
    fallback: Option<Step>,
    submit_mode: SubmitMode,
    echo: bool,
    submitted: Mutex<Vec<JobEvent>>,
    queries: AtomicUsize,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: None,
            submit_mode: SubmitMode::Accept,
            echo: false,
            submitted: Mutex::new(Vec::new()),
            queries: AtomicUsize::new(0),
        }
    }

    pub fn then_run(self, record: RunRecord) -> Self {
        self.then_runs(vec![record])
    }

    pub fn then_runs(self, records: Vec<RunRecord>) -> Self {
        self.script.lock().unwrap().push_back(Step::Runs(records));
        self
    }

    pub fn then_error(self) -> Self {
        self.script.lock().unwrap().push_back(Step::Error);
        self
    }

    pub fn always(mut self, record: RunRecord) -> Self {
        self.fallback = Some(Step::Runs(vec![record]));
        self
    }

    pub fn always_error(mut self) -> Self {
        self.fallback = Some(Step::Error);
        self
    }

    pub fn rejecting_submissions(mut self) -> Self {
        self.submit_mode = SubmitMode::Error;
        self
    }

    pub fn returning_no_ids(mut self) -> Self {
        self.submit_mode = SubmitMode::NoIds;
        self
    }

    /// Every handle immediately completes with `{ "output": <its event data> }`.
    pub fn echoing(mut self) -> Self {
        self.echo = true;
        self
    }

    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    pub fn submitted(&self) -> Vec<JobEvent> {
        self.submitted.lock().unwrap().clone()
    }
}

#[async_trait]
impl JobRunner for FakeRunner {
    async fn submit(&self, event: &JobEvent) -> Result<SubmitResponse, RunnerError> {
        match self.submit_mode {
            SubmitMode::Error => Err(RunnerError::Api {
                status: 503,
                message: "runner unavailable".to_string(),
            }),
            SubmitMode::NoIds => Ok(SubmitResponse::default()),
            SubmitMode::Accept => {
                let mut submitted = self.submitted.lock().unwrap();
                let handle = format!("run-{}", submitted.len());
                submitted.push(event.clone());
                Ok(SubmitResponse { ids: vec![handle] })
            }
        }
    }

    async fn get_runs(&self, handle: &str) -> Result<RunsResponse, RunnerError> {
        self.queries.fetch_add(1, Ordering::SeqCst);

        if self.echo {
            let index: usize = handle
                .trim_start_matches("run-")
                .parse()
                .map_err(|_| RunnerError::Api {
                    status: 404,
                    message: format!("unknown handle {handle}"),
                })?;
            let data = self.submitted.lock().unwrap()[index].data.clone();
            return Ok(RunsResponse {
                data: vec![run(RunStatus::Completed, Some(json!({ "output": data })))],
            });
        }

        let step = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .or_else(|| self.fallback.clone());

        match step {
            Some(Step::Runs(data)) => Ok(RunsResponse { data }),
            Some(Step::Error) => Err(RunnerError::Api {
                status: 502,
                message: "bad gateway".to_string(),
            }),
            None => Ok(RunsResponse::default()),
        }
    }
}

/// A [`LanguageModel`] that replays canned replies and records every prompt.
pub struct FakeModel {
    replies: Mutex<VecDeque<Result<String, LlmError>>>,
    prompts: Mutex<Vec<(String, String)>>,
}

impl FakeModel {
    pub fn replying(replies: &[&str]) -> Self {
        Self {
            replies: Mutex::new(replies.iter().map(|r| Ok(r.to_string())).collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            replies: Mutex::new(VecDeque::from([Err(LlmError::EmptyContent)])),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// `(system, prompt)` pairs in call order.
    pub fn prompts(&self) -> Vec<(String, String)> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for FakeModel {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, LlmError> {
        self.prompts
            .lock()
            .unwrap()
            .push((system.to_string(), prompt.to_string()));
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(LlmError::EmptyContent))
    }
}

#[derive(Default)]
pub struct MemoryHistoryStore {
    rows: Mutex<Vec<HistoryRow>>,
}

impl MemoryHistoryStore {
    pub fn rows(&self) -> Vec<HistoryRow> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn insert(&self, record: NewHistoryRecord) -> Result<HistoryRow, sqlx::Error> {
        let mut rows = self.rows.lock().unwrap();
        let row = HistoryRow {
            id: rows.len() as i64 + 1,
            record_id: record.record_id,
            content: record.content,
            user_email: record.user_email,
            ai_agent_type: record.ai_agent_type,
            created_at: Utc::now(),
            meta_data: record.meta_data,
        };
        rows.push(row.clone());
        Ok(row)
    }

    async fn update_content(&self, record_id: &str, content: &Value) -> Result<u64, sqlx::Error> {
        let mut updated = 0;
        for row in self.rows.lock().unwrap().iter_mut() {
            if row.record_id == record_id {
                row.content = content.clone();
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn find_by_record_id(&self, record_id: &str) -> Result<Option<HistoryRow>, sqlx::Error> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|row| row.record_id == record_id)
            .cloned())
    }

    async fn list_for_user(&self, user_email: &str) -> Result<Vec<HistoryRow>, sqlx::Error> {
        let mut rows: Vec<_> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|row| row.user_email == user_email)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(rows)
    }
}

pub struct TestHarness {
    pub state: AppState,
    pub runner: Arc<FakeRunner>,
    pub model: Arc<FakeModel>,
    pub history: Arc<MemoryHistoryStore>,
}

pub fn harness(runner: FakeRunner, model: FakeModel) -> TestHarness {
    let runner = Arc::new(runner);
    let model = Arc::new(model);
    let history = Arc::new(MemoryHistoryStore::default());

    let state = AppState {
        gateway: JobGateway::new(runner.clone()),
        worker: JobWorker::new(model.clone(), history.clone()),
        history: history.clone(),
        signing_key: SigningKey::new(TEST_SIGNING_KEY).unwrap(),
        shutdown: CancellationToken::new(),
    };

    TestHarness {
        state,
        runner,
        model,
        history,
    }
}
