//! Poll Loop: waits for a submitted job's output under a fixed budget.
//!
//! One loop per job handle. Queries are strictly sequential:
//! query → evaluate → delay → query. Every wait races the caller's
//! cancellation token, so a dropped request stops polling promptly.

pub mod extract;

use std::time::Duration;

use serde_json::Value;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::runner::{JobRunner, RunRecord, RunStatus};
use extract::extract_output;

/// When a run counts as finished successfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalStrategy {
    /// Return as soon as any extractable output appears (strategy A).
    FirstOutput,
    /// Return only once the runner reports `Completed` (strategy B).
    CompletedOnly,
}

/// Budget and cadence for one poll loop. There is no unbounded variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    max_attempts: u32,
    delay: Duration,
    strategy: TerminalStrategy,
}

impl PollConfig {
    /// `max_attempts` is clamped to at least one query.
    pub const fn new(max_attempts: u32, delay: Duration, strategy: TerminalStrategy) -> Self {
        Self {
            max_attempts: if max_attempts == 0 { 1 } else { max_attempts },
            delay,
            strategy,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Worst-case time spent sleeping between queries.
    pub fn budget(&self) -> Duration {
        self.delay * self.max_attempts.saturating_sub(1)
    }
}

#[derive(Debug, Error)]
pub enum PollError {
    #[error("run {run_id:?} reported {status:?}")]
    JobFailed {
        run_id: Option<String>,
        status: RunStatus,
    },

    #[error("run completed without any output")]
    EmptyCompletion,

    #[error("no output after {attempts} attempts")]
    Exhausted { attempts: u32 },

    #[error("polling cancelled after {attempts} attempts")]
    Cancelled { attempts: u32 },
}

/// Outcome of evaluating a single status snapshot.
#[derive(Debug, PartialEq)]
enum Verdict {
    Ready(Value),
    Failed,
    EmptyCompletion,
    Pending,
}

fn evaluate(run: Option<&RunRecord>, strategy: TerminalStrategy) -> Verdict {
    let Some(run) = run else {
        return Verdict::Pending;
    };

    if run.status.is_failure() {
        return Verdict::Failed;
    }

    let completed = run.status == RunStatus::Completed;
    let ready = match strategy {
        TerminalStrategy::FirstOutput => true,
        TerminalStrategy::CompletedOnly => completed,
    };

    match (ready, extract_output(run.output.as_ref())) {
        (true, Some(output)) => Verdict::Ready(output),
        _ if completed => Verdict::EmptyCompletion,
        _ => Verdict::Pending,
    }
}

/// Polls `handle` until its output is available, the run fails, the budget is
/// spent, or `cancel` fires.
///
/// A failing status query is treated as transient: it is logged, counts
/// against the budget, and polling continues.
pub async fn poll_for_output(
    runner: &dyn JobRunner,
    handle: &str,
    config: &PollConfig,
    cancel: &CancellationToken,
) -> Result<Value, PollError> {
    for attempt in 1..=config.max_attempts {
        let query = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(PollError::Cancelled { attempts: attempt - 1 });
            }
            result = runner.get_runs(handle) => result,
        };

        match query {
            Ok(runs) => {
                let run = runs.current();
                match evaluate(run, config.strategy) {
                    Verdict::Ready(output) => {
                        info!("Run for {handle} produced output on attempt {attempt}");
                        return Ok(output);
                    }
                    Verdict::Failed => {
                        error!("Job run for {handle} failed: {run:?}");
                        let run = run.cloned().unwrap_or_default();
                        return Err(PollError::JobFailed {
                            run_id: run.run_id,
                            status: run.status,
                        });
                    }
                    Verdict::EmptyCompletion => {
                        error!("Job run for {handle} completed without output: {run:?}");
                        return Err(PollError::EmptyCompletion);
                    }
                    Verdict::Pending => {
                        debug!(
                            "Attempt {}/{} for {}: status={:?}",
                            attempt,
                            config.max_attempts,
                            handle,
                            run.map(|r| r.status)
                        );
                    }
                }
            }
            Err(e) => {
                warn!(
                    "Attempt {}/{} for {}: status query failed, will retry: {e}",
                    attempt, config.max_attempts, handle
                );
            }
        }

        if attempt < config.max_attempts {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return Err(PollError::Cancelled { attempts: attempt });
                }
                _ = tokio::time::sleep(config.delay) => {}
            }
        }
    }

    warn!(
        "No output for {handle} after {} attempts",
        config.max_attempts
    );
    Err(PollError::Exhausted {
        attempts: config.max_attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{run, FakeRunner};
    use serde_json::json;
    use tokio::time::Instant;

    const A: TerminalStrategy = TerminalStrategy::FirstOutput;
    const B: TerminalStrategy = TerminalStrategy::CompletedOnly;

    fn config(max_attempts: u32, delay_ms: u64, strategy: TerminalStrategy) -> PollConfig {
        PollConfig::new(max_attempts, Duration::from_millis(delay_ms), strategy)
    }

    #[test]
    fn test_zero_attempts_is_clamped_to_one() {
        assert_eq!(config(0, 500, A).max_attempts(), 1);
    }

    #[test]
    fn test_budget_excludes_trailing_delay() {
        assert_eq!(config(90, 1000, A).budget(), Duration::from_secs(89));
    }

    #[test]
    fn test_evaluate_failed_wins_over_output() {
        let failed = run(RunStatus::Failed, Some(json!({"error": "boom"})));
        assert_eq!(evaluate(Some(&failed), A), Verdict::Failed);
    }

    #[test]
    fn test_evaluate_strategy_a_accepts_running_with_output() {
        let running = run(RunStatus::Running, Some(json!({"output": "partial"})));
        assert_eq!(evaluate(Some(&running), A), Verdict::Ready(json!("partial")));
        assert_eq!(evaluate(Some(&running), B), Verdict::Pending);
    }

    #[test]
    fn test_evaluate_completed_without_output() {
        let done = run(RunStatus::Completed, None);
        assert_eq!(evaluate(Some(&done), A), Verdict::EmptyCompletion);
        assert_eq!(evaluate(Some(&done), B), Verdict::EmptyCompletion);
    }

    #[test]
    fn test_evaluate_no_run_yet_is_pending() {
        assert_eq!(evaluate(None, A), Verdict::Pending);
    }

    #[tokio::test(start_paused = true)]
    async fn test_immediate_completion_returns_without_sleeping() {
        let runner = FakeRunner::new().then_run(run(
            RunStatus::Completed,
            Some(json!({"output": [{"content": "{\"overall_score\":85}"}]})),
        ));
        let started = Instant::now();

        let output = poll_for_output(&runner, "h1", &config(120, 500, B), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(output, json!("{\"overall_score\":85}"));
        assert_eq!(runner.query_count(), 1);
        assert!(started.elapsed() < Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_respects_budget() {
        let runner = FakeRunner::new().always(run(RunStatus::Running, None));
        let started = Instant::now();

        let err = poll_for_output(&runner, "h1", &config(90, 1000, A), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, PollError::Exhausted { attempts: 90 }));
        assert_eq!(runner.query_count(), 90);
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(89));
        assert!(elapsed < Duration::from_secs(90));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_stops_querying() {
        let runner = FakeRunner::new()
            .then_run(run(RunStatus::Running, None))
            .then_run(run(RunStatus::Running, None))
            .then_run(run(RunStatus::Failed, None))
            .always(run(RunStatus::Completed, Some(json!("too late"))));

        let err = poll_for_output(&runner, "h1", &config(60, 1000, A), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            PollError::JobFailed {
                status: RunStatus::Failed,
                ..
            }
        ));
        assert_eq!(runner.query_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_query_errors_do_not_abort() {
        let runner = FakeRunner::new()
            .then_error()
            .then_error()
            .then_run(run(RunStatus::Running, Some(json!({"output": {"roadmapTitle": "Go"}}))));

        let output = poll_for_output(&runner, "h1", &config(90, 1000, A), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(output, json!({"roadmapTitle": "Go"}));
        assert_eq!(runner.query_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_errors_still_count_against_budget() {
        let runner = FakeRunner::new().always_error();

        let err = poll_for_output(&runner, "h1", &config(5, 1000, A), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, PollError::Exhausted { attempts: 5 }));
        assert_eq!(runner.query_count(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_strategy_b_waits_for_completed_flag() {
        let runner = FakeRunner::new()
            .then_run(run(RunStatus::Running, Some(json!({"output": "draft"}))))
            .then_run(run(RunStatus::Completed, Some(json!({"output": "final"}))));

        let output = poll_for_output(&runner, "h1", &config(10, 500, B), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(output, json!("final"));
        assert_eq!(runner.query_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_run_list_keeps_polling() {
        let runner = FakeRunner::new()
            .then_runs(vec![])
            .then_run(run(RunStatus::Completed, Some(json!({"output": "ok"}))));

        let output = poll_for_output(&runner, "h1", &config(10, 1000, A), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(output, json!("ok"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_interrupts_delay() {
        let runner = FakeRunner::new().always(run(RunStatus::Running, None));
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(2500)).await;
            trigger.cancel();
        });
        let started = Instant::now();

        let err = poll_for_output(&runner, "h1", &config(90, 1000, A), &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, PollError::Cancelled { attempts: 3 }));
        assert_eq!(runner.query_count(), 3);
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_cancelled_before_start_issues_no_query() {
        let runner = FakeRunner::new().always(run(RunStatus::Running, None));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = poll_for_output(&runner, "h1", &config(90, 1000, A), &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, PollError::Cancelled { attempts: 0 }));
        assert_eq!(runner.query_count(), 0);
    }
}
