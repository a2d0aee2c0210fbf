use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::gateway::JobGateway;
use crate::history::HistoryStore;
use crate::jobs::signature::SigningKey;
use crate::jobs::JobWorker;

/// Shared application state injected into all route handlers via Axum extractors.
/// Every external collaborator sits behind a trait object so tests can swap in fakes.
#[derive(Clone)]
pub struct AppState {
    pub gateway: JobGateway,
    pub worker: JobWorker,
    pub history: Arc<dyn HistoryStore>,
    /// Verifies that job callbacks come from the runner.
    pub signing_key: SigningKey,
    /// Cancelled on shutdown; each tool request polls under a child token.
    pub shutdown: CancellationToken,
}
