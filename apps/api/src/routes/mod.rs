pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::gateway::handlers as tools;
use crate::history::handlers as history;
use crate::jobs::handlers as jobs;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Tool endpoints: submit a job and wait for its output
        .route("/api/ai-resume-agent", post(tools::handle_resume_agent))
        .route(
            "/api/ai-cover-letter-agent",
            post(tools::handle_cover_letter_agent),
        )
        .route("/api/ai-roadmap-agent", post(tools::handle_roadmap_agent))
        .route(
            "/api/ai-career-chat-agent",
            post(tools::handle_career_chat_agent),
        )
        // Stored results
        .route(
            "/api/history",
            get(history::handle_get_history)
                .post(history::handle_insert_history)
                .put(history::handle_update_history),
        )
        // Runner callback
        .route("/api/jobs/:event", post(jobs::handle_job_event))
        .with_state(state)
}
