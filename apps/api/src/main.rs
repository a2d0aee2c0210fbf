mod auth;
mod config;
mod db;
mod errors;
mod extractors;
mod gateway;
mod history;
mod jobs;
mod llm_client;
mod models;
mod polling;
mod routes;
mod runner;
mod state;

#[cfg(test)]
mod testing;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::gateway::JobGateway;
use crate::history::PgHistoryStore;
use crate::jobs::signature::SigningKey;
use crate::jobs::JobWorker;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::runner::inngest::InngestClient;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting career gateway v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;
    let history = Arc::new(PgHistoryStore::new(db));

    // Initialize job runner client
    let runner = Arc::new(InngestClient::new(
        &config.runner_host,
        config.runner_event_key.clone(),
        config.runner_signing_key.clone(),
    )?);
    info!("Job runner client initialized ({})", config.runner_host);

    // Initialize LLM client
    let llm = Arc::new(LlmClient::new(config.anthropic_api_key.clone())?);
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    let signing_key = SigningKey::new(&config.runner_signing_key)?;
    let shutdown = CancellationToken::new();

    let state = AppState {
        gateway: JobGateway::new(runner),
        worker: JobWorker::new(llm, history.clone()),
        history,
        signing_key,
        shutdown: shutdown.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM after cancelling `token`, which aborts every
/// in-flight poll loop.
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, cancelling in-flight jobs");
    token.cancel();
}
