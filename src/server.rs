//! HTTP control surface for the ingestion worker.
//!
//! Two operations: report progress, and stop the worker. The stop signal
//! clears the shared running flag and shuts the listener down gracefully.

use axum::{extract::State, http::StatusCode, response::Json, routing::get, Router};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

use crate::worker::WorkerState;

#[derive(Clone)]
struct AppState {
    worker: Arc<WorkerState>,
    shutdown: mpsc::Sender<()>,
}

/// Serve the control surface until /stop is hit or the listener fails.
pub async fn start(bind_addr: &str, worker: Arc<WorkerState>) -> anyhow::Result<()> {
    let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
    let state = AppState {
        worker,
        shutdown: shutdown_tx,
    };

    let app = Router::new()
        .route("/health", get(health_check))
        .route("/status", get(status))
        .route("/stop", get(stop).post(stop))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!("control surface listening on {bind_addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.recv().await;
        })
        .await?;

    Ok(())
}

async fn health_check() -> StatusCode {
    StatusCode::OK
}

async fn status(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "service": "photoinbox",
        "version": env!("CARGO_PKG_VERSION"),
        "processed": state.worker.processed(),
        "status": if state.worker.is_running() { "running" } else { "stopping" },
    }))
}

async fn stop(State(state): State<AppState>) -> &'static str {
    info!("stop requested via control surface");
    state.worker.stop();
    let _ = state.shutdown.try_send(());
    "Stopping worker...\n"
}
