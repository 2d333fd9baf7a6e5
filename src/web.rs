use axum::{
    body::{Body, Bytes},
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post, MethodRouter},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::config::LogServiceConfig;
use crate::errors::{LogServiceError, LogServiceResult};
use crate::ingest::{IngestHandler, INGEST_CONFIRMATION};
use crate::log_store::LogStore;
use crate::read_recent::ReadRecentHandler;

/// Which routes a process exposes. One process owns the sled `data_dir`;
/// a role filters routes, it does not split the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Role {
    #[default]
    All,
    Ingest,
    ReadRecent,
}

/// Per-process state. Built once at startup; handlers only read it.
#[derive(Clone)]
pub struct AppState {
    pub ingest: Arc<IngestHandler>,
    pub read_recent: Arc<ReadRecentHandler>,
    pub expose_store_errors: bool,
}

impl AppState {
    pub fn new(config: &LogServiceConfig, store: Arc<dyn LogStore>) -> Self {
        Self {
            ingest: Arc::new(IngestHandler::new(store.clone(), config.partition_key.as_str())),
            read_recent: Arc::new(ReadRecentHandler::new(
                store,
                config.index_name.as_str(),
                config.partition_key.as_str(),
            )),
            expose_store_errors: config.expose_store_errors,
        }
    }

    fn error_response(&self, err: LogServiceError) -> Response {
        if err.is_client_error() {
            tracing::warn!(error = %err, "request rejected");
        } else {
            tracing::error!(error = ?err, "request failed");
        }
        err.into_response_with(self.expose_store_errors)
    }
}

/// Build the router for `role`: `/logs` plus a health endpoint
pub fn build_router(state: AppState, role: Role) -> Router {
    let logs: MethodRouter<AppState> = match role {
        Role::All => post(ingest_log).get(read_recent_logs),
        Role::Ingest => post(ingest_log),
        Role::ReadRecent => get(read_recent_logs),
    };

    Router::new()
        .route("/logs", logs)
        .route("/healthz", get(healthz))
        // Messages have no length cap.
        .layer(DefaultBodyLimit::disable())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Store calls are synchronous sled I/O (including a flush per put), so they
/// run on the blocking pool.
async fn run_blocking<T, F>(work: F) -> LogServiceResult<T>
where
    F: FnOnce() -> LogServiceResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work).await?
}

async fn ingest_log(State(state): State<AppState>, body: Bytes) -> Response {
    let ingest = state.ingest.clone();
    match run_blocking(move || ingest.handle(&body)).await {
        Ok(_) => (StatusCode::CREATED, Body::from(INGEST_CONFIRMATION)).into_response(),
        Err(err) => state.error_response(err),
    }
}

async fn read_recent_logs(State(state): State<AppState>) -> Response {
    let read_recent = state.read_recent.clone();
    match run_blocking(move || read_recent.handle()).await {
        Ok(records) => Json(records).into_response(),
        Err(err) => state.error_response(err),
    }
}

async fn healthz() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
