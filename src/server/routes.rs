//! Service route handlers.
//!
//! All endpoints return JSON. State is shared via `Arc<ServerState>`.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::engine::analysis::{AnalysisError, AnalysisOptions, AnalysisReport, Analyzer};
use crate::engine::executor::{RequestExecutor, RetryPolicy};
use crate::engine::limiter::RateLimiter;
use crate::engine::progress::{ProgressSnapshot, ProgressTracker};
use crate::provider::GameDataProvider;
use crate::storage;
use crate::types::RiotId;

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// Shared state accessible by all route handlers.
pub struct ServerState {
    pub provider: Arc<dyn GameDataProvider>,
    /// One limiter for every run: the upstream quota is per key, not per run.
    pub limiter: Arc<RateLimiter>,
    pub retry: RetryPolicy,
    pub options: AnalysisOptions,
    /// Where each finished report is written; `None` disables persistence.
    pub result_file: Option<String>,
    /// Tracker of the most recently started run.
    pub progress: RwLock<Option<Arc<ProgressTracker>>>,
    /// Cancelled on shutdown; every run holds a child token.
    pub shutdown: CancellationToken,
}

impl ServerState {
    pub fn new(
        provider: Arc<dyn GameDataProvider>,
        limiter: Arc<RateLimiter>,
        retry: RetryPolicy,
        options: AnalysisOptions,
        result_file: Option<String>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            provider,
            limiter,
            retry,
            options,
            result_file,
            progress: RwLock::new(None),
            shutdown,
        }
    }
}

pub type AppState = Arc<ServerState>;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    pub players: Vec<RiotId>,
    /// Overrides the configured sample size when positive.
    #[serde(default)]
    pub match_limit: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// JSON error with a status code.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { error: self.message })).into_response()
    }
}

impl From<AnalysisError> for ApiError {
    fn from(e: AnalysisError) -> Self {
        let status = match &e {
            AnalysisError::Balance(_) => StatusCode::BAD_REQUEST,
            AnalysisError::Player { .. } => StatusCode::BAD_GATEWAY,
            AnalysisError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
        };
        ApiError {
            status,
            message: e.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

/// POST /analyze
pub async fn analyze(
    State(state): State<AppState>,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<AnalysisReport>, ApiError> {
    let mut options = state.options.clone();
    if let Some(limit) = req.match_limit.filter(|n| *n > 0) {
        options.match_limit = limit;
    }
    info!(players = req.players.len(), match_limit = options.match_limit, "Analyze request");

    let tracker = Arc::new(ProgressTracker::new(state.limiter.pacing()));
    *state.progress.write().await = Some(Arc::clone(&tracker));

    let executor = RequestExecutor::new(
        Arc::clone(&state.limiter),
        tracker,
        state.retry.clone(),
        state.shutdown.child_token(),
    );
    let analyzer = Analyzer::new(Arc::clone(&state.provider), executor, options);

    let report = analyzer.run(&req.players).await.map_err(|e| {
        warn!(error = %e, "Analysis failed");
        ApiError::from(e)
    })?;

    if let Some(path) = &state.result_file {
        if let Err(e) = storage::save_report(&report, Some(path)) {
            error!(error = %e, path = %path, "Failed to persist report");
        }
    }

    Ok(Json(report))
}

/// GET /api/progress
///
/// `null` until the first run starts.
pub async fn get_progress(State(state): State<AppState>) -> Json<Option<ProgressSnapshot>> {
    let progress = state.progress.read().await;
    Json(progress.as_ref().map(|t| t.snapshot()))
}

/// GET /healthz
pub async fn health() -> StatusCode {
    StatusCode::OK
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
