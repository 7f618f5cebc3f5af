//! Health check endpoints.

use axum::{extract::State, http::StatusCode};
use tracing::warn;

use crate::state::AppState;

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
pub async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// 503 until the catalog store answers and the search collection exists.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    if let Err(e) = state.catalog().store().ping().await {
        warn!(error = %e, "Readiness: catalog store unreachable");
        return StatusCode::SERVICE_UNAVAILABLE;
    }
    if !state.catalog().index().is_ready() {
        warn!("Readiness: search collection missing");
        return StatusCode::SERVICE_UNAVAILABLE;
    }
    StatusCode::OK
}
