//! Liveness and readiness checks.

use axum::{extract::State, http::StatusCode};

use crate::db;
use crate::state::AppState;

/// Returns "ok" while the process is serving. Checks nothing else.
pub async fn live() -> &'static str {
    "ok"
}

/// 503 when the session database is unreachable. The backend API is not
/// checked; pages degrade on their own when it is down.
pub async fn ready(State(state): State<AppState>) -> StatusCode {
    match db::ping(state.pool()).await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!("Readiness check failed: {e}");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
