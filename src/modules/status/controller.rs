use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use tracing::instrument;

use super::model::{ProbeResponse, STATUS_MAINTENANCE, STATUS_OK, StatusResponse};
use crate::state::AppState;

/// Heartbeat with uptime and version.
#[instrument(skip_all)]
pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse::ok(state.started_at.elapsed()))
}

/// Liveness: the process is serving requests.
pub async fn healthz() -> Json<ProbeResponse> {
    Json(ProbeResponse { status: STATUS_OK })
}

/// Readiness: false while in maintenance mode.
pub async fn readyz(State(state): State<AppState>) -> (StatusCode, Json<ProbeResponse>) {
    if state.server_config.maintenance {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ProbeResponse {
                status: STATUS_MAINTENANCE,
            }),
        );
    }
    (StatusCode::OK, Json(ProbeResponse { status: STATUS_OK }))
}

pub async fn metrics(State(state): State<AppState>) -> (StatusCode, String) {
    match &state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (StatusCode::NOT_FOUND, "metrics are not enabled".to_string()),
    }
}
