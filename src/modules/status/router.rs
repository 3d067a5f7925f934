use axum::{Router, routing::get};

use super::controller::{healthz, metrics, readyz, status};
use crate::state::AppState;

/// Kubernetes probes and metrics; never behind maintenance mode.
pub fn init_probe_router() -> Router<AppState> {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/livez", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
}

pub fn init_status_router() -> Router<AppState> {
    Router::new().route("/status", get(status))
}
