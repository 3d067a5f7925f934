use axum::{
    Json,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::modules::status::model::StatusResponse;
use crate::state::AppState;

/// Answers 503 with a maintenance status instead of running the route while
/// the server is in maintenance mode.
pub async fn available(State(state): State<AppState>, req: Request, next: Next) -> Response {
    if state.server_config.maintenance {
        let status = StatusResponse::maintenance(state.started_at.elapsed());
        return (StatusCode::SERVICE_UNAVAILABLE, Json(status)).into_response();
    }

    next.run(req).await
}
