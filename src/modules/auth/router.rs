use axum::{
    Router,
    extract::Request,
    middleware::{self, Next},
    routing::{get, post},
};

use cosmos_core::permissions;

use super::controller::{list_keys, login, logout, profile, reauthenticate, register};
use crate::middleware::auth::{self as auth_middleware, authorize};
use crate::state::AppState;

pub fn init_auth_router(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/profile", get(profile))
        .route(
            "/keys",
            get(list_keys).route_layer(middleware::from_fn(|req: Request, next: Next| {
                authorize(&[permissions::KEYS_READ], req, next)
            })),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware::authenticate,
        ))
        .route_layer(middleware::from_fn_with_state(
            state,
            auth_middleware::reauthenticate,
        ));

    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/reauthenticate", post(reauthenticate))
        .merge(protected)
}
