use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum_extra::extract::cookie::CookieJar;
use tracing::{error, instrument};

use cosmos_auth::TokenPair;
use cosmos_core::AppError;

use super::model::{
    KeysResponse, LoginRequest, ProfileResponse, RegisterRequest, RegisterResponse,
    SuccessResponse,
};
use super::service::AuthService;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// Create an account with the default role.
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    let user = AuthService::register(&state, dto).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Login and receive an access and refresh token, also set as cookies.
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidatedJson(dto): ValidatedJson<LoginRequest>,
) -> Result<(CookieJar, Json<TokenPair>), AppError> {
    let pair = AuthService::login(&state, dto).await?;
    let jar = set_cookies(&state, jar, &pair)?;
    Ok((jar, Json(pair)))
}

/// Clears the credential cookies. Tokens already handed out stay valid until
/// they expire.
#[instrument(skip_all)]
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<SuccessResponse>) {
    (
        state.transport.clear_auth_cookies(jar),
        Json(SuccessResponse { success: true }),
    )
}

/// Exchanges the request's access and refresh tokens for a new pair.
#[instrument(skip_all)]
pub async fn reauthenticate(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
) -> Result<(CookieJar, Json<TokenPair>), AppError> {
    let pair = AuthService::reauthenticate(&state, &headers)?;
    let jar = set_cookies(&state, jar, &pair)?;
    Ok((jar, Json(pair)))
}

#[instrument(skip_all)]
pub async fn profile(user: AuthUser) -> Result<Json<ProfileResponse>, AppError> {
    let id = user.user_id()?;
    Ok(Json(ProfileResponse::new(id, user.0)))
}

#[instrument(skip_all)]
pub async fn list_keys(State(state): State<AppState>) -> Json<KeysResponse> {
    let keys = state.issuer.keys();
    Json(KeysResponse {
        current: keys.current_key_id().to_string(),
        keys: keys.key_ids().into_iter().map(String::from).collect(),
    })
}

fn set_cookies(state: &AppState, jar: CookieJar, pair: &TokenPair) -> Result<CookieJar, AppError> {
    state.transport.set_token_pair(jar, pair).map_err(|e| {
        error!(error = %e, "could not set auth cookies");
        AppError::internal(e)
    })
}
