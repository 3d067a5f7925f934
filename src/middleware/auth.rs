use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{debug, warn};

use cosmos_auth::{AuthError, Claims, TokenPair, get_access_token, get_refresh_token};
use cosmos_core::AppError;
use cosmos_observability::{
    track_reauthentication, track_token_issued, track_verification_failure,
};

use crate::state::AppState;

/// Tokens minted by [`reauthenticate`] for the current request. Authentication
/// prefers these over whatever credentials the client sent.
#[derive(Debug, Clone)]
pub struct ReissuedTokens(pub TokenPair);

/// Extractor for the verified claims of the caller.
///
/// Uses the claims attached by [`authenticate`] when the route is behind it,
/// otherwise verifies the request's access token itself.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    pub fn has_permission(&self, permission: &str) -> bool {
        self.0.has_permission(permission)
    }

    pub fn has_all_permissions(&self, permissions: &[&str]) -> bool {
        self.0.has_all_permissions(permissions)
    }

    pub fn user_id(&self) -> Result<i64, AppError> {
        self.0.subject_id().map_err(reject)
    }

    pub fn email(&self) -> &str {
        &self.0.email
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(claims) = parts.extensions.get::<Claims>() {
            return Ok(AuthUser(claims.clone()));
        }

        let token = get_access_token(&parts.headers).map_err(reject)?;
        let claims = state.verifier.verify(&token).map_err(reject)?;
        Ok(AuthUser(claims))
    }
}

/// Logs the specific failure and collapses it into the uniform 401.
fn reject(err: AuthError) -> AppError {
    track_verification_failure(err.kind());
    debug!(kind = err.kind(), error = %err, "authentication failed");
    AppError::unauthorized()
}

/// Best-effort silent renewal. A request carrying a refresh token that is
/// already active gets a new token pair: the new access token authenticates
/// this request and both new tokens are set as cookies on the response.
/// Failures never reject the request; authentication decides.
pub async fn reauthenticate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let Ok(refresh_token) = get_refresh_token(req.headers()) else {
        return next.run(req).await;
    };

    let access_token = match get_access_token(req.headers()) {
        Ok(token) => token,
        Err(err) => {
            debug!(kind = err.kind(), "refresh token presented without an access token");
            return next.run(req).await;
        }
    };

    let pair = match cosmos_auth::reauthenticate(
        &state.issuer,
        &state.verifier,
        &access_token,
        &refresh_token,
    ) {
        Ok(pair) => pair,
        // The usual case while the access token is still fresh
        Err(AuthError::NotYetValid) => return next.run(req).await,
        Err(err) => {
            track_reauthentication(err.kind());
            warn!(kind = err.kind(), error = %err, "could not reauthenticate");
            return next.run(req).await;
        }
    };

    let jar = match state.transport.set_token_pair(CookieJar::new(), &pair) {
        Ok(jar) => jar,
        Err(err) => {
            warn!(error = %err, "could not set reauthenticated cookies");
            return next.run(req).await;
        }
    };

    track_token_issued();
    track_reauthentication("renewed");
    debug!("reauthenticated request");

    req.extensions_mut().insert(ReissuedTokens(pair));
    let response = next.run(req).await;
    (jar, response).into_response()
}

/// Requires a verified access token and attaches its [`Claims`] to the request.
pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = match req.extensions().get::<ReissuedTokens>() {
        Some(reissued) => reissued.0.access_token.clone(),
        None => get_access_token(req.headers()).map_err(reject)?,
    };

    let claims = state.verifier.verify(&token).map_err(reject)?;
    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

/// Requires every permission in `required` on the authenticated claims.
/// Must run after [`authenticate`]; without claims the request is forbidden.
///
/// ```ignore
/// Router::new()
///     .route("/keys", get(list_keys))
///     .route_layer(middleware::from_fn(|req: Request, next: Next| {
///         authorize(&[permissions::KEYS_READ], req, next)
///     }))
/// ```
pub async fn authorize(
    required: &'static [&'static str],
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(claims) = req.extensions().get::<Claims>() else {
        warn!("authorize reached without authenticated claims");
        return Err(AppError::forbidden());
    };

    if !claims.has_all_permissions(required) {
        debug!(sub = %claims.sub, required = ?required, "missing required permissions");
        return Err(AppError::forbidden());
    }

    Ok(next.run(req).await)
}
