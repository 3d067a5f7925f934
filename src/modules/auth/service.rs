use anyhow::anyhow;
use validator::Validate;
use axum::http::HeaderMap;
use tracing::{error, info, warn};

use cosmos_auth::{TokenPair, get_access_token, get_refresh_token};
use cosmos_core::AppError;
use cosmos_core::errors::AUTHENTICATION_FAILED;
use cosmos_observability::{
    track_login, track_reauthentication, track_token_issued, track_verification_failure,
};

use super::model::{LoginRequest, RegisterRequest, RegisterResponse};
use crate::principals::PrincipalError;
use crate::state::AppState;
use crate::validator::format_errors;

pub struct AuthService;

impl AuthService {
    /// New accounts get the store's default role. Fields are trimmed and
    /// checked again before the account is stored.
    pub async fn register(
        state: &AppState,
        dto: RegisterRequest,
    ) -> Result<RegisterResponse, AppError> {
        let dto = dto.trimmed();
        dto.validate()
            .map_err(|errors| AppError::unprocessable(anyhow!(format_errors(&errors))))?;

        let principal = match state
            .principals
            .register(&dto.name, &dto.email, &dto.password)
            .await
        {
            Ok(principal) => principal,
            Err(PrincipalError::AlreadyExists) => {
                warn!(email = %dto.email, "registration for existing user");
                return Err(AppError::bad_request(PrincipalError::AlreadyExists));
            }
            Err(err) => {
                error!(error = %err, "could not create new user");
                return Err(AppError::internal(anyhow!("could not complete registration")));
            }
        };

        info!(user_id = principal.id, email = %principal.email, "new user registered");
        Ok(principal.into())
    }

    /// Unknown accounts and wrong passwords are indistinguishable to the
    /// caller: both are 403 "authentication failed".
    pub async fn login(state: &AppState, dto: LoginRequest) -> Result<TokenPair, AppError> {
        let principal = state
            .principals
            .authenticate(&dto.email, &dto.password)
            .await
            .map_err(|e| {
                error!(error = %e, "could not authenticate user");
                AppError::internal(anyhow!(AUTHENTICATION_FAILED))
            })?;

        let Some(principal) = principal else {
            track_login("failure");
            warn!(email = %dto.email, "login failed");
            return Err(AppError::login_failed());
        };

        let pair = state.issuer.create_token_pair(&principal).map_err(|e| {
            error!(error = %e, "could not create access and refresh tokens for user");
            AppError::internal(anyhow!(AUTHENTICATION_FAILED))
        })?;

        track_token_issued();
        track_login("success");
        info!(user_id = principal.id, email = %principal.email, "user logged in");
        Ok(pair)
    }

    /// Explicit renewal from the credentials on the request. Unlike the
    /// reauthentication middleware, every failure is a 401.
    pub fn reauthenticate(state: &AppState, headers: &HeaderMap) -> Result<TokenPair, AppError> {
        let renewed = get_refresh_token(headers).and_then(|refresh| {
            let access = get_access_token(headers)?;
            cosmos_auth::reauthenticate(&state.issuer, &state.verifier, &access, &refresh)
        });

        match renewed {
            Ok(pair) => {
                track_token_issued();
                track_reauthentication("renewed");
                Ok(pair)
            }
            Err(err) if !err.is_client_error() => {
                error!(error = %err, "could not reissue tokens");
                Err(AppError::internal(anyhow!(AUTHENTICATION_FAILED)))
            }
            Err(err) => {
                track_reauthentication(err.kind());
                track_verification_failure(err.kind());
                info!(kind = err.kind(), error = %err, "reauthentication rejected");
                Err(AppError::unauthorized())
            }
        }
    }
}
