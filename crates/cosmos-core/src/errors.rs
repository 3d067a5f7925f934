use anyhow::{Error, anyhow};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Message returned for every authentication failure, whatever the cause.
pub const AUTHENTICATION_FAILED: &str = "authentication failed";

/// Message returned when verified claims lack a required permission.
pub const PERMISSION_DENIED: &str = "permission denied";

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub error: Error,
}

impl AppError {
    pub fn new<E>(status: StatusCode, err: E) -> Self
    where
        E: Into<Error>,
    {
        Self {
            status,
            error: err.into(),
        }
    }

    pub fn internal<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, err)
    }

    pub fn bad_request<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::BAD_REQUEST, err)
    }

    pub fn unprocessable<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, err)
    }

    /// 401 with the uniform authentication failure message. The specific
    /// reason must be logged by the caller, never returned.
    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, anyhow!(AUTHENTICATION_FAILED))
    }

    /// 403 for authenticated callers missing a permission.
    pub fn forbidden() -> Self {
        Self::new(StatusCode::FORBIDDEN, anyhow!(PERMISSION_DENIED))
    }

    /// 403 for rejected logins (unknown account or wrong password).
    pub fn login_failed() -> Self {
        Self::new(StatusCode::FORBIDDEN, anyhow!(AUTHENTICATION_FAILED))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.error.to_string()
        }));

        (self.status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<Error>,
{
    fn from(err: E) -> Self {
        AppError::internal(err)
    }
}
