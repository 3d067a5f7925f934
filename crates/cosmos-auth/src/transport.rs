//! Moving credentials between HTTP requests/responses and tokens.
//!
//! Access tokens arrive in an `Authorization: Bearer` header or, for browser
//! clients, in the `access_token` cookie. Refresh tokens only ever travel in
//! the `refresh_token` cookie. Both cookies require a secure channel; the
//! access cookie is hidden from scripts while the refresh cookie is not, so
//! front ends can tell when a silent renewal is possible.

use std::sync::Arc;

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Duration;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::claims;
use crate::clock::{Clock, SystemClock};
use crate::error::AuthError;
use crate::issuer::{TokenIssuer, TokenPair};
use crate::verifier::TokenVerifier;

pub const ACCESS_TOKEN_COOKIE: &str = "access_token";
pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";

/// Seconds added to each cookie's lifetime so a client can still present a
/// token slightly past its expiry instead of losing the cookie first.
pub const COOKIE_GRACE_PERIOD_SECS: i64 = 60;

static BEARER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*Bearer\s+([A-Za-z0-9_.-]+)\s*$").unwrap());

/// The access token from the `Authorization` header, falling back to the
/// access token cookie. A present but malformed header is an error rather
/// than a reason to look at cookies.
pub fn get_access_token(headers: &HeaderMap) -> Result<String, AuthError> {
    if let Some(value) = headers.get(AUTHORIZATION) {
        let value = value.to_str().map_err(|_| AuthError::MalformedHeader)?;
        return BEARER
            .captures(value)
            .and_then(|caps| caps.get(1))
            .map(|token| token.as_str().to_string())
            .ok_or(AuthError::MalformedHeader);
    }

    cookie_value(headers, ACCESS_TOKEN_COOKIE).ok_or(AuthError::NoCredentials)
}

pub fn get_refresh_token(headers: &HeaderMap) -> Result<String, AuthError> {
    cookie_value(headers, REFRESH_TOKEN_COOKIE).ok_or(AuthError::NoRefreshToken)
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    CookieJar::from_headers(headers)
        .get(name)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
}

/// Writes and clears the credential cookies for a single domain.
#[derive(Debug, Clone)]
pub struct CredentialTransport {
    domain: String,
    clock: Arc<dyn Clock>,
}

impl CredentialTransport {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Adds both credential cookies, each living until its own token's
    /// expiry plus [`COOKIE_GRACE_PERIOD_SECS`].
    pub fn set_auth_cookies(
        &self,
        jar: CookieJar,
        access_token: &str,
        refresh_token: &str,
    ) -> Result<CookieJar, AuthError> {
        let access_max_age = self.max_age(access_token)?;
        let refresh_max_age = self.max_age(refresh_token)?;

        Ok(jar
            .add(self.cookie(ACCESS_TOKEN_COOKIE, access_token.to_string(), access_max_age, true))
            .add(self.cookie(
                REFRESH_TOKEN_COOKIE,
                refresh_token.to_string(),
                refresh_max_age,
                false,
            )))
    }

    pub fn set_token_pair(&self, jar: CookieJar, pair: &TokenPair) -> Result<CookieJar, AuthError> {
        self.set_auth_cookies(jar, &pair.access_token, &pair.refresh_token)
    }

    /// Expires both credential cookies immediately.
    pub fn clear_auth_cookies(&self, jar: CookieJar) -> CookieJar {
        jar.add(self.cookie(ACCESS_TOKEN_COOKIE, String::new(), Duration::zero(), true))
            .add(self.cookie(REFRESH_TOKEN_COOKIE, String::new(), Duration::zero(), false))
    }

    fn max_age(&self, token: &str) -> Result<Duration, AuthError> {
        let expires_at = claims::expires_at(token)?;
        let max_age = expires_at - self.clock.now() + Duration::seconds(COOKIE_GRACE_PERIOD_SECS);
        Ok(max_age.max(Duration::zero()))
    }

    fn cookie(
        &self,
        name: &'static str,
        value: String,
        max_age: Duration,
        http_only: bool,
    ) -> Cookie<'static> {
        Cookie::build((name, value))
            .domain(self.domain.clone())
            .path("/")
            .secure(true)
            .http_only(http_only)
            .same_site(SameSite::Lax)
            .max_age(time::Duration::seconds(max_age.num_seconds()))
            .build()
    }
}

/// The reauthentication handshake: a verified refresh token plus the
/// signature-checked (but possibly expired) access token it was issued with
/// yield a brand new token pair.
pub fn reauthenticate(
    issuer: &TokenIssuer,
    verifier: &TokenVerifier,
    access_token: &str,
    refresh_token: &str,
) -> Result<TokenPair, AuthError> {
    let refresh = verifier.verify(refresh_token)?;
    let access = verifier.parse(access_token)?;

    if access.jti != refresh.jti || access.sub != refresh.sub {
        debug!(access_jti = %access.jti, refresh_jti = %refresh.jti, "refresh token does not match access token");
        return Err(AuthError::TokenMismatch);
    }

    issuer.renew_token_pair(&access)
}
