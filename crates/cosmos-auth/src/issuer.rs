//! Access and refresh token issuance.
//!
//! Every login produces a [`TokenPair`] whose two halves share a token id
//! (`jti`), subject and issued-at instant. Their lifetimes are coupled:
//!
//! ```text
//! iat                         access.exp
//!  |------ access token ---------|
//!                      |--------- refresh token ---------|
//!                 refresh.nbf                       refresh.exp
//!                 (access.exp + overlap)            (iat + refresh ttl)
//! ```
//!
//! The overlap is negative, so the refresh token becomes usable shortly before
//! the access token it renews runs out.

use std::sync::Arc;

use chrono::{DateTime, Duration, SubsecRound, Utc};
use jsonwebtoken::{Algorithm, Header, encode};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use cosmos_config::AuthConfig;

use crate::claims::Claims;
use crate::clock::{Clock, SystemClock};
use crate::error::AuthError;
use crate::keys::KeyRing;
use crate::principal::Principal;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Clone)]
pub struct TokenIssuer {
    keys: Arc<KeyRing>,
    clock: Arc<dyn Clock>,
    issuer: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
    overlap: Duration,
}

impl TokenIssuer {
    /// Fails if the configured lifetimes cannot keep the refresh token's
    /// activation inside the access token's lifetime.
    pub fn new(keys: Arc<KeyRing>, config: &AuthConfig) -> Result<Self, AuthError> {
        config
            .validate_lifetimes()
            .map_err(|e| AuthError::Config(e.to_string()))?;

        Ok(Self {
            keys,
            clock: Arc::new(SystemClock),
            issuer: config.issuer.clone(),
            access_ttl: config.access_ttl(),
            refresh_ttl: config.refresh_ttl(),
            overlap: config.overlap(),
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn keys(&self) -> &KeyRing {
        &self.keys
    }

    /// Tokens carry whole seconds, so issuance does too. This keeps issued
    /// claims identical to the claims later parsed back out of the token.
    fn now(&self) -> DateTime<Utc> {
        self.clock.now().trunc_subsecs(0)
    }

    pub fn create_access_token(&self, principal: &Principal) -> Result<Claims, AuthError> {
        self.stamp_access(Claims::for_principal(principal))
    }

    /// Fresh access claims carrying the identity of previously issued claims.
    /// The previous token id and times are discarded.
    pub fn reissue(&self, previous: &Claims) -> Result<Claims, AuthError> {
        self.stamp_access(previous.clone())
    }

    fn stamp_access(&self, mut claims: Claims) -> Result<Claims, AuthError> {
        let now = self.now();
        claims.jti = Uuid::new_v4().to_string();
        claims.aud = vec![self.keys.audience().to_string()];
        claims.iss = self.issuer.clone();
        claims.iat = now;
        claims.nbf = now;
        claims.exp = shift(now, self.access_ttl)?;
        Ok(claims)
    }

    /// Refresh claims paired with `access`: same id, audience, subject and
    /// issued-at; active from `access.exp + overlap` until `iat + refresh ttl`.
    pub fn create_refresh_token(&self, access: &Claims) -> Result<Claims, AuthError> {
        let mut refresh = access.clone();
        refresh.nbf = shift(access.exp, self.overlap)?;
        refresh.exp = shift(access.iat, self.refresh_ttl)?;
        Ok(refresh)
    }

    /// Signs claims with the current key, naming it in the `kid` header.
    pub fn sign(&self, claims: &Claims) -> Result<String, AuthError> {
        let (kid, key) = self.keys.signing_key();
        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(kid.to_string());

        encode(&header, claims, key).map_err(|e| AuthError::Encoding(e.to_string()))
    }

    pub fn create_token_pair(&self, principal: &Principal) -> Result<TokenPair, AuthError> {
        self.sign_pair(self.create_access_token(principal)?)
    }

    /// New pair for the holder of `previous`, used by reauthentication.
    pub fn renew_token_pair(&self, previous: &Claims) -> Result<TokenPair, AuthError> {
        self.sign_pair(self.reissue(previous)?)
    }

    fn sign_pair(&self, access: Claims) -> Result<TokenPair, AuthError> {
        let refresh = self.create_refresh_token(&access)?;
        let pair = TokenPair {
            access_token: self.sign(&access)?,
            refresh_token: self.sign(&refresh)?,
        };
        debug!(jti = %access.jti, sub = %access.sub, kid = %self.keys.current_key_id(), "issued token pair");
        Ok(pair)
    }
}

fn shift(at: DateTime<Utc>, by: Duration) -> Result<DateTime<Utc>, AuthError> {
    at.checked_add_signed(by)
        .ok_or_else(|| AuthError::Encoding(format!("token time {at} + {by} is out of range")))
}
