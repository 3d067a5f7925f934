//! Token verification.
//!
//! The verification key is always chosen by the `kid` in the token header.
//! An unknown `kid` is an error; keys are never tried one after another.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, Validation, decode, decode_header};
use tracing::debug;

use crate::claims::{self, Claims};
use crate::clock::{Clock, SystemClock};
use crate::error::AuthError;
use crate::keys::KeyRing;

#[derive(Debug, Clone)]
pub struct TokenVerifier {
    keys: Arc<KeyRing>,
    clock: Arc<dyn Clock>,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(keys: Arc<KeyRing>) -> Self {
        // Only the signature is checked by jsonwebtoken. Temporal and audience
        // checks run in `verify` against our own clock.
        let mut validation = Validation::new(Algorithm::RS256);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        Self {
            keys,
            clock: Arc::new(SystemClock),
            validation,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Checks signature, key id, validity window and audience. None of the
    /// checks can be skipped.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let claims = self.parse(token)?;
        let now = self.clock.now();

        if now < claims.nbf {
            return Err(AuthError::NotYetValid);
        }
        if now > claims.exp {
            return Err(AuthError::Expired);
        }
        if !claims.aud.iter().any(|aud| aud == self.keys.audience()) {
            return Err(AuthError::InvalidAudience(claims.aud));
        }

        Ok(claims)
    }

    /// Checks signature and key id only. Recovers the claims of an access
    /// token that has expired so it can be renewed.
    pub fn parse(&self, token: &str) -> Result<Claims, AuthError> {
        let header = decode_header(token).map_err(|_| AuthError::Malformed)?;
        let kid = header.kid.unwrap_or_default();
        let key = self.keys.verification_key(&kid).inspect_err(|_| {
            debug!(kid = %kid, "token references unknown key");
        })?;

        decode::<Claims>(token, key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature
                | ErrorKind::InvalidAlgorithm
                | ErrorKind::InvalidAlgorithmName
                | ErrorKind::InvalidKeyFormat
                | ErrorKind::InvalidRsaKey(_)
                | ErrorKind::Crypto(_) => AuthError::Signature,
                _ => AuthError::Malformed,
            })
    }

    /// Unverified expiry, for bookkeeping only.
    pub fn expires_at(&self, token: &str) -> Result<DateTime<Utc>, AuthError> {
        claims::expires_at(token)
    }

    /// Unverified activation time, for bookkeeping only.
    pub fn not_before(&self, token: &str) -> Result<DateTime<Utc>, AuthError> {
        claims::not_before(token)
    }
}
