//! Token claims.
//!
//! [`Claims`] is the payload of both access and refresh tokens. The registered
//! JWT fields (`jti`, `aud`, `iss`, `sub`, `iat`, `nbf`, `exp`) are joined by
//! the principal's `name`, `email`, `role` and `permissions`.
//!
//! The subject is the principal's integer id encoded in base 36 so it stays
//! short in the token while remaining reversible.

use chrono::serde::ts_seconds;
use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::AuthError;
use crate::principal::Principal;

const SUBJECT_RADIX: u32 = 36;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Token id, shared by an access token and its paired refresh token
    pub jti: String,
    #[serde(deserialize_with = "one_or_many")]
    pub aud: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub iss: String,
    /// Base 36 encoded principal id
    pub sub: String,
    #[serde(with = "ts_seconds")]
    pub iat: DateTime<Utc>,
    #[serde(with = "ts_seconds")]
    pub nbf: DateTime<Utc>,
    #[serde(with = "ts_seconds")]
    pub exp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub email: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub role: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub permissions: Vec<String>,
}

impl Claims {
    /// Identity and authorization claims for a principal. Registered
    /// claims other than the subject are left for the issuer to fill in.
    pub fn for_principal(principal: &Principal) -> Self {
        let mut permissions: Vec<String> = Vec::with_capacity(principal.permissions.len());
        for permission in &principal.permissions {
            if !permissions.contains(permission) {
                permissions.push(permission.clone());
            }
        }

        let mut claims = Self {
            jti: String::new(),
            aud: Vec::new(),
            iss: String::new(),
            sub: String::new(),
            iat: DateTime::UNIX_EPOCH,
            nbf: DateTime::UNIX_EPOCH,
            exp: DateTime::UNIX_EPOCH,
            name: principal.name.clone(),
            email: principal.email.clone(),
            role: principal.role.clone(),
            permissions,
        };
        claims.set_subject_id(principal.id);
        claims
    }

    pub fn set_subject_id(&mut self, id: i64) {
        self.sub = encode_subject(id);
    }

    pub fn subject_id(&self) -> Result<i64, AuthError> {
        decode_subject(&self.sub)
    }

    pub fn has_permission(&self, required: &str) -> bool {
        self.permissions.iter().any(|p| p == required)
    }

    pub fn has_all_permissions(&self, required: &[&str]) -> bool {
        required.iter().all(|p| self.has_permission(p))
    }
}

pub fn encode_subject(id: i64) -> String {
    let mut n = id.unsigned_abs();
    if n == 0 {
        return "0".to_string();
    }

    let mut digits = Vec::new();
    while n > 0 {
        // Always a valid digit: the remainder is below the radix
        let digit = std::char::from_digit((n % SUBJECT_RADIX as u64) as u32, SUBJECT_RADIX)
            .unwrap_or('0');
        digits.push(digit);
        n /= SUBJECT_RADIX as u64;
    }
    if id < 0 {
        digits.push('-');
    }
    digits.iter().rev().collect()
}

pub fn decode_subject(sub: &str) -> Result<i64, AuthError> {
    i64::from_str_radix(sub, SUBJECT_RADIX).map_err(|_| AuthError::InvalidSubject(sub.to_string()))
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(aud) => vec![aud],
        OneOrMany::Many(aud) => aud,
    })
}

/// The registered claims of a token, read without checking its signature.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisteredClaims {
    pub jti: Option<String>,
    pub sub: Option<String>,
    pub iat: Option<i64>,
    pub nbf: Option<i64>,
    pub exp: Option<i64>,
}

/// Decodes a token's registered claims with no signature or time checks.
///
/// Only for bookkeeping such as sizing a cookie's lifetime. Never use the
/// result to authorize anything.
pub fn parse_unverified(token: &str) -> Result<RegisteredClaims, AuthError> {
    let mut validation = Validation::new(Algorithm::RS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    decode::<RegisteredClaims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map(|data| data.claims)
        .map_err(|_| AuthError::Malformed)
}

pub fn expires_at(token: &str) -> Result<DateTime<Utc>, AuthError> {
    timestamp(parse_unverified(token)?.exp)
}

pub fn not_before(token: &str) -> Result<DateTime<Utc>, AuthError> {
    timestamp(parse_unverified(token)?.nbf)
}

fn timestamp(secs: Option<i64>) -> Result<DateTime<Utc>, AuthError> {
    secs.and_then(|secs| Utc.timestamp_opt(secs, 0).single())
        .ok_or(AuthError::Malformed)
}
