//! RSA key ring for signing and verifying tokens.
//!
//! Keys are identified by lexicographically sortable, creation-ordered ids
//! (KSUID, ULID or UUIDv7). The key with the greatest id signs new tokens;
//! every loaded key, including retired ones, verifies. Rotating a key means
//! restarting with a greater id added to the configuration while keeping the
//! old entry around until the tokens it signed have expired.
//!
//! # Example
//!
//! ```ignore
//! use cosmos_auth::KeyRing;
//!
//! let keys = KeyRing::load(&config.token_keys, &config.audience)?;
//! println!("signing with {}", keys.current_key_id());
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::PathBuf;

use jsonwebtoken::{DecodingKey, EncodingKey};
use rsa::RsaPrivateKey;
use rsa::pkcs1::{DecodeRsaPrivateKey, EncodeRsaPrivateKey, EncodeRsaPublicKey};
use rsa::pkcs8::DecodePrivateKey;
use rsa::traits::PublicKeyParts;
use tracing::{debug, info};

use crate::error::AuthError;

/// Smallest modulus accepted for RS256 signing keys.
pub const MIN_KEY_BITS: usize = 2048;

pub struct KeyRing {
    audience: String,
    current: String,
    signing_key: EncodingKey,
    verification_keys: BTreeMap<String, DecodingKey>,
}

impl fmt::Debug for KeyRing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyRing")
            .field("audience", &self.audience)
            .field("current", &self.current)
            .field("keys", &self.verification_keys.keys().collect::<Vec<_>>())
            .field("signing_key", &"[hidden]")
            .finish()
    }
}

impl KeyRing {
    /// Reads every PEM encoded RSA private key (PKCS#1 or PKCS#8) in
    /// `key_paths` and builds the ring.
    pub fn load(
        key_paths: &BTreeMap<String, PathBuf>,
        audience: impl Into<String>,
    ) -> Result<Self, AuthError> {
        let mut pems = BTreeMap::new();
        for (kid, path) in key_paths {
            let pem = fs::read_to_string(path).map_err(|e| {
                AuthError::Config(format!(
                    "could not read key {kid} from {}: {e}",
                    path.display()
                ))
            })?;
            debug!(kid = %kid, path = %path.display(), "read token key");
            pems.insert(kid.clone(), pem);
        }

        let keys = Self::from_pem(&pems, audience)?;
        info!(
            current = %keys.current_key_id(),
            loaded = keys.verification_keys.len(),
            "token key ring loaded"
        );
        Ok(keys)
    }

    /// Builds the ring from PEM encoded private keys held in memory.
    pub fn from_pem(
        pems: &BTreeMap<String, String>,
        audience: impl Into<String>,
    ) -> Result<Self, AuthError> {
        let mut keys = BTreeMap::new();
        for (kid, pem) in pems {
            let key = RsaPrivateKey::from_pkcs8_pem(pem)
                .or_else(|_| RsaPrivateKey::from_pkcs1_pem(pem))
                .map_err(|_| {
                    AuthError::Config(format!("key {kid} is not a PEM encoded RSA private key"))
                })?;
            keys.insert(kid.clone(), key);
        }
        Self::from_keys(keys, audience)
    }

    fn from_keys(
        keys: BTreeMap<String, RsaPrivateKey>,
        audience: impl Into<String>,
    ) -> Result<Self, AuthError> {
        let audience = audience.into();
        if audience.is_empty() {
            return Err(AuthError::Config("an audience is required".to_string()));
        }

        let mut verification_keys = BTreeMap::new();
        for (kid, key) in &keys {
            if kid.is_empty() {
                return Err(AuthError::Config("key ids must not be empty".to_string()));
            }
            if key.size() * 8 < MIN_KEY_BITS {
                return Err(AuthError::Config(format!(
                    "key {kid} must be at least {MIN_KEY_BITS} bits"
                )));
            }

            let public = key
                .to_public_key()
                .to_pkcs1_der()
                .map_err(|e| AuthError::Config(format!("could not encode public key {kid}: {e}")))?;
            verification_keys.insert(kid.clone(), DecodingKey::from_rsa_der(public.as_bytes()));
        }

        // BTreeMap iteration is ordered, so the last entry holds the greatest id.
        let (current, private) = keys
            .into_iter()
            .next_back()
            .ok_or_else(|| AuthError::Config("at least one token key is required".to_string()))?;

        let der = private
            .to_pkcs1_der()
            .map_err(|e| AuthError::Config(format!("could not encode signing key {current}: {e}")))?;

        Ok(Self {
            audience,
            current,
            signing_key: EncodingKey::from_rsa_der(der.as_bytes()),
            verification_keys,
        })
    }

    /// Builds a ring around a single freshly generated key with a UUIDv7 id.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn generate(audience: impl Into<String>) -> Result<Self, AuthError> {
        Self::generate_with_id(uuid::Uuid::now_v7().to_string(), audience)
    }

    /// Builds a ring around a single freshly generated key with the given id.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn generate_with_id(
        kid: impl Into<String>,
        audience: impl Into<String>,
    ) -> Result<Self, AuthError> {
        let key = RsaPrivateKey::new(&mut rand::thread_rng(), MIN_KEY_BITS)
            .map_err(|e| AuthError::Config(format!("could not generate key: {e}")))?;
        Self::from_keys(BTreeMap::from([(kid.into(), key)]), audience)
    }

    pub fn audience(&self) -> &str {
        &self.audience
    }

    pub fn current_key_id(&self) -> &str {
        &self.current
    }

    pub fn signing_key(&self) -> (&str, &EncodingKey) {
        (&self.current, &self.signing_key)
    }

    pub fn verification_key(&self, kid: &str) -> Result<&DecodingKey, AuthError> {
        self.verification_keys
            .get(kid)
            .ok_or_else(|| AuthError::UnknownKey(kid.to_string()))
    }

    /// Every loaded key id in ascending order; the last one signs.
    pub fn key_ids(&self) -> Vec<&str> {
        self.verification_keys.keys().map(String::as_str).collect()
    }
}
