//! Token authentication core for the Cosmos API.
//!
//! - [`KeyRing`] holds the RSA keys: the newest signs, all of them verify.
//! - [`TokenIssuer`] mints paired access and refresh tokens for a [`Principal`].
//! - [`TokenVerifier`] checks signature, activation, expiry and audience.
//! - [`CredentialTransport`] and the `get_*_token` functions move tokens
//!   between HTTP headers, cookies and responses.

pub mod claims;
pub mod clock;
pub mod error;
pub mod issuer;
pub mod keys;
pub mod principal;
pub mod transport;
pub mod verifier;

pub use claims::Claims;
#[cfg(any(test, feature = "test-utils"))]
pub use clock::ManualClock;
pub use clock::{Clock, SystemClock};
pub use error::AuthError;
pub use issuer::{TokenIssuer, TokenPair};
pub use keys::KeyRing;
pub use principal::Principal;
pub use transport::{
    ACCESS_TOKEN_COOKIE, CredentialTransport, REFRESH_TOKEN_COOKIE, get_access_token,
    get_refresh_token, reauthenticate,
};
pub use verifier::TokenVerifier;
