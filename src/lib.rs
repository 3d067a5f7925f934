//! # Cosmos API
//!
//! Token authentication service built with Axum. Callers log in with an
//! email and password and receive a pair of RS256 signed tokens: a short
//! lived access token and a refresh token that silently renews it.
//!
//! ## Architecture
//!
//! ```text
//! crates/
//! ├── cosmos-core/           # AppError, permission titles
//! ├── cosmos-config/         # environment configuration
//! ├── cosmos-auth/           # key ring, claims, issuer, verifier, cookie transport
//! └── cosmos-observability/  # logging and metrics
//! src/
//! ├── middleware/            # reauthenticate, authenticate, authorize, maintenance
//! ├── modules/
//! │   ├── auth/              # login, logout, reauthenticate, profile, keys
//! │   └── status/            # status, probes, metrics
//! ├── principals.rs          # principal lookup seam and in-memory store
//! ├── router.rs
//! └── state.rs
//! ```
//!
//! Feature modules keep the controller / service / model / router split.
//!
//! ## Tokens
//!
//! - **Access token**: default lifetime 1 hour, sent as a bearer token or the
//!   `access_token` cookie
//! - **Refresh token**: default lifetime 2 hours, active from 15 minutes
//!   before its access token expires, only sent as the `refresh_token` cookie
//!
//! The newest configured key signs; every configured key verifies, so keys
//! rotate without invalidating tokens already handed out.
//!
//! ## Quick Start
//!
//! ```bash
//! COSMOS_AUTH_TOKEN_KEYS=26eus0rt3e3Abor12Y60VqgCEXR:/keys/old.pem,26eutHCBAmtGZzeQB7WVZD28l0F:/keys/new.pem
//! COSMOS_AUTH_AUDIENCE=http://localhost:10001
//! COSMOS_AUTH_COOKIE_DOMAIN=localhost
//! COSMOS_DEMO_EMAIL=admin@example.com
//! COSMOS_DEMO_PASSWORD=changeme
//! ```

pub mod middleware;
pub mod modules;
pub mod principals;
pub mod router;
pub mod state;
pub mod utils;
pub mod validator;

// Re-export workspace crates for convenience
pub use cosmos_auth;
pub use cosmos_config;
pub use cosmos_core;
