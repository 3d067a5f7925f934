//! Request middleware and extractors.
//!
//! - [`auth`]: reauthentication, authentication and authorization
//! - [`maintenance`]: maintenance mode short circuit
//!
//! # Authentication flow
//!
//! 1. `reauthenticate` renews an active refresh token into a new token pair
//! 2. `authenticate` verifies the access token (renewed or presented) and
//!    attaches its claims to the request
//! 3. `authorize` checks the claims for the permissions a route requires
//! 4. Handlers read the claims through the `AuthUser` extractor
//!
//! ```ignore
//! use crate::middleware::auth::AuthUser;
//!
//! async fn profile(AuthUser(claims): AuthUser) -> impl IntoResponse {
//!     Json(claims.email)
//! }
//! ```

pub mod auth;
pub mod maintenance;
