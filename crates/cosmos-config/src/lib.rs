//! # Cosmos Config
//!
//! Configuration types for the Cosmos API, loaded from environment variables
//! (a `.env` file is honoured by the binary through `dotenvy`):
//!
//! - [`auth`]: token key files, audience, issuer, token lifetimes and cookie domain
//! - [`cors`]: CORS (Cross-Origin Resource Sharing) configuration
//! - [`server`]: bind address and maintenance mode
//!
//! # Example
//!
//! ```ignore
//! use cosmos_config::{AuthConfig, CorsConfig, ServerConfig};
//!
//! let auth_config = AuthConfig::from_env()?;
//! let cors_config = CorsConfig::from_env();
//! let server_config = ServerConfig::from_env();
//! ```

pub mod auth;
pub mod cors;
pub mod server;

pub use auth::{AuthConfig, ConfigError};
pub use cors::CorsConfig;
pub use server::ServerConfig;
