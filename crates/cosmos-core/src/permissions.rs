//! Permission titles for the Cosmos API.
//!
//! Permissions travel inside access tokens as plain titles. Route guards
//! compare against these constants instead of string literals.
//!
//! # Example
//!
//! ```ignore
//! use cosmos_core::permissions;
//!
//! if claims.has_permission(permissions::KEYS_READ) {
//!     // List key ids
//! }
//! ```

// =============================================================================
// Key ring permissions
// =============================================================================

/// Permission to list the loaded token key ids
pub const KEYS_READ: &str = "keys:read";

