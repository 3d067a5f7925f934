//! Shared utilities.
//!
//! - [`password`]: bcrypt password hashing off the async runtime

pub mod password;
