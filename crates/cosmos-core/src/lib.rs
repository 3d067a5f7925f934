//! # Cosmos Core
//!
//! Core types shared by every Cosmos crate:
//!
//! - [`errors`]: Application error type with HTTP response conversion
//! - [`permissions`]: Permission title constants checked by route guards
//!
//! # Example
//!
//! ```ignore
//! use cosmos_core::AppError;
//!
//! // Every credential failure looks the same to the client
//! let error = AppError::unauthorized();
//! ```

pub mod errors;
pub mod permissions;

pub use errors::AppError;
