//! Centralized error handling for the classifieds backend
//!
//! Every layer returns one of the types defined in [`types`], and the web layer
//! maps [`AppError`] onto HTTP status codes in one place.
//!
//! # Error Categories
//!
//! - **Validation Errors**: missing required fields, bad status values, no cover image
//! - **Not Found**: unknown or malformed identifiers
//! - **Conflict**: duplicate submissions (a like already recorded for an IP)
//! - **Repository Errors**: store failures
//! - **External Service Errors**: image CDN or remote image hosts
//!
//! # Usage
//!
//! ```rust
//! use webbuses::errors::{AppError, AppResult};
//!
//! fn require_name(name: &str) -> AppResult<()> {
//!     if name.trim().is_empty() {
//!         return Err(AppError::validation("sellerName is required"));
//!     }
//!     Ok(())
//! }
//! ```

pub mod types;

pub use types::*;

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Convenience type alias for Repository Results
pub type RepositoryResult<T> = Result<T, RepositoryError>;
