//! Error type definitions
//!
//! A small hierarchy: [`RepositoryError`] for the store layer, [`AppError`] for
//! everything the services and handlers surface.

use thiserror::Error;

/// Top-level application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Database-related errors (SeaORM)
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Repository layer errors
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// Validation errors
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Resource not found errors
    #[error("Not found: {resource} with id {id}")]
    NotFound { resource: String, id: String },

    /// Duplicate submissions
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// Request or upload bigger than allowed
    #[error("Payload too large: {size} bytes (max: {max_size})")]
    PayloadTooLarge { size: usize, max_size: usize },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// External service errors (image CDN, remote image hosts)
    #[error("External service error: {service} - {message}")]
    ExternalService { service: String, message: String },

    /// Image decode/encode failures
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Generic internal errors
    #[error("Internal error: {message}")]
    Internal { message: String },

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Repository layer specific errors
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// Database errors from SeaORM
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// JSON column serialization/deserialization failures
    #[error("Serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    /// Unique index violations
    #[error("Unique constraint violated: {constraint}")]
    UniqueViolation { constraint: String },

    /// Stored value that does not map back onto the domain model
    #[error("Corrupt record: {table} {id} - {message}")]
    CorruptRecord {
        table: String,
        id: String,
        message: String,
    },
}

impl AppError {
    /// Create a validation error with a custom message
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a not found error for a resource
    pub fn not_found<R: Into<String>, I: Into<String>>(resource: R, id: I) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: id.into(),
        }
    }

    /// Create a conflict error
    pub fn conflict<S: Into<String>>(message: S) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an external service error
    pub fn external_service<S: Into<String>, M: Into<String>>(service: S, message: M) -> Self {
        Self::ExternalService {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether the error is caused by the client rather than the server
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. }
                | Self::NotFound { .. }
                | Self::Conflict { .. }
                | Self::PayloadTooLarge { .. }
        )
    }
}

impl RepositoryError {
    pub fn corrupt<T: Into<String>, I: ToString, M: Into<String>>(
        table: T,
        id: I,
        message: M,
    ) -> Self {
        Self::CorruptRecord {
            table: table.into(),
            id: id.to_string(),
            message: message.into(),
        }
    }

    /// Map a driver error onto [`RepositoryError::UniqueViolation`] when it is one
    pub fn from_insert_error(err: sea_orm::DbErr, constraint: &str) -> Self {
        match err.sql_err() {
            Some(sea_orm::SqlErr::UniqueConstraintViolation(_)) => Self::UniqueViolation {
                constraint: constraint.to_string(),
            },
            _ => Self::Database(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_classification() {
        assert!(AppError::validation("x").is_client_error());
        assert!(AppError::not_found("Listing", "1").is_client_error());
        assert!(AppError::conflict("dup").is_client_error());
        assert!(!AppError::internal("boom").is_client_error());
        assert!(!AppError::external_service("cdn", "down").is_client_error());
    }

    #[test]
    fn test_error_messages() {
        let err = AppError::not_found("Listing", "abc");
        assert_eq!(err.to_string(), "Not found: Listing with id abc");

        let err = RepositoryError::corrupt("listings", "42", "bad status");
        assert_eq!(err.to_string(), "Corrupt record: listings 42 - bad status");
    }
}
