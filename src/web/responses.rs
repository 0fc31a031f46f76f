//! HTTP response types and error mapping
//!
//! Every JSON endpoint answers with [`ApiResponse`]. Server-side failures are logged in
//! full and reported to the client with a generic message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::errors::AppError;

/// Standard API response wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl<T> ApiResponse<T>
where
    T: Serialize,
{
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn error(message: String) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            error: Some(message),
            timestamp: chrono::Utc::now(),
        }
    }
}

/// Status code and client-facing message for an error
pub fn error_status(error: &AppError) -> (StatusCode, String) {
    match error {
        AppError::Validation { message } => (StatusCode::BAD_REQUEST, message.clone()),
        AppError::NotFound { resource, id } => (
            StatusCode::NOT_FOUND,
            format!("{resource} with id '{id}' not found"),
        ),
        AppError::Conflict { message } => (StatusCode::CONFLICT, message.clone()),
        AppError::PayloadTooLarge { max_size, .. } => (
            StatusCode::PAYLOAD_TOO_LARGE,
            format!("Request body exceeds the {max_size} byte limit"),
        ),
        AppError::Database(_)
        | AppError::Repository(_)
        | AppError::Configuration { .. }
        | AppError::ExternalService { .. }
        | AppError::Image(_)
        | AppError::Internal { .. }
        | AppError::Http(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error".to_string(),
        ),
    }
}

/// Convert AppError to appropriate HTTP response
pub fn handle_error(error: AppError) -> Response {
    let (status, message) = error_status(&error);
    if error.is_client_error() {
        debug!(%status, error = %error, "request rejected");
    } else {
        error!(error = %error, "request failed");
    }
    (status, Json(ApiResponse::<()>::error(message))).into_response()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        handle_error(self)
    }
}

pub fn ok<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(ApiResponse::success(data))).into_response()
}

pub fn created<T: Serialize>(data: T) -> Response {
    (StatusCode::CREATED, Json(ApiResponse::success(data))).into_response()
}

pub fn not_found(message: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::<()>::error(message.to_string())),
    )
        .into_response()
}
