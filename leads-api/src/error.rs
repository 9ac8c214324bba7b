//! Error types for leads-api
//!
//! Error bodies have the shape `{ "error": <summary>, "details": <message> }`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed request body (400)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// `leadIds` contains something other than positive integers (400)
    #[error("Invalid lead IDs: {0}")]
    InvalidLeadIds(String),

    /// Template references fields a lead does not have (400)
    #[error("Invalid template fields: {0}")]
    InvalidTemplateFields(String),

    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// leads-common error
    #[error("Common error: {0}")]
    Common(#[from] leads_common::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, details) = match self {
            ApiError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, "Invalid request", msg),
            ApiError::InvalidLeadIds(msg) => (StatusCode::BAD_REQUEST, "Invalid lead IDs", msg),
            ApiError::InvalidTemplateFields(msg) => {
                (StatusCode::BAD_REQUEST, "Invalid template fields", msg)
            }
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "Not found", msg),
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error",
                msg,
            ),
            ApiError::Database(ref err) => {
                tracing::error!(error = %err, "Unhandled database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error",
                    "Database operation failed".to_string(),
                )
            }
            ApiError::Common(ref err) => {
                tracing::error!(error = %err, "Unhandled service error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error",
                    err.to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error,
            "details": details,
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
