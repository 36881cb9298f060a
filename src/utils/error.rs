//! Error Handling Utilities
//!
//! Crate-wide error types and their HTTP mappings.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Main application error type that can represent failures from any flow.
///
/// Expected domain failures map to 4xx responses with specific messages;
/// unexpected failures (database, hashing, internal) map to generic 5xx
/// messages with the detail logged, never exposed to the caller.
#[derive(Error, Debug)]
pub enum AppError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Validation errors for user input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Authentication errors (bad credentials, bad tokens)
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Policy-forbidden requests (e.g. reserved role at registration)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Resource not found errors
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Conflict errors (duplicate email or phone)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Well-formed requests rejected by domain rules (OTP mismatch/expiry)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Outbound notification delivery errors
    #[error("Notification error: {0}")]
    Notification(String),

    /// Generic internal server errors
    #[error("Internal server error: {0}")]
    Internal(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Password hashing errors
    #[error("Password hashing error: {0}")]
    HashingError(#[from] bcrypt::BcryptError),
}

/// Standard error response structure for API consumers
#[derive(Serialize, Debug)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(error: &str, message: &str) -> Self {
        Self {
            error: error.to_string(),
            message: message.to_string(),
            details: None,
        }
    }

    pub fn with_details(error: &str, message: &str, details: serde_json::Value) -> Self {
        Self {
            error: error.to_string(),
            message: message.to_string(),
            details: Some(details),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            AppError::Database(e) => {
                log::error!("database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg),
            AppError::Authentication(msg) => {
                (StatusCode::UNAUTHORIZED, "AUTHENTICATION_ERROR", msg)
            }
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            AppError::Notification(e) => {
                log::error!("notification error: {}", e);
                (
                    StatusCode::BAD_GATEWAY,
                    "NOTIFICATION_ERROR",
                    "Notification delivery failed".to_string(),
                )
            }
            AppError::Internal(e) => {
                log::error!("internal error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
            AppError::Configuration(e) => {
                log::error!("configuration error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "CONFIGURATION_ERROR",
                    "Server configuration error".to_string(),
                )
            }
            AppError::HashingError(e) => {
                log::error!("password hashing error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "HASHING_ERROR",
                    "Password hashing error".to_string(),
                )
            }
        };

        let error_response = ErrorResponse::new(error_code, &message);
        (status, Json(error_response)).into_response()
    }
}

/// Result type alias for operations that can return AppError
pub type AppResult<T> = Result<T, AppError>;

/// Helper trait for converting other error types to AppError
pub trait IntoAppError<T> {
    fn into_app_error(self, context: &str) -> AppResult<T>;
}

impl<T, E> IntoAppError<T> for Result<T, E>
where
    E: fmt::Display,
{
    fn into_app_error(self, context: &str) -> AppResult<T> {
        self.map_err(|e| AppError::Internal(format!("{}: {}", context, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response_creation() {
        let error = ErrorResponse::new("TEST_ERROR", "Test message");
        assert_eq!(error.error, "TEST_ERROR");
        assert_eq!(error.message, "Test message");
        assert!(error.details.is_none());
    }

    #[test]
    fn test_error_response_with_details() {
        let details = serde_json::json!({"field": "email", "value": "invalid"});
        let error =
            ErrorResponse::with_details("VALIDATION_ERROR", "Invalid input", details.clone());
        assert_eq!(error.error, "VALIDATION_ERROR");
        assert_eq!(error.message, "Invalid input");
        assert_eq!(error.details, Some(details));
    }

    #[test]
    fn test_app_error_display() {
        let error = AppError::Validation("Invalid email".to_string());
        assert_eq!(error.to_string(), "Validation error: Invalid email");

        let error = AppError::Forbidden("Reserved role".to_string());
        assert_eq!(error.to_string(), "Forbidden: Reserved role");
    }
}
