//! Error types and HTTP error response handling.
//!
//! This module defines all application errors and how they are converted
//! into HTTP responses with appropriate status codes and JSON bodies.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Application-wide error type.
///
/// # Error Categories
///
/// - **Database errors**: any `sqlx::Error`; retryable serialization
///   conflicts are absorbed by the retry loop before a caller ever sees
///   this variant, so by the time it reaches a response it is genuine.
/// - **Resource errors**: the target user does not exist.
/// - **Business-rule errors**: the debit would take the balance negative.
/// - **Consistency errors**: a duplicate-key replay found no prior record.
/// - **Validation errors**: malformed request data.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Database operation failed.
    ///
    /// Wraps any `sqlx::Error` via `#[from]`.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Target user does not exist.
    ///
    /// Returns HTTP 404 Not Found.
    #[error("User not found")]
    UserNotFound,

    /// Balance is too low for the requested debit.
    ///
    /// Returns HTTP 409 Conflict.
    #[error("Insufficient funds")]
    InsufficientFunds,

    /// A duplicate idempotency key was detected but the replay lookup
    /// found no existing record. The true cause is indeterminate without
    /// investigation, so this is surfaced as its own error rather than
    /// being folded into insufficient-funds or a silent success.
    ///
    /// Returns HTTP 500 Internal Server Error.
    #[error("Transaction conflict could not be resolved")]
    Conflict,

    /// Request body, parameters, or headers are invalid.
    ///
    /// Returns HTTP 400 Bad Request; the String says what was wrong.
    #[error("Invalid request")]
    InvalidRequest(String),
}

/// Convert AppError into an HTTP response.
///
/// Allows handlers to return `Result<T, AppError>` and have errors
/// converted automatically.
///
/// # Response Format
///
/// ```json
/// {
///   "error": {
///     "code": "error_type",
///     "message": "Human-readable error message"
///   }
/// }
/// ```
///
/// # Status Code Mapping
///
/// - `UserNotFound` → 404 Not Found
/// - `InsufficientFunds` → 409 Conflict
/// - `InvalidRequest` → 400 Bad Request
/// - `Conflict` → 500 Internal Server Error
/// - `Database` → 500 Internal Server Error (details hidden from client)
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::UserNotFound => (StatusCode::NOT_FOUND, "user_not_found", self.to_string()),
            AppError::InsufficientFunds => {
                (StatusCode::CONFLICT, "insufficient_funds", self.to_string())
            }
            AppError::InvalidRequest(ref msg) => {
                (StatusCode::BAD_REQUEST, "invalid_request", msg.clone())
            }
            AppError::Conflict => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "conflict",
                self.to_string(),
            ),
            AppError::Database(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "An internal error occurred".to_string(),
            ),
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
