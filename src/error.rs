//! Error types and HTTP error response handling.
//!
//! This module defines all application errors and how they are converted
//! into HTTP responses with appropriate status codes and JSON bodies.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::brightdata::ScrapeError;

/// Application-wide error type.
///
/// Each variant maps to a specific HTTP status code and error message.
///
/// # Error Categories
///
/// - **Client input**: malformed JSON, missing or invalid URLs
/// - **Authentication**: missing, malformed or unknown API keys; exhausted usage ceiling
/// - **Upstream**: the scraping provider failed, timed out or is misconfigured
/// - **Persistence**: any sqlx::Error from database operations
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Database operation failed (e.g., connection error, query error).
    ///
    /// Returns HTTP 500; details are logged, never sent to the client.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// API key is missing, malformed or unknown.
    ///
    /// Returns HTTP 401. The message is the same in every case so callers
    /// cannot tell a malformed key from an unknown one.
    #[error("Unauthorized: missing or invalid API key")]
    Unauthenticated,

    /// The key has used up its usage ceiling.
    ///
    /// Returns HTTP 429.
    #[error("Usage limit exceeded for this API key")]
    RateLimited,

    /// Requested record does not exist.
    ///
    /// Returns HTTP 404.
    #[error("{0}")]
    NotFound(String),

    /// Request body or parameters are invalid.
    ///
    /// Returns HTTP 400.
    /// The String contains details about what was invalid.
    #[error("Invalid request")]
    InvalidRequest(String),

    /// The scraping provider failed.
    ///
    /// Returns HTTP 500 with the provider's message embedded.
    #[error(transparent)]
    Scrape(#[from] ScrapeError),
}

/// Malformed or missing JSON bodies become a 400 with the extractor's explanation.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

/// Convert AppError into an HTTP response.
///
/// # Response Format
///
/// All errors return JSON in this format:
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
/// - `InvalidRequest` → 400 Bad Request
/// - `Unauthenticated` → 401 Unauthorized
/// - `NotFound` → 404 Not Found
/// - `RateLimited` → 429 Too Many Requests
/// - `Scrape` → 500 Internal Server Error (provider message included)
/// - `Database` → 500 Internal Server Error (hides details from client)
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::InvalidRequest(ref msg) => {
                (StatusCode::BAD_REQUEST, "invalid_request", msg.clone())
            }
            AppError::Unauthenticated => {
                (StatusCode::UNAUTHORIZED, "unauthenticated", self.to_string())
            }
            AppError::NotFound(ref msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            AppError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "rate_limited",
                self.to_string(),
            ),
            AppError::Scrape(ref e) => {
                tracing::error!(error = %e, "Scrape request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "scrape_failed",
                    e.to_string(),
                )
            }
            AppError::Database(ref e) => {
                tracing::error!(error = %e, "Database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
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
