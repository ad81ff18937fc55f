//! API key management HTTP handlers.
//!
//! This module implements the key-related API endpoints:
//! - POST /api-keys - Issue a new key
//! - GET /api-keys - List all keys
//! - GET /api-keys/usage - Usage log of the calling key

use axum::{
    Extension, Json,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    app::AppState,
    error::AppError,
    middleware::auth::AuthContext,
    models::api_key::{ApiKeyListResponse, CreateApiKeyRequest, UsageResponse},
    services::api_key_service,
};

/// Issue a new API key.
///
/// # Endpoint
///
/// `POST /api-keys`
///
/// # Request Body (optional)
///
/// ```json
/// {
///   "creator": "growth-team",
///   "usage_limit": 500
/// }
/// ```
///
/// # Response
///
/// - **Success (201 Created)**: The plaintext key, shown only this once
/// - **Error (400)**: Invalid JSON or negative limit
/// - **Error (500)**: Database error
///
/// ```json
/// {
///   "id": "550e8400-e29b-41d4-a716-446655440000",
///   "api_key": "sk-3f0c...",
///   "hash": "9b1d...",
///   "usage_limit": 100,
///   "message": "API Key created successfully. Store it securely!"
/// }
/// ```
pub async fn create_api_key(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    // An empty body means "all defaults"
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        CreateApiKeyRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| AppError::InvalidRequest(format!("Invalid JSON body: {e}")))?
    };

    let created =
        api_key_service::create_api_key(state.store.as_ref(), request, state.default_usage_limit)
            .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// List all API keys, newest first.
///
/// # Endpoint
///
/// `GET /api-keys`
///
/// # Response
///
/// ```json
/// {
///   "keys": [
///     {
///       "id": "550e8400-e29b-41d4-a716-446655440000",
///       "hash": "9b1d...",
///       "creator": "system",
///       "usage_limit": 100,
///       "usage_count": 3,
///       "created_at": "2025-12-20T10:00:00Z",
///       "updated_at": "2025-12-20T11:00:00Z"
///     }
///   ]
/// }
/// ```
///
/// # Security Note
///
/// This route is public and returns the stored hashes. Put it behind an operator-only
/// network boundary in production.
pub async fn list_api_keys(
    State(state): State<AppState>,
) -> Result<Json<ApiKeyListResponse>, AppError> {
    let keys = state.store.list_api_keys().await?;

    Ok(Json(ApiKeyListResponse { keys }))
}

/// Usage log of the calling key.
///
/// # Endpoint
///
/// `GET /api-keys/usage`
///
/// # Authentication
///
/// Requires a valid API key. Not metered.
pub async fn get_usage(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<UsageResponse>, AppError> {
    let usages = state.store.list_usage_for_key(auth.api_key_id).await?;

    Ok(Json(UsageResponse {
        api_key_id: auth.api_key_id,
        usage_count: auth.usage_count,
        usage_limit: auth.usage_limit,
        usages,
    }))
}
