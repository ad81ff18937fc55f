//! API key authentication and usage metering middleware.
//!
//! [`auth_middleware`] runs on every protected request to:
//! 1. Extract the API key from the Authorization header
//! 2. Hash it and verify it exists in the database
//! 3. Inject authentication context into the request
//! 4. Reject unauthorized requests with HTTP 401
//!
//! [`metering_middleware`] runs after it on billed routes and consumes one unit of the
//! key's usage ceiling, rejecting the request with HTTP 429 once the ceiling is reached.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::{app::AppState, error::AppError, services::api_key_service::hash_api_key};

/// Authentication context attached to authenticated requests.
///
/// This struct is inserted into the request's extension map and can be
/// extracted by route handlers to know who made the request.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// ID of the authenticated API key
    pub api_key_id: Uuid,

    /// Who issued the key
    pub creator: String,

    /// Ceiling of the key
    pub usage_limit: i32,

    /// Metered calls so far. Updated by the metering layer when it runs.
    pub usage_count: i32,
}

/// Pull the token out of `Authorization: Bearer <token>`.
///
/// Any deviation (missing header, non-ASCII value, other scheme, empty token) is `None`.
fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// API key authentication middleware function.
///
/// # Flow
///
/// 1. Extract `Authorization: Bearer <key>` header from request
/// 2. Hash the `<key>` using SHA-256
/// 3. Look up the hash through the store
/// 4. If found: inject `AuthContext` into request, call next handler
/// 5. If not found: return 401 Unauthorized error
///
/// A missing or malformed header is rejected before the store is touched.
///
/// # Headers
///
/// Expected header format:
/// ```text
/// Authorization: Bearer sk-abc123
/// ```
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let key_hash = bearer_token(&request)
        .map(hash_api_key)
        .ok_or(AppError::Unauthenticated)?;

    let api_key = state
        .store
        .find_api_key_by_hash(&key_hash)
        .await?
        .ok_or(AppError::Unauthenticated)?;

    // Route handlers can now extract this using Extension<AuthContext>
    request.extensions_mut().insert(AuthContext {
        api_key_id: api_key.id,
        creator: api_key.creator,
        usage_limit: api_key.usage_limit,
        usage_count: api_key.usage_count,
    });

    Ok(next.run(request).await)
}

/// Usage metering middleware function.
///
/// Must be layered inside [`auth_middleware`]. Increments the key's usage count with a single
/// conditional update, so concurrent requests on the same key cannot overshoot the ceiling.
///
/// # Returns
///
/// - `Err(AppError::RateLimited)` if the ceiling is already reached (nothing is incremented)
/// - `Err(AppError::Unauthenticated)` if no `AuthContext` is present
pub async fn metering_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth = request
        .extensions()
        .get::<AuthContext>()
        .cloned()
        .ok_or(AppError::Unauthenticated)?;

    let Some(updated) = state.store.increment_api_key_usage(auth.api_key_id).await? else {
        tracing::warn!(
            api_key_id = %auth.api_key_id,
            creator = %auth.creator,
            usage_limit = auth.usage_limit,
            "Usage limit reached"
        );
        return Err(AppError::RateLimited);
    };

    if let Some(auth) = request.extensions_mut().get_mut::<AuthContext>() {
        auth.usage_count = updated.usage_count;
    }

    Ok(next.run(request).await)
}
