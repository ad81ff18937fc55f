//! HTTP request handlers (route handlers).
//!
//! Each handler is an async function that:
//! 1. Receives HTTP request data (JSON body, query params, auth context)
//! 2. Delegates to the store or a service
//! 3. Returns HTTP response (JSON, status code)

/// API key management endpoints
pub mod api_keys;
/// Health check endpoint
pub mod health;
/// Scrape endpoints
pub mod scrape;
/// Placeholder summarize endpoints
pub mod summarize;
