//! Data models representing database entities and request/response bodies.

/// API key and usage log models
pub mod api_key;
/// LinkedIn record model
pub mod linkedin;
/// Shared scrape types
pub mod scrape;
/// Summarize request/response
pub mod summarize;
/// Website record model
pub mod website;
