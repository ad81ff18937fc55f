//! HTTP middleware components.
//!
//! Middleware are functions that run before route handlers.
//! They can:
//! - Authenticate requests
//! - Meter usage of billed routes
//! - Short-circuit requests (reject unauthorized or over-limit callers)

/// API key authentication and usage metering middleware
pub mod auth;
