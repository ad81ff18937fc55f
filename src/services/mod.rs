//! Business logic services.
//!
//! Services contain core business logic separated from HTTP handlers.
//! They validate input and coordinate the store with the scrape provider.

pub mod api_key_service;
pub mod scrape_service;
