//! Persistence gateway.
//!
//! Handlers and services talk to storage only through the [`Store`] trait, so the
//! Postgres implementation can be swapped (tests use an in-memory one).

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use crate::models::{
    api_key::{ApiKey, ApiKeyUsage, NewApiKey},
    linkedin::{LinkedInRecord, LinkedInRecordFilter, NewLinkedInPlaceholder},
    scrape::ScrapingStatus,
    website::WebsiteRecord,
};

mod postgres;

#[cfg(test)]
pub mod memory;

pub use postgres::PgStore;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, sqlx::Error>;

/// Typed read/write operations over the four service tables.
///
/// Every write either succeeds or returns the underlying error. Multi-row inserts are
/// a single statement; per-URL updates are not grouped in a transaction.
#[async_trait]
pub trait Store: Send + Sync {
    /// Cheap round trip used by the health check.
    async fn ping(&self) -> StoreResult<()>;

    async fn insert_api_key(&self, new_key: NewApiKey) -> StoreResult<ApiKey>;

    /// All keys, newest first.
    async fn list_api_keys(&self) -> StoreResult<Vec<ApiKey>>;

    async fn find_api_key_by_hash(&self, hash: &str) -> StoreResult<Option<ApiKey>>;

    /// Increment `usage_count` by one if and only if it is still below `usage_limit`.
    ///
    /// The check and the increment are one atomic operation. Returns the updated key,
    /// or `None` when the ceiling is reached (nothing is changed in that case).
    async fn increment_api_key_usage(&self, id: Uuid) -> StoreResult<Option<ApiKey>>;

    async fn record_usage(
        &self,
        api_key_id: Uuid,
        usage_type: &str,
        ref_id: &str,
    ) -> StoreResult<ApiKeyUsage>;

    /// Usage log for one key, newest first.
    async fn list_usage_for_key(&self, api_key_id: Uuid) -> StoreResult<Vec<ApiKeyUsage>>;

    async fn find_linkedin_record_by_url(&self, url: &str) -> StoreResult<Option<LinkedInRecord>>;

    async fn list_linkedin_records(
        &self,
        filter: &LinkedInRecordFilter,
    ) -> StoreResult<Vec<LinkedInRecord>>;

    /// Reserve pending rows. An existing row for the same URL is reset to pending in place.
    async fn insert_linkedin_placeholders(
        &self,
        placeholders: &[NewLinkedInPlaceholder],
    ) -> StoreResult<()>;

    /// Store a new payload; the previous payload is kept in `previous_data`.
    async fn update_linkedin_record(
        &self,
        url: &str,
        data: &Value,
        status: ScrapingStatus,
    ) -> StoreResult<Option<LinkedInRecord>>;

    async fn find_website_record_by_url(&self, url: &str) -> StoreResult<Option<WebsiteRecord>>;

    /// Reserve pending rows. An existing row for the same URL is reset to pending in place.
    async fn insert_website_placeholders(&self, urls: &[String]) -> StoreResult<()>;

    async fn update_website_record(
        &self,
        url: &str,
        data: &Value,
        status: ScrapingStatus,
    ) -> StoreResult<Option<WebsiteRecord>>;
}
