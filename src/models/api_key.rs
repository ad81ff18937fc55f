//! API Key model for authentication and usage metering.
//!
//! API keys authenticate callers of the scrape and summarize endpoints. They are stored in the database as SHA-256 hashes; the plaintext secret is only returned once, at creation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents an API key record from the database.
///
/// # Database Table
///
/// Maps to the `api_keys` table with columns:
/// - `id`: Unique identifier (UUID)
/// - `hash`: SHA-256 hash of the actual API key
/// - `creator`: Who issued this key
/// - `usage_limit`: Maximum number of metered calls
/// - `usage_count`: Metered calls made so far
/// - `created_at` / `updated_at`: Timestamps
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct ApiKey {
    /// Unique identifier for this API key
    pub id: Uuid,

    /// SHA-256 hash of the actual API key (64 hex characters)
    ///
    /// When a request comes in with "Bearer sk-abc123", we:
    /// 1. Hash "sk-abc123" with SHA-256
    /// 2. Look up this hash in the database
    /// 3. If found, authenticate the request
    pub hash: String,

    /// Who issued this key
    pub creator: String,

    /// Usage ceiling: metered requests are rejected once `usage_count` reaches it
    pub usage_limit: i32,

    /// Number of metered requests made with this key
    pub usage_count: i32,

    /// Timestamp when this API key was created
    pub created_at: DateTime<Utc>,

    /// Timestamp of the last change (usage increments included)
    pub updated_at: DateTime<Utc>,
}

/// Values needed to insert a new API key row.
#[derive(Debug, Clone)]
pub struct NewApiKey {
    pub hash: String,
    pub creator: String,
    pub usage_limit: i32,
}

/// Request body for creating an API key.
///
/// Both fields are optional; an empty body is accepted.
///
/// ```json
/// {
///   "creator": "growth-team",
///   "usage_limit": 500
/// }
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct CreateApiKeyRequest {
    /// Defaults to "system"
    pub creator: Option<String>,

    /// Defaults to the configured `DEFAULT_USAGE_LIMIT`
    pub usage_limit: Option<i32>,
}

/// Response body returned once when an API key is created.
#[derive(Debug, Serialize)]
pub struct CreateApiKeyResponse {
    pub id: Uuid,

    /// Plaintext secret. Never stored and never shown again.
    pub api_key: String,

    pub hash: String,

    pub usage_limit: i32,

    pub message: String,
}

/// Response body for `GET /api-keys`.
#[derive(Debug, Serialize)]
pub struct ApiKeyListResponse {
    pub keys: Vec<ApiKey>,
}

/// Kind of billed operation recorded in the usage log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageType {
    LinkedinScrape,
    WebsiteScrape,
    LinkedinSummary,
    WebsiteSummary,
}

impl UsageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UsageType::LinkedinScrape => "LINKEDIN_SCRAPE",
            UsageType::WebsiteScrape => "WEBSITE_SCRAPE",
            UsageType::LinkedinSummary => "LINKEDIN_SUMMARY",
            UsageType::WebsiteSummary => "WEBSITE_SUMMARY",
        }
    }
}

/// One row of the `api_key_usages` log.
///
/// `api_key_id` is a weak reference: it becomes NULL if the key row is removed.
/// `ref_id` is free text, usually the comma-joined list of URLs the call was about.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct ApiKeyUsage {
    pub id: Uuid,
    pub api_key_id: Option<Uuid>,
    pub usage_type: String,
    pub ref_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Response body for `GET /api-keys/usage`.
#[derive(Debug, Serialize)]
pub struct UsageResponse {
    pub api_key_id: Uuid,
    pub usage_count: i32,
    pub usage_limit: i32,
    pub usages: Vec<ApiKeyUsage>,
}
