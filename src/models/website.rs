//! Website scrape records.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use super::scrape::ScrapingStatus;

/// Represents a row of the `website_data` table.
///
/// Same lifecycle as [`super::linkedin::LinkedInRecord`]: a pending placeholder first,
/// then `success` with the provider payload in `data`.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct WebsiteRecord {
    pub id: Uuid,
    pub url: String,
    pub data: Value,
    pub ai_summary: String,
    pub ai_summary_status: String,
    pub ai_summary_updated_at: Option<DateTime<Utc>>,
    pub scraping_status: ScrapingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
