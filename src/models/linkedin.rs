//! LinkedIn scrape records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;
use uuid::Uuid;

use super::scrape::ScrapingStatus;

/// What a LinkedIn URL points at.
///
/// Stored in the `linkedin_url_type` Postgres enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "linkedin_url_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LinkedInUrlType {
    Profile,
    Company,
    Post,
    Job,
}

impl LinkedInUrlType {
    /// Classify a LinkedIn URL by its first path segment.
    ///
    /// Anything unrecognised is treated as a profile.
    pub fn from_url(url: &Url) -> Self {
        let mut segments = url.path_segments().into_iter().flatten();

        match segments.next() {
            Some("company") | Some("school") | Some("showcase") => LinkedInUrlType::Company,
            Some("posts") | Some("pulse") => LinkedInUrlType::Post,
            Some("feed") if segments.next() == Some("update") => LinkedInUrlType::Post,
            Some("jobs") => LinkedInUrlType::Job,
            _ => LinkedInUrlType::Profile,
        }
    }
}

/// Represents a row of the `linkedin_data` table.
///
/// `url` is unique. When a URL is scraped again, the previous payload moves to
/// `previous_data` before `data` is overwritten.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct LinkedInRecord {
    pub id: Uuid,
    pub url: String,
    pub url_type: LinkedInUrlType,
    pub previous_data: Value,
    pub data: Value,
    pub ai_summary: String,
    pub ai_summary_status: String,
    pub ai_summary_updated_at: Option<DateTime<Utc>>,
    pub scraping_status: ScrapingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Placeholder row to reserve before a scrape is triggered.
#[derive(Debug, Clone)]
pub struct NewLinkedInPlaceholder {
    pub url: String,
    pub url_type: LinkedInUrlType,
}

/// Query string for `GET /scrape/linkedin/records`.
///
/// # Example
///
/// `/scrape/linkedin/records?url_type=company&status=pending&limit=20&offset=40`
#[derive(Debug, Default, Deserialize)]
pub struct LinkedInRecordQuery {
    pub url_type: Option<LinkedInUrlType>,
    pub status: Option<ScrapingStatus>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Validated listing filter handed to the store.
#[derive(Debug, Clone)]
pub struct LinkedInRecordFilter {
    pub url_type: Option<LinkedInUrlType>,
    pub status: Option<ScrapingStatus>,
    pub limit: i64,
    pub offset: i64,
}

impl LinkedInRecordFilter {
    pub const DEFAULT_LIMIT: i64 = 10;
    pub const MAX_LIMIT: i64 = 100;
}

impl From<LinkedInRecordQuery> for LinkedInRecordFilter {
    fn from(query: LinkedInRecordQuery) -> Self {
        Self {
            url_type: query.url_type,
            status: query.status,
            limit: query
                .limit
                .unwrap_or(Self::DEFAULT_LIMIT)
                .clamp(1, Self::MAX_LIMIT),
            offset: query.offset.unwrap_or(0).max(0),
        }
    }
}
