//! Types shared by the LinkedIn and website scrape endpoints.

use serde::{Deserialize, Serialize};

/// Lifecycle of a scraped record.
///
/// Stored in the `scraping_status` Postgres enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "scraping_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ScrapingStatus {
    /// Placeholder reserved, provider result not known yet
    Pending,
    /// Provider returned a payload for this URL
    Success,
    /// Provider returned an error entry for this URL
    Failed,
}

/// Request body for `POST /scrape/linkedin` and `POST /scrape/website`.
///
/// ```json
/// {
///   "urls": ["https://www.linkedin.com/in/someone"]
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct ScrapeRequest {
    pub urls: Vec<String>,
}

/// Response body for the scrape endpoints.
#[derive(Debug, Serialize)]
pub struct ScrapeResponse<T> {
    pub records: Vec<T>,
}
