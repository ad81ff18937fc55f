//! Scrape HTTP handlers.
//!
//! - POST /scrape/linkedin - Scrape (or reuse) LinkedIn profiles, companies, posts and jobs
//! - POST /scrape/website - Scrape (or reuse) websites
//! - GET /scrape/linkedin/records - Browse stored LinkedIn records

use axum::{
    Extension, Json,
    extract::{Query, State, rejection::JsonRejection},
};

use crate::{
    app::AppState,
    error::AppError,
    middleware::auth::AuthContext,
    models::{
        api_key::UsageType,
        linkedin::{LinkedInRecord, LinkedInRecordFilter, LinkedInRecordQuery},
        scrape::{ScrapeRequest, ScrapeResponse},
        website::WebsiteRecord,
    },
    services::scrape_service,
};

/// Scrape LinkedIn URLs.
///
/// # Endpoint
///
/// `POST /scrape/linkedin`
///
/// # Authentication
///
/// Requires a valid API key; each call consumes one unit of the key's usage limit.
///
/// # Request Body
///
/// ```json
/// {
///   "urls": ["https://www.linkedin.com/in/jane-doe", "https://www.linkedin.com/company/acme"]
/// }
/// ```
///
/// Every URL must be on `linkedin.com`.
///
/// # Response
///
/// - **Success (200 OK)**: `{"records": [...]}`, freshly scraped records first, then
///   records that had already been scraped
/// - **Error (400)**: Missing or invalid URLs
/// - **Error (401)**: Invalid API key
/// - **Error (429)**: Usage limit reached
/// - **Error (500)**: Provider failure (message included) or database error
///
/// A scrape can take several minutes: the provider is polled until the snapshot is ready.
pub async fn scrape_linkedin(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    payload: Result<Json<ScrapeRequest>, JsonRejection>,
) -> Result<Json<ScrapeResponse<LinkedInRecord>>, AppError> {
    let Json(request) = payload?;

    let outcome = scrape_service::scrape_linkedin(
        state.store.as_ref(),
        state.scraper.as_ref(),
        &request.urls,
    )
    .await?;

    state
        .store
        .record_usage(
            auth.api_key_id,
            UsageType::LinkedinScrape.as_str(),
            &outcome.urls.join(","),
        )
        .await?;

    Ok(Json(ScrapeResponse {
        records: outcome.records,
    }))
}

/// Scrape website URLs.
///
/// # Endpoint
///
/// `POST /scrape/website`
///
/// Same contract as [`scrape_linkedin`], for any http/https URL.
pub async fn scrape_website(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    payload: Result<Json<ScrapeRequest>, JsonRejection>,
) -> Result<Json<ScrapeResponse<WebsiteRecord>>, AppError> {
    let Json(request) = payload?;

    let outcome = scrape_service::scrape_websites(
        state.store.as_ref(),
        state.scraper.as_ref(),
        &request.urls,
    )
    .await?;

    state
        .store
        .record_usage(
            auth.api_key_id,
            UsageType::WebsiteScrape.as_str(),
            &outcome.urls.join(","),
        )
        .await?;

    Ok(Json(ScrapeResponse {
        records: outcome.records,
    }))
}

/// List stored LinkedIn records.
///
/// # Endpoint
///
/// `GET /scrape/linkedin/records?url_type=profile&status=pending&limit=10&offset=0`
///
/// All parameters are optional. `limit` defaults to 10 and is capped at 100.
/// Not metered.
pub async fn list_linkedin_records(
    State(state): State<AppState>,
    Query(query): Query<LinkedInRecordQuery>,
) -> Result<Json<ScrapeResponse<LinkedInRecord>>, AppError> {
    let filter = LinkedInRecordFilter::from(query);
    let records = state.store.list_linkedin_records(&filter).await?;

    Ok(Json(ScrapeResponse { records }))
}
