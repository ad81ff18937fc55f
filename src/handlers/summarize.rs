//! Summarize HTTP handlers.
//!
//! No model is called yet: both endpoints return the cleaned payload a summarizer would be given.

use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
};

use crate::{
    app::AppState,
    error::AppError,
    middleware::auth::AuthContext,
    models::{
        api_key::UsageType,
        scrape::ScrapingStatus,
        summarize::{SummarizeRequest, SummarizeResponse},
    },
    sanitize,
};

/// Prepare a stored LinkedIn record for summarization.
///
/// # Endpoint
///
/// `POST /summarize/linkedin`
///
/// # Request Body
///
/// ```json
/// { "url": "https://www.linkedin.com/in/jane-doe" }
/// ```
///
/// # Response
///
/// - **Success (200 OK)**: `{"message", "url", "input"}` with the sanitized profile
/// - **Error (404)**: The URL has not been scraped successfully
pub async fn summarize_linkedin(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    payload: Result<Json<SummarizeRequest>, JsonRejection>,
) -> Result<Json<SummarizeResponse>, AppError> {
    let Json(request) = payload?;
    let url = request.url.trim();

    let record = state
        .store
        .find_linkedin_record_by_url(url)
        .await?
        .filter(|r| r.scraping_status == ScrapingStatus::Success)
        .ok_or_else(|| AppError::NotFound(format!("No scraped LinkedIn data for {url}")))?;

    let input = sanitize::prepare_linkedin_profile(&record.data);

    state
        .store
        .record_usage(auth.api_key_id, UsageType::LinkedinSummary.as_str(), url)
        .await?;

    Ok(Json(SummarizeResponse {
        message: "Summarize LinkedIn (Placeholder)".to_string(),
        url: record.url,
        input,
    }))
}

/// Prepare a stored website record for summarization.
///
/// # Endpoint
///
/// `POST /summarize/website`
///
/// Same contract as [`summarize_linkedin`].
pub async fn summarize_website(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    payload: Result<Json<SummarizeRequest>, JsonRejection>,
) -> Result<Json<SummarizeResponse>, AppError> {
    let Json(request) = payload?;
    let url = request.url.trim();

    let record = state
        .store
        .find_website_record_by_url(url)
        .await?
        .filter(|r| r.scraping_status == ScrapingStatus::Success)
        .ok_or_else(|| AppError::NotFound(format!("No scraped website data for {url}")))?;

    let input = sanitize::prepare_website(&record.data);

    state
        .store
        .record_usage(auth.api_key_id, UsageType::WebsiteSummary.as_str(), url)
        .await?;

    Ok(Json(SummarizeResponse {
        message: "Summarize Website (Placeholder)".to_string(),
        url: record.url,
        input,
    }))
}
