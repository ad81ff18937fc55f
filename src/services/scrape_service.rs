//! Scrape orchestration - reconciles requested URLs with stored records.
//!
//! # Flow
//!
//! 1. Validate the URLs (well-formed http/https; LinkedIn URLs must be on linkedin.com)
//! 2. Split them into records already scraped successfully and URLs that need a scrape
//! 3. Nothing new: return the stored records without calling the provider
//! 4. Otherwise reserve pending placeholders, scrape only the new URLs and store the results
//! 5. Return the fresh records followed by the previously stored ones
//!
//! If the provider fails, the placeholders stay `pending`; the next request for the same
//! URL resets and retries that row in place (URLs are unique at the storage layer).

use serde_json::Value;
use url::Url;

use crate::{
    brightdata::{ScrapeKind, ScrapeProvider},
    error::AppError,
    models::{
        linkedin::{LinkedInRecord, LinkedInUrlType, NewLinkedInPlaceholder},
        scrape::ScrapingStatus,
        website::WebsiteRecord,
    },
    store::Store,
};

/// Upper bound on URLs per scrape request.
pub const MAX_URLS_PER_REQUEST: usize = 100;

const LINKEDIN_HOST: &str = "linkedin.com";

/// A validated URL: the string used as the storage key plus its parsed form.
#[derive(Debug, Clone)]
pub struct ScrapeTarget {
    pub url: String,
    pub parsed: Url,
}

/// Records returned by a scrape, plus the validated URLs the call was about.
#[derive(Debug)]
pub struct ScrapeOutcome<T> {
    /// Freshly scraped records first, then records that were already scraped
    pub records: Vec<T>,
    /// Trimmed, deduplicated request URLs in request order
    pub urls: Vec<String>,
}

/// Validate and deduplicate requested URLs.
///
/// Surrounding whitespace is trimmed; the trimmed string is the storage key.
///
/// # Errors
///
/// `InvalidRequest` if the list is empty or too long, or any URL is malformed,
/// not http/https, or (for LinkedIn) not on `linkedin.com`.
pub fn validate_urls(urls: &[String], kind: ScrapeKind) -> Result<Vec<ScrapeTarget>, AppError> {
    if urls.is_empty() {
        return Err(AppError::InvalidRequest(
            "urls must contain at least one URL".to_string(),
        ));
    }
    if urls.len() > MAX_URLS_PER_REQUEST {
        return Err(AppError::InvalidRequest(format!(
            "urls must not contain more than {MAX_URLS_PER_REQUEST} URLs"
        )));
    }

    let mut targets: Vec<ScrapeTarget> = Vec::with_capacity(urls.len());

    for raw in urls {
        let url = raw.trim();
        let parsed = Url::parse(url)
            .map_err(|_| AppError::InvalidRequest(format!("Invalid URL: {url}")))?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(AppError::InvalidRequest(format!(
                "URL must use http or https: {url}"
            )));
        }

        let Some(host) = parsed.host_str() else {
            return Err(AppError::InvalidRequest(format!("URL has no host: {url}")));
        };

        if kind == ScrapeKind::Linkedin && !is_linkedin_host(host) {
            return Err(AppError::InvalidRequest(format!(
                "Not a LinkedIn URL: {url}"
            )));
        }

        if targets.iter().any(|t| t.url == url) {
            continue;
        }
        targets.push(ScrapeTarget {
            url: url.to_string(),
            parsed,
        });
    }

    Ok(targets)
}

fn is_linkedin_host(host: &str) -> bool {
    let host = host.to_ascii_lowercase();
    host == LINKEDIN_HOST || host.ends_with(&format!(".{LINKEDIN_HOST}"))
}

/// Scrape LinkedIn URLs, reusing records that were already scraped successfully.
pub async fn scrape_linkedin(
    store: &dyn Store,
    scraper: &dyn ScrapeProvider,
    urls: &[String],
) -> Result<ScrapeOutcome<LinkedInRecord>, AppError> {
    let targets = validate_urls(urls, ScrapeKind::Linkedin)?;
    let requested: Vec<String> = targets.iter().map(|t| t.url.clone()).collect();

    let mut cached = Vec::new();
    let mut placeholders = Vec::new();

    for target in targets {
        match store.find_linkedin_record_by_url(&target.url).await? {
            Some(record) if record.scraping_status == ScrapingStatus::Success => {
                cached.push(record)
            }
            _ => placeholders.push(NewLinkedInPlaceholder {
                url_type: LinkedInUrlType::from_url(&target.parsed),
                url: target.url,
            }),
        }
    }

    if placeholders.is_empty() {
        tracing::info!(cached = cached.len(), "All LinkedIn URLs already scraped");
        return Ok(ScrapeOutcome {
            records: cached,
            urls: requested,
        });
    }

    store.insert_linkedin_placeholders(&placeholders).await?;

    let new_urls: Vec<String> = placeholders.into_iter().map(|p| p.url).collect();
    let payload = scraper.scrape(&new_urls, ScrapeKind::Linkedin).await?;

    let mut records = Vec::with_capacity(new_urls.len() + cached.len());
    for (url, item) in match_payload(&new_urls, payload) {
        let status = item_status(&item);
        if let Some(record) = store.update_linkedin_record(&url, &item, status).await? {
            records.push(record);
        }
    }

    tracing::info!(
        scraped = records.len(),
        cached = cached.len(),
        "LinkedIn scrape stored"
    );

    records.extend(cached);
    Ok(ScrapeOutcome {
        records,
        urls: requested,
    })
}

/// Scrape website URLs, reusing records that were already scraped successfully.
pub async fn scrape_websites(
    store: &dyn Store,
    scraper: &dyn ScrapeProvider,
    urls: &[String],
) -> Result<ScrapeOutcome<WebsiteRecord>, AppError> {
    let targets = validate_urls(urls, ScrapeKind::Website)?;
    let requested: Vec<String> = targets.iter().map(|t| t.url.clone()).collect();

    let mut cached = Vec::new();
    let mut new_urls = Vec::new();

    for target in targets {
        match store.find_website_record_by_url(&target.url).await? {
            Some(record) if record.scraping_status == ScrapingStatus::Success => {
                cached.push(record)
            }
            _ => new_urls.push(target.url),
        }
    }

    if new_urls.is_empty() {
        tracing::info!(cached = cached.len(), "All website URLs already scraped");
        return Ok(ScrapeOutcome {
            records: cached,
            urls: requested,
        });
    }

    store.insert_website_placeholders(&new_urls).await?;

    let payload = scraper.scrape(&new_urls, ScrapeKind::Website).await?;

    let mut records = Vec::with_capacity(new_urls.len() + cached.len());
    for (url, item) in match_payload(&new_urls, payload) {
        let status = item_status(&item);
        if let Some(record) = store.update_website_record(&url, &item, status).await? {
            records.push(record);
        }
    }

    tracing::info!(
        scraped = records.len(),
        cached = cached.len(),
        "Website scrape stored"
    );

    records.extend(cached);
    Ok(ScrapeOutcome {
        records,
        urls: requested,
    })
}

/// The provider marks per-URL failures with an `error` field when `include_errors` is set.
fn item_status(item: &Value) -> ScrapingStatus {
    match item.get("error") {
        Some(error) if !error.is_null() => ScrapingStatus::Failed,
        _ => ScrapingStatus::Success,
    }
}

/// URLs an item claims to be about, most specific first.
fn item_urls(item: &Value) -> impl Iterator<Item = &str> {
    [
        item.pointer("/input/url"),
        item.get("input_url"),
        item.get("url"),
    ]
    .into_iter()
    .flatten()
    .filter_map(Value::as_str)
}

fn same_url(a: &str, b: &str) -> bool {
    a == b || a.trim_end_matches('/') == b.trim_end_matches('/')
}

/// Pair each requested URL with the payload item for it, in request order.
///
/// The payload is a list of items, or a single object. A lone item that names no
/// requested URL is still assigned when exactly one URL was requested.
fn match_payload(urls: &[String], payload: Value) -> Vec<(String, Value)> {
    let mut items = match payload {
        Value::Array(items) => items,
        Value::Object(_) => vec![payload],
        _ => Vec::new(),
    };

    if urls.len() == 1
        && items.len() == 1
        && !item_urls(&items[0]).any(|candidate| same_url(candidate, &urls[0]))
    {
        tracing::warn!(url = %urls[0], "Snapshot item does not name the requested URL, assigning it anyway");
        return vec![(urls[0].clone(), items.remove(0))];
    }

    let mut matched = Vec::with_capacity(urls.len());
    for url in urls {
        let position = items
            .iter()
            .position(|item| item_urls(item).any(|candidate| same_url(candidate, url)));

        match position {
            Some(index) => matched.push((url.clone(), items.swap_remove(index))),
            None => tracing::warn!(%url, "No snapshot data for URL, leaving it pending"),
        }
    }

    if !items.is_empty() {
        tracing::warn!(unmatched = items.len(), "Snapshot contained items for unrequested URLs");
    }

    matched
}
