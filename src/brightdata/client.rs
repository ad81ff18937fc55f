//! HTTP transport for the BrightData dataset API.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Serialize;
use serde_json::Value;
use url::Url;

use super::{DatasetApi, ProgressResponse, ProgressStatus, ScrapeError, ScrapeKind, TriggerResponse};
use crate::config::BrightDataSettings;

/// Extra fields requested for website scrapes.
const WEBSITE_OUTPUT_FIELDS: &str = "markdown|page_html|ld_json|html2text";

/// One entry of the trigger request body.
#[derive(Debug, Serialize)]
struct TriggerInput<'a> {
    url: &'a str,
}

/// reqwest-backed [`DatasetApi`].
///
/// Every request carries `Authorization: Bearer <token>`.
#[derive(Debug, Clone)]
pub struct BrightDataApi {
    http: Client,
    api_token: String,
    website_dataset_id: String,
    linkedin_dataset_id: String,
    base_url: String,
}

impl BrightDataApi {
    /// Build the client.
    ///
    /// # Errors
    ///
    /// - `ScrapeError::MissingConfig` if the token or either dataset id is blank
    /// - `ScrapeError::Http` if the HTTP client cannot be built
    pub fn new(settings: &BrightDataSettings) -> Result<Self, ScrapeError> {
        if settings.api_token.trim().is_empty() {
            return Err(ScrapeError::MissingConfig("API token"));
        }
        if settings.website_dataset_id.trim().is_empty() {
            return Err(ScrapeError::MissingConfig("website dataset ID"));
        }
        if settings.linkedin_dataset_id.trim().is_empty() {
            return Err(ScrapeError::MissingConfig("LinkedIn dataset ID"));
        }

        // Bounds every call, so a provider that never answers still ends the poll loop
        let http = Client::builder().timeout(settings.request_timeout).build()?;

        Ok(Self {
            http,
            api_token: settings.api_token.clone(),
            website_dataset_id: settings.website_dataset_id.clone(),
            linkedin_dataset_id: settings.linkedin_dataset_id.clone(),
            base_url: settings.base_url.clone(),
        })
    }

    /// Join `path` onto the base URL and append query parameters in order.
    fn endpoint(&self, path: &str, params: &[(&str, &str)]) -> Result<Url, ScrapeError> {
        let raw = format!("{}/{}", self.base_url, path);
        let mut url =
            Url::parse(&raw).map_err(|e| ScrapeError::InvalidEndpoint(format!("{raw}: {e}")))?;
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }
        Ok(url)
    }

    fn trigger_endpoint(&self, kind: ScrapeKind) -> Result<Url, ScrapeError> {
        let mut params = vec![("include_errors", "true")];
        let dataset_id = match kind {
            ScrapeKind::Website => {
                params.push(("custom_output_fields", WEBSITE_OUTPUT_FIELDS));
                self.website_dataset_id.as_str()
            }
            ScrapeKind::Linkedin => self.linkedin_dataset_id.as_str(),
        };
        params.push(("dataset_id", dataset_id));

        self.endpoint("trigger", &params)
    }

    /// Turn a non-2xx response into `ScrapeError::Upstream` with the body text.
    async fn ensure_success(response: Response, stage: &'static str) -> Result<Response, ScrapeError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(ScrapeError::Upstream {
            stage,
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl DatasetApi for BrightDataApi {
    async fn trigger(&self, urls: &[String], kind: ScrapeKind) -> Result<String, ScrapeError> {
        let body: Vec<TriggerInput<'_>> = urls
            .iter()
            .map(|url| TriggerInput { url: url.as_str() })
            .collect();

        let response = self
            .http
            .post(self.trigger_endpoint(kind)?)
            .bearer_auth(&self.api_token)
            .json(&body)
            .send()
            .await?;

        let trigger: TriggerResponse = Self::ensure_success(response, "trigger scrape")
            .await?
            .json()
            .await?;

        Ok(trigger.snapshot_id)
    }

    async fn progress(&self, snapshot_id: &str) -> Result<ProgressStatus, ScrapeError> {
        let response = self
            .http
            .get(self.endpoint(&format!("progress/{snapshot_id}"), &[])?)
            .bearer_auth(&self.api_token)
            .send()
            .await?;

        let progress: ProgressResponse = Self::ensure_success(response, "check scrape progress")
            .await?
            .json()
            .await?;

        Ok(progress.status)
    }

    async fn snapshot(&self, snapshot_id: &str) -> Result<Value, ScrapeError> {
        let response = self
            .http
            .get(self.endpoint(
                &format!("snapshot/{snapshot_id}"),
                &[("format", "json"), ("compress", "true")],
            )?)
            .bearer_auth(&self.api_token)
            .send()
            .await?;

        let payload = Self::ensure_success(response, "fetch scrape data")
            .await?
            .json()
            .await?;

        Ok(payload)
    }
}
