//! Client for the BrightData dataset API.
//!
//! A scrape is asynchronous on the provider side:
//!
//! 1. **Trigger** - submit the URLs, receive a snapshot id
//! 2. **Poll** - ask for the snapshot's progress at a fixed interval
//! 3. **Fetch** - once the snapshot is ready, download the result payload once
//!
//! [`DatasetApi`] is the raw HTTP surface ([`BrightDataApi`]); [`SnapshotPoller`] drives
//! the trigger/poll/fetch state machine on top of it and is what the rest of the service
//! sees, through [`ScrapeProvider`].
//!
//! There is no backoff and no cancellation: once triggered, the job keeps running on the
//! provider even if the local poll loop gives up.

use std::fmt;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

mod client;
mod poller;

pub use client::BrightDataApi;
pub use poller::SnapshotPoller;

/// Which dataset a scrape runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrapeKind {
    Website,
    Linkedin,
}

impl fmt::Display for ScrapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScrapeKind::Website => f.write_str("website"),
            ScrapeKind::Linkedin => f.write_str("linkedin"),
        }
    }
}

/// Snapshot state reported by the progress endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressStatus {
    Running,
    Ready,
    Failed,
    #[serde(other)]
    Unknown,
}

/// Body returned by `POST /trigger`.
#[derive(Debug, Deserialize)]
pub struct TriggerResponse {
    pub snapshot_id: String,
}

/// Body returned by `GET /progress/{snapshot_id}`.
#[derive(Debug, Deserialize)]
pub struct ProgressResponse {
    pub status: ProgressStatus,
}

/// Errors from the scraping provider.
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    /// Token or dataset id missing; raised before any request is sent.
    #[error("BrightData {0} is not configured")]
    MissingConfig(&'static str),

    /// A request URL could not be built from the base URL and path.
    #[error("Invalid BrightData endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("No URLs to scrape")]
    NoUrls,

    /// Transport failure or undecodable body.
    #[error("BrightData request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx response.
    #[error("Failed to {stage}: {status} {body}")]
    Upstream {
        stage: &'static str,
        status: u16,
        body: String,
    },

    #[error("Scrape failed for snapshot ID: {snapshot_id}")]
    Failed { snapshot_id: String },

    #[error("Scrape timed out for snapshot ID: {snapshot_id} after {attempts} progress checks")]
    TimedOut { snapshot_id: String, attempts: u32 },

    #[error("Scrape entered an unknown state for snapshot ID: {snapshot_id}")]
    UnexpectedStatus { snapshot_id: String },
}

/// Raw dataset API operations.
#[async_trait]
pub trait DatasetApi: Send + Sync {
    /// Start a job for `urls`; returns the snapshot id.
    async fn trigger(&self, urls: &[String], kind: ScrapeKind) -> Result<String, ScrapeError>;

    async fn progress(&self, snapshot_id: &str) -> Result<ProgressStatus, ScrapeError>;

    /// Download a ready snapshot.
    async fn snapshot(&self, snapshot_id: &str) -> Result<Value, ScrapeError>;
}

/// Scrape a batch of URLs and return the provider payload.
#[async_trait]
pub trait ScrapeProvider: Send + Sync {
    async fn scrape(&self, urls: &[String], kind: ScrapeKind) -> Result<Value, ScrapeError>;
}
