//! Trigger → poll → fetch state machine.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::{DatasetApi, ProgressStatus, ScrapeError, ScrapeKind, ScrapeProvider};
use crate::config::BrightDataSettings;

/// Drives one scrape job to completion over a [`DatasetApi`].
///
/// The first progress check happens immediately after the trigger; every later check
/// waits `poll_interval`. At most `max_attempts` checks are made.
#[derive(Debug, Clone)]
pub struct SnapshotPoller<A> {
    api: A,
    poll_interval: Duration,
    max_attempts: u32,
}

impl<A: DatasetApi> SnapshotPoller<A> {
    pub fn new(api: A, poll_interval: Duration, max_attempts: u32) -> Self {
        Self {
            api,
            poll_interval,
            max_attempts,
        }
    }

    pub fn from_settings(api: A, settings: &BrightDataSettings) -> Self {
        Self::new(api, settings.poll_interval, settings.max_poll_attempts)
    }

    /// Poll until the snapshot leaves `Running` or the attempt cap is hit.
    async fn wait_for_snapshot(&self, snapshot_id: &str) -> Result<(), ScrapeError> {
        let mut attempts = 0;

        loop {
            if attempts > 0 {
                tokio::time::sleep(self.poll_interval).await;
            }
            attempts += 1;

            tracing::debug!(snapshot_id, attempt = attempts, "Checking scrape progress");
            let status = self.api.progress(snapshot_id).await?;

            match status {
                ProgressStatus::Ready => return Ok(()),
                ProgressStatus::Failed => {
                    return Err(ScrapeError::Failed {
                        snapshot_id: snapshot_id.to_string(),
                    });
                }
                ProgressStatus::Unknown => {
                    return Err(ScrapeError::UnexpectedStatus {
                        snapshot_id: snapshot_id.to_string(),
                    });
                }
                ProgressStatus::Running if attempts >= self.max_attempts => {
                    return Err(ScrapeError::TimedOut {
                        snapshot_id: snapshot_id.to_string(),
                        attempts,
                    });
                }
                ProgressStatus::Running => {}
            }
        }
    }
}

#[async_trait]
impl<A: DatasetApi> ScrapeProvider for SnapshotPoller<A> {
    async fn scrape(&self, urls: &[String], kind: ScrapeKind) -> Result<Value, ScrapeError> {
        if urls.is_empty() {
            return Err(ScrapeError::NoUrls);
        }

        tracing::info!(%kind, count = urls.len(), "Triggering scrape");
        let snapshot_id = self.api.trigger(urls, kind).await?;
        tracing::info!(%kind, %snapshot_id, "Scrape triggered");

        if let Err(e) = self.wait_for_snapshot(&snapshot_id).await {
            tracing::error!(%kind, %snapshot_id, error = %e, "Scrape did not complete");
            return Err(e);
        }

        tracing::info!(%kind, %snapshot_id, "Scrape ready, fetching data");
        self.api.snapshot(&snapshot_id).await
    }
}
