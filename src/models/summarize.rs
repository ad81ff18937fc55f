//! Request/response types for the summarize endpoints.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request body for `POST /summarize/linkedin` and `POST /summarize/website`.
#[derive(Debug, Deserialize)]
pub struct SummarizeRequest {
    pub url: String,
}

/// Placeholder response: the prepared input an AI summarizer would receive.
#[derive(Debug, Serialize)]
pub struct SummarizeResponse {
    pub message: String,
    pub url: String,
    pub input: Value,
}
