//! Application configuration management.
//!
//! This module handles loading configuration from environment variables.
//! It uses the `envy` crate to automatically deserialize environment variables into a type-safe struct,
//! then validates the result once so that a misconfigured deployment fails at startup instead of on the first scrape.

use std::time::Duration;

use serde::Deserialize;

/// Default BrightData dataset API root.
pub const DEFAULT_BRIGHTDATA_BASE_URL: &str = "https://api.brightdata.com/datasets/v3";

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A variable is missing or cannot be parsed into the expected type.
    #[error("Invalid environment: {0}")]
    Env(#[from] envy::Error),

    /// A required variable is present but blank.
    #[error("Environment variable {0} must not be empty")]
    Empty(&'static str),

    /// A numeric variable is outside its allowed range.
    #[error("Environment variable {0} is out of range")]
    OutOfRange(&'static str),
}

/// Application configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `DATABASE_URL` (required): PostgreSQL connection string
/// - `SERVER_PORT` (optional): HTTP server port, defaults to 3000
/// - `DATABASE_MAX_CONNECTIONS` (optional): pool size, defaults to 5
/// - `DEFAULT_USAGE_LIMIT` (optional): usage ceiling for new API keys, defaults to 100
/// - `BRIGHTDATA_API_TOKEN` (required): bearer token for the dataset API
/// - `BRIGHTDATA_WEBSITE_DATASET_ID` (required): dataset used for website scrapes
/// - `BRIGHTDATA_LINKEDIN_DATASET_ID` (required): dataset used for LinkedIn scrapes
/// - `BRIGHTDATA_BASE_URL` (optional): dataset API root
/// - `BRIGHTDATA_POLL_INTERVAL_SECS` (optional): delay between progress polls, defaults to 5
/// - `BRIGHTDATA_MAX_POLL_ATTEMPTS` (optional): progress polls before giving up, defaults to 60
/// - `BRIGHTDATA_REQUEST_TIMEOUT_SECS` (optional): per-request HTTP timeout, defaults to 30
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,

    #[serde(default = "default_port")]
    pub server_port: u16,

    #[serde(default = "default_max_connections")]
    pub database_max_connections: u32,

    #[serde(default = "default_usage_limit")]
    pub default_usage_limit: i32,

    pub brightdata_api_token: String,

    pub brightdata_website_dataset_id: String,

    pub brightdata_linkedin_dataset_id: String,

    #[serde(default = "default_brightdata_base_url")]
    pub brightdata_base_url: String,

    #[serde(default = "default_poll_interval_secs")]
    pub brightdata_poll_interval_secs: u64,

    #[serde(default = "default_max_poll_attempts")]
    pub brightdata_max_poll_attempts: u32,

    #[serde(default = "default_request_timeout_secs")]
    pub brightdata_request_timeout_secs: u64,
}

/// Default port if SERVER_PORT environment variable is not set.
fn default_port() -> u16 {
    3000
}

fn default_max_connections() -> u32 {
    5
}

fn default_usage_limit() -> i32 {
    100
}

fn default_brightdata_base_url() -> String {
    DEFAULT_BRIGHTDATA_BASE_URL.to_string()
}

fn default_poll_interval_secs() -> u64 {
    5
}

fn default_max_poll_attempts() -> u32 {
    60
}

fn default_request_timeout_secs() -> u64 {
    30
}

/// Subset of the configuration needed by the BrightData client.
#[derive(Debug, Clone)]
pub struct BrightDataSettings {
    pub api_token: String,
    pub website_dataset_id: String,
    pub linkedin_dataset_id: String,
    pub base_url: String,
    pub poll_interval: Duration,
    pub max_poll_attempts: u32,
    /// Upper bound on any single HTTP call to the provider
    pub request_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// This method first attempts to load a `.env` file (which is optional),
    /// then reads environment variables, deserializes them into a Config struct and validates it.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Required environment variables are missing (e.g., DATABASE_URL, BRIGHTDATA_API_TOKEN)
    /// - Required environment variables are blank
    /// - Environment variable values cannot be parsed into expected types
    pub fn from_env() -> Result<Self, ConfigError> {
        // Try to load .env file if it exists (does nothing if not found)
        dotenvy::dotenv().ok();

        Self::from_vars(std::env::vars())
    }

    /// Build configuration from an explicit set of `(NAME, value)` pairs.
    ///
    /// Field names are automatically converted: database_url -> DATABASE_URL
    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config = envy::from_iter::<_, Config>(vars)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("DATABASE_URL", &self.database_url),
            ("BRIGHTDATA_API_TOKEN", &self.brightdata_api_token),
            (
                "BRIGHTDATA_WEBSITE_DATASET_ID",
                &self.brightdata_website_dataset_id,
            ),
            (
                "BRIGHTDATA_LINKEDIN_DATASET_ID",
                &self.brightdata_linkedin_dataset_id,
            ),
            ("BRIGHTDATA_BASE_URL", &self.brightdata_base_url),
        ];

        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::Empty(name));
            }
        }

        if self.brightdata_max_poll_attempts == 0 {
            return Err(ConfigError::OutOfRange("BRIGHTDATA_MAX_POLL_ATTEMPTS"));
        }
        if self.brightdata_request_timeout_secs == 0 {
            return Err(ConfigError::OutOfRange("BRIGHTDATA_REQUEST_TIMEOUT_SECS"));
        }
        if self.default_usage_limit < 0 {
            return Err(ConfigError::OutOfRange("DEFAULT_USAGE_LIMIT"));
        }
        if self.database_max_connections == 0 {
            return Err(ConfigError::OutOfRange("DATABASE_MAX_CONNECTIONS"));
        }

        Ok(())
    }

    /// Settings handed to the scrape client.
    pub fn brightdata(&self) -> BrightDataSettings {
        BrightDataSettings {
            api_token: self.brightdata_api_token.clone(),
            website_dataset_id: self.brightdata_website_dataset_id.clone(),
            linkedin_dataset_id: self.brightdata_linkedin_dataset_id.clone(),
            base_url: self.brightdata_base_url.trim_end_matches('/').to_string(),
            poll_interval: Duration::from_secs(self.brightdata_poll_interval_secs),
            max_poll_attempts: self.brightdata_max_poll_attempts,
            request_timeout: Duration::from_secs(self.brightdata_request_timeout_secs),
        }
    }
}
