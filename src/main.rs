//! Scrape Gateway - Main Application Entry Point
//!
//! A REST API server that scrapes LinkedIn and website URLs through BrightData, caches the
//! results in PostgreSQL and meters every billed call against a per-key usage ceiling.
//!
//! # Architecture
//!
//! - **Web Framework**: Axum (async HTTP server)
//! - **Database**: PostgreSQL with sqlx (async queries)
//! - **Authentication**: API key with SHA-256 hashing
//! - **Scraping**: BrightData dataset API (trigger, poll, download)
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment variables
//! 2. Create database connection pool
//! 3. Run database migrations
//! 4. Build the BrightData client
//! 5. Build HTTP router with routes and middleware
//! 6. Start server on configured port

mod app;
mod brightdata;
mod config;
mod db;
mod error;
mod handlers;
mod middleware;
mod models;
mod sanitize;
mod services;
mod store;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::{
    app::AppState,
    brightdata::{BrightDataApi, SnapshotPoller},
    store::PgStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Reads RUST_LOG (defaults to "info" level)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = config::Config::from_env()?;
    tracing::info!("Configuration loaded");

    let pool = db::create_pool(&config.database_url, config.database_max_connections).await?;
    tracing::info!(
        max_connections = config.database_max_connections,
        "Database pool created"
    );

    db::run_migrations(&pool).await?;
    tracing::info!("Database migrations complete");

    let settings = config.brightdata();
    let scraper = SnapshotPoller::from_settings(BrightDataApi::new(&settings)?, &settings);
    tracing::info!(
        base_url = %settings.base_url,
        poll_interval_secs = settings.poll_interval.as_secs(),
        max_poll_attempts = settings.max_poll_attempts,
        request_timeout_secs = settings.request_timeout.as_secs(),
        "BrightData client ready"
    );

    let app = app::router(AppState {
        store: Arc::new(PgStore::new(pool)),
        scraper: Arc::new(scraper),
        default_usage_limit: config.default_usage_limit,
    });

    // Bind to network address and start server
    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
