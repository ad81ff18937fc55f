//! PostgreSQL implementation of the persistence gateway.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use super::{Store, StoreResult};
use crate::{
    db::DbPool,
    models::{
        api_key::{ApiKey, ApiKeyUsage, NewApiKey},
        linkedin::{LinkedInRecord, LinkedInRecordFilter, NewLinkedInPlaceholder},
        scrape::ScrapingStatus,
        website::WebsiteRecord,
    },
};

const API_KEY_COLUMNS: &str = "id, hash, creator, usage_limit, usage_count, created_at, updated_at";

const USAGE_COLUMNS: &str = "id, api_key_id, usage_type, ref_id, created_at, updated_at";

const LINKEDIN_COLUMNS: &str = "id, url, url_type, previous_data, data, ai_summary, \
     ai_summary_status, ai_summary_updated_at, scraping_status, created_at, updated_at";

const WEBSITE_COLUMNS: &str = "id, url, data, ai_summary, ai_summary_status, \
     ai_summary_updated_at, scraping_status, created_at, updated_at";

/// [`Store`] backed by a sqlx Postgres pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn insert_api_key(&self, new_key: NewApiKey) -> StoreResult<ApiKey> {
        sqlx::query_as::<_, ApiKey>(&format!(
            r#"
            INSERT INTO api_keys (hash, creator, usage_limit)
            VALUES ($1, $2, $3)
            RETURNING {API_KEY_COLUMNS}
            "#
        ))
        .bind(&new_key.hash)
        .bind(&new_key.creator)
        .bind(new_key.usage_limit)
        .fetch_one(&self.pool)
        .await
    }

    async fn list_api_keys(&self) -> StoreResult<Vec<ApiKey>> {
        sqlx::query_as::<_, ApiKey>(&format!(
            "SELECT {API_KEY_COLUMNS} FROM api_keys ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
    }

    async fn find_api_key_by_hash(&self, hash: &str) -> StoreResult<Option<ApiKey>> {
        sqlx::query_as::<_, ApiKey>(&format!(
            "SELECT {API_KEY_COLUMNS} FROM api_keys WHERE hash = $1"
        ))
        .bind(hash)
        .fetch_optional(&self.pool)
        .await
    }

    async fn increment_api_key_usage(&self, id: Uuid) -> StoreResult<Option<ApiKey>> {
        // Check and increment in one statement: concurrent requests cannot both pass the ceiling
        sqlx::query_as::<_, ApiKey>(&format!(
            r#"
            UPDATE api_keys
            SET usage_count = usage_count + 1,
                updated_at = NOW()
            WHERE id = $1 AND usage_count < usage_limit
            RETURNING {API_KEY_COLUMNS}
            "#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn record_usage(
        &self,
        api_key_id: Uuid,
        usage_type: &str,
        ref_id: &str,
    ) -> StoreResult<ApiKeyUsage> {
        sqlx::query_as::<_, ApiKeyUsage>(&format!(
            r#"
            INSERT INTO api_key_usages (api_key_id, usage_type, ref_id)
            VALUES ($1, $2, $3)
            RETURNING {USAGE_COLUMNS}
            "#
        ))
        .bind(api_key_id)
        .bind(usage_type)
        .bind(ref_id)
        .fetch_one(&self.pool)
        .await
    }

    async fn list_usage_for_key(&self, api_key_id: Uuid) -> StoreResult<Vec<ApiKeyUsage>> {
        sqlx::query_as::<_, ApiKeyUsage>(&format!(
            r#"
            SELECT {USAGE_COLUMNS}
            FROM api_key_usages
            WHERE api_key_id = $1
            ORDER BY created_at DESC
            "#
        ))
        .bind(api_key_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn find_linkedin_record_by_url(&self, url: &str) -> StoreResult<Option<LinkedInRecord>> {
        sqlx::query_as::<_, LinkedInRecord>(&format!(
            "SELECT {LINKEDIN_COLUMNS} FROM linkedin_data WHERE url = $1"
        ))
        .bind(url)
        .fetch_optional(&self.pool)
        .await
    }

    async fn list_linkedin_records(
        &self,
        filter: &LinkedInRecordFilter,
    ) -> StoreResult<Vec<LinkedInRecord>> {
        let mut query: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {LINKEDIN_COLUMNS} FROM linkedin_data WHERE TRUE"));

        if let Some(url_type) = filter.url_type {
            query.push(" AND url_type = ").push_bind(url_type);
        }
        if let Some(status) = filter.status {
            query.push(" AND scraping_status = ").push_bind(status);
        }

        query
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(filter.limit)
            .push(" OFFSET ")
            .push_bind(filter.offset);

        query
            .build_query_as::<LinkedInRecord>()
            .fetch_all(&self.pool)
            .await
    }

    async fn insert_linkedin_placeholders(
        &self,
        placeholders: &[NewLinkedInPlaceholder],
    ) -> StoreResult<()> {
        if placeholders.is_empty() {
            return Ok(());
        }

        let mut query: QueryBuilder<Postgres> =
            QueryBuilder::new("INSERT INTO linkedin_data (url, url_type, scraping_status) ");

        query.push_values(placeholders, |mut row, placeholder| {
            row.push_bind(&placeholder.url)
                .push_bind(placeholder.url_type)
                .push_bind(ScrapingStatus::Pending);
        });

        // A row that already succeeded is left alone
        query.push(
            r#"
            ON CONFLICT (url) DO UPDATE
            SET scraping_status = EXCLUDED.scraping_status,
                url_type = EXCLUDED.url_type,
                updated_at = NOW()
            WHERE linkedin_data.scraping_status <> 'success'
            "#,
        );

        query.build().execute(&self.pool).await?;
        Ok(())
    }

    async fn update_linkedin_record(
        &self,
        url: &str,
        data: &Value,
        status: ScrapingStatus,
    ) -> StoreResult<Option<LinkedInRecord>> {
        sqlx::query_as::<_, LinkedInRecord>(&format!(
            r#"
            UPDATE linkedin_data
            SET previous_data = data,
                data = $2,
                scraping_status = $3,
                updated_at = NOW()
            WHERE url = $1
            RETURNING {LINKEDIN_COLUMNS}
            "#
        ))
        .bind(url)
        .bind(data)
        .bind(status)
        .fetch_optional(&self.pool)
        .await
    }

    async fn find_website_record_by_url(&self, url: &str) -> StoreResult<Option<WebsiteRecord>> {
        sqlx::query_as::<_, WebsiteRecord>(&format!(
            "SELECT {WEBSITE_COLUMNS} FROM website_data WHERE url = $1"
        ))
        .bind(url)
        .fetch_optional(&self.pool)
        .await
    }

    async fn insert_website_placeholders(&self, urls: &[String]) -> StoreResult<()> {
        if urls.is_empty() {
            return Ok(());
        }

        let mut query: QueryBuilder<Postgres> =
            QueryBuilder::new("INSERT INTO website_data (url, scraping_status) ");

        query.push_values(urls, |mut row, url| {
            row.push_bind(url).push_bind(ScrapingStatus::Pending);
        });

        query.push(
            r#"
            ON CONFLICT (url) DO UPDATE
            SET scraping_status = EXCLUDED.scraping_status,
                updated_at = NOW()
            WHERE website_data.scraping_status <> 'success'
            "#,
        );

        query.build().execute(&self.pool).await?;
        Ok(())
    }

    async fn update_website_record(
        &self,
        url: &str,
        data: &Value,
        status: ScrapingStatus,
    ) -> StoreResult<Option<WebsiteRecord>> {
        sqlx::query_as::<_, WebsiteRecord>(&format!(
            r#"
            UPDATE website_data
            SET data = $2,
                scraping_status = $3,
                updated_at = NOW()
            WHERE url = $1
            RETURNING {WEBSITE_COLUMNS}
            "#
        ))
        .bind(url)
        .bind(data)
        .bind(status)
        .fetch_optional(&self.pool)
        .await
    }
}
