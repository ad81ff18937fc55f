//! In-memory [`Store`] used by unit and router tests.

use std::sync::{
    Mutex,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Value, json};
use uuid::Uuid;

use super::{Store, StoreResult};
use crate::models::{
    api_key::{ApiKey, ApiKeyUsage, NewApiKey},
    linkedin::{LinkedInRecord, LinkedInRecordFilter, NewLinkedInPlaceholder},
    scrape::ScrapingStatus,
    website::WebsiteRecord,
};

#[derive(Default)]
struct Tables {
    api_keys: Vec<ApiKey>,
    usages: Vec<ApiKeyUsage>,
    linkedin: Vec<LinkedInRecord>,
    websites: Vec<WebsiteRecord>,
}

/// Vec-backed store. `calls` counts every trait call so tests can assert that nothing touched storage.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn touch(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    /// Seed a key directly, bypassing the call counter.
    pub fn seed_api_key(&self, hash: &str, usage_limit: i32, usage_count: i32) -> ApiKey {
        let now = Utc::now();
        let key = ApiKey {
            id: Uuid::new_v4(),
            hash: hash.to_string(),
            creator: "test".to_string(),
            usage_limit,
            usage_count,
            created_at: now,
            updated_at: now,
        };
        self.tables.lock().unwrap().api_keys.push(key.clone());
        key
    }

    pub fn seed_website(&self, url: &str, data: Value, status: ScrapingStatus) {
        let now = Utc::now();
        self.tables.lock().unwrap().websites.push(WebsiteRecord {
            id: Uuid::new_v4(),
            url: url.to_string(),
            data,
            ai_summary: String::new(),
            ai_summary_status: "pending".to_string(),
            ai_summary_updated_at: None,
            scraping_status: status,
            created_at: now,
            updated_at: now,
        });
    }

    pub fn seed_linkedin(&self, placeholder: NewLinkedInPlaceholder, data: Value, status: ScrapingStatus) {
        let now = Utc::now();
        self.tables.lock().unwrap().linkedin.push(LinkedInRecord {
            id: Uuid::new_v4(),
            url: placeholder.url,
            url_type: placeholder.url_type,
            previous_data: json!({}),
            data,
            ai_summary: String::new(),
            ai_summary_status: "pending".to_string(),
            ai_summary_updated_at: None,
            scraping_status: status,
            created_at: now,
            updated_at: now,
        });
    }

    pub fn api_key(&self, id: Uuid) -> Option<ApiKey> {
        let tables = self.tables.lock().unwrap();
        tables.api_keys.iter().find(|k| k.id == id).cloned()
    }

    pub fn websites(&self) -> Vec<WebsiteRecord> {
        self.tables.lock().unwrap().websites.clone()
    }

    pub fn linkedin_records(&self) -> Vec<LinkedInRecord> {
        self.tables.lock().unwrap().linkedin.clone()
    }

    pub fn usages(&self) -> Vec<ApiKeyUsage> {
        self.tables.lock().unwrap().usages.clone()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        self.touch();
        Ok(())
    }

    async fn insert_api_key(&self, new_key: NewApiKey) -> StoreResult<ApiKey> {
        self.touch();
        let mut tables = self.tables.lock().unwrap();
        if tables.api_keys.iter().any(|k| k.hash == new_key.hash) {
            return Err(sqlx::Error::Protocol("duplicate api key hash".to_string()));
        }
        let now = Utc::now();
        let key = ApiKey {
            id: Uuid::new_v4(),
            hash: new_key.hash,
            creator: new_key.creator,
            usage_limit: new_key.usage_limit,
            usage_count: 0,
            created_at: now,
            updated_at: now,
        };
        tables.api_keys.push(key.clone());
        Ok(key)
    }

    async fn list_api_keys(&self) -> StoreResult<Vec<ApiKey>> {
        self.touch();
        let mut keys = self.tables.lock().unwrap().api_keys.clone();
        keys.reverse();
        Ok(keys)
    }

    async fn find_api_key_by_hash(&self, hash: &str) -> StoreResult<Option<ApiKey>> {
        self.touch();
        let tables = self.tables.lock().unwrap();
        Ok(tables.api_keys.iter().find(|k| k.hash == hash).cloned())
    }

    async fn increment_api_key_usage(&self, id: Uuid) -> StoreResult<Option<ApiKey>> {
        self.touch();
        let mut tables = self.tables.lock().unwrap();
        let Some(key) = tables.api_keys.iter_mut().find(|k| k.id == id) else {
            return Ok(None);
        };
        if key.usage_count >= key.usage_limit {
            return Ok(None);
        }
        key.usage_count += 1;
        key.updated_at = Utc::now();
        Ok(Some(key.clone()))
    }

    async fn record_usage(
        &self,
        api_key_id: Uuid,
        usage_type: &str,
        ref_id: &str,
    ) -> StoreResult<ApiKeyUsage> {
        self.touch();
        let now = Utc::now();
        let usage = ApiKeyUsage {
            id: Uuid::new_v4(),
            api_key_id: Some(api_key_id),
            usage_type: usage_type.to_string(),
            ref_id: ref_id.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.tables.lock().unwrap().usages.push(usage.clone());
        Ok(usage)
    }

    async fn list_usage_for_key(&self, api_key_id: Uuid) -> StoreResult<Vec<ApiKeyUsage>> {
        self.touch();
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .usages
            .iter()
            .rev()
            .filter(|u| u.api_key_id == Some(api_key_id))
            .cloned()
            .collect())
    }

    async fn find_linkedin_record_by_url(&self, url: &str) -> StoreResult<Option<LinkedInRecord>> {
        self.touch();
        let tables = self.tables.lock().unwrap();
        Ok(tables.linkedin.iter().find(|r| r.url == url).cloned())
    }

    async fn list_linkedin_records(
        &self,
        filter: &LinkedInRecordFilter,
    ) -> StoreResult<Vec<LinkedInRecord>> {
        self.touch();
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .linkedin
            .iter()
            .rev()
            .filter(|r| filter.url_type.is_none_or(|t| r.url_type == t))
            .filter(|r| filter.status.is_none_or(|s| r.scraping_status == s))
            .skip(filter.offset as usize)
            .take(filter.limit as usize)
            .cloned()
            .collect())
    }

    async fn insert_linkedin_placeholders(
        &self,
        placeholders: &[NewLinkedInPlaceholder],
    ) -> StoreResult<()> {
        self.touch();
        let mut tables = self.tables.lock().unwrap();
        let now = Utc::now();
        for placeholder in placeholders {
            if let Some(existing) = tables.linkedin.iter_mut().find(|r| r.url == placeholder.url) {
                if existing.scraping_status != ScrapingStatus::Success {
                    existing.scraping_status = ScrapingStatus::Pending;
                    existing.url_type = placeholder.url_type;
                    existing.updated_at = now;
                }
                continue;
            }
            tables.linkedin.push(LinkedInRecord {
                id: Uuid::new_v4(),
                url: placeholder.url.clone(),
                url_type: placeholder.url_type,
                previous_data: json!({}),
                data: json!({}),
                ai_summary: String::new(),
                ai_summary_status: "pending".to_string(),
                ai_summary_updated_at: None,
                scraping_status: ScrapingStatus::Pending,
                created_at: now,
                updated_at: now,
            });
        }
        Ok(())
    }

    async fn update_linkedin_record(
        &self,
        url: &str,
        data: &Value,
        status: ScrapingStatus,
    ) -> StoreResult<Option<LinkedInRecord>> {
        self.touch();
        let mut tables = self.tables.lock().unwrap();
        let Some(record) = tables.linkedin.iter_mut().find(|r| r.url == url) else {
            return Ok(None);
        };
        record.previous_data = std::mem::replace(&mut record.data, data.clone());
        record.scraping_status = status;
        record.updated_at = Utc::now();
        Ok(Some(record.clone()))
    }

    async fn find_website_record_by_url(&self, url: &str) -> StoreResult<Option<WebsiteRecord>> {
        self.touch();
        let tables = self.tables.lock().unwrap();
        Ok(tables.websites.iter().find(|r| r.url == url).cloned())
    }

    async fn insert_website_placeholders(&self, urls: &[String]) -> StoreResult<()> {
        self.touch();
        let mut tables = self.tables.lock().unwrap();
        let now = Utc::now();
        for url in urls {
            if let Some(existing) = tables.websites.iter_mut().find(|r| &r.url == url) {
                if existing.scraping_status != ScrapingStatus::Success {
                    existing.scraping_status = ScrapingStatus::Pending;
                    existing.updated_at = now;
                }
                continue;
            }
            tables.websites.push(WebsiteRecord {
                id: Uuid::new_v4(),
                url: url.clone(),
                data: json!({}),
                ai_summary: String::new(),
                ai_summary_status: "pending".to_string(),
                ai_summary_updated_at: None,
                scraping_status: ScrapingStatus::Pending,
                created_at: now,
                updated_at: now,
            });
        }
        Ok(())
    }

    async fn update_website_record(
        &self,
        url: &str,
        data: &Value,
        status: ScrapingStatus,
    ) -> StoreResult<Option<WebsiteRecord>> {
        self.touch();
        let mut tables = self.tables.lock().unwrap();
        let Some(record) = tables.websites.iter_mut().find(|r| r.url == url) else {
            return Ok(None);
        };
        record.data = data.clone();
        record.scraping_status = status;
        record.updated_at = Utc::now();
        Ok(Some(record.clone()))
    }
}
