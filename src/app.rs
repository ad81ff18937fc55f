//! Shared application state and the HTTP router.

use std::sync::Arc;

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::{
    brightdata::ScrapeProvider,
    handlers,
    middleware::auth::{auth_middleware, metering_middleware},
    store::Store,
};

/// Dependencies shared by every handler.
///
/// Cloned per request; everything inside is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub scraper: Arc<dyn ScrapeProvider>,
    /// Ceiling given to keys created without an explicit `usage_limit`
    pub default_usage_limit: i32,
}

/// Build the application router.
///
/// Three route groups:
/// - public: health check and key management
/// - authenticated: read-only routes that need a key but cost nothing
/// - metered: scrape and summarize routes, each call consumes one unit of the key's ceiling
pub fn router(state: AppState) -> Router {
    // Metering runs inside authentication, so it can read the AuthContext
    let metered_routes = Router::new()
        .route(
            "/scrape/linkedin",
            post(handlers::scrape::scrape_linkedin),
        )
        .route("/scrape/website", post(handlers::scrape::scrape_website))
        .route(
            "/summarize/linkedin",
            post(handlers::summarize::summarize_linkedin),
        )
        .route(
            "/summarize/website",
            post(handlers::summarize::summarize_website),
        )
        .route_layer(from_fn_with_state(state.clone(), metering_middleware));

    let authenticated_routes = Router::new()
        .route("/api-keys/usage", get(handlers::api_keys::get_usage))
        .route(
            "/scrape/linkedin/records",
            get(handlers::scrape::list_linkedin_records),
        )
        .merge(metered_routes)
        .route_layer(from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        // Public routes (no authentication required)
        .route("/healthz", get(handlers::health::health_check))
        .route(
            "/api-keys",
            post(handlers::api_keys::create_api_key).get(handlers::api_keys::list_api_keys),
        )
        .merge(authenticated_routes)
        // Innermost first: the request id is set before tracing sees the request
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use axum::{
        body::{Body, to_bytes},
        http::{
            Request, StatusCode,
            header::{AUTHORIZATION, CONTENT_TYPE},
        },
        response::Response,
    };
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::{
        brightdata::{ScrapeError, ScrapeKind},
        models::{
            linkedin::{LinkedInUrlType, NewLinkedInPlaceholder},
            scrape::ScrapingStatus,
        },
        services::api_key_service::hash_api_key,
        store::memory::MemoryStore,
    };

    const KEY: &str = "sk-test-key";

    /// Answers with one item per requested URL.
    #[derive(Default)]
    struct FakeScraper {
        requests: Mutex<Vec<Vec<String>>>,
    }

    impl FakeScraper {
        fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ScrapeProvider for FakeScraper {
        async fn scrape(&self, urls: &[String], _kind: ScrapeKind) -> Result<Value, ScrapeError> {
            self.requests.lock().unwrap().push(urls.to_vec());
            Ok(Value::Array(
                urls.iter()
                    .map(|url| json!({ "input": { "url": url }, "title": "Example" }))
                    .collect(),
            ))
        }
    }

    struct TestApp {
        store: Arc<MemoryStore>,
        scraper: Arc<FakeScraper>,
        router: Router,
    }

    fn test_app() -> TestApp {
        let store = Arc::new(MemoryStore::new());
        let scraper = Arc::new(FakeScraper::default());
        let router = router(AppState {
            store: store.clone(),
            scraper: scraper.clone(),
            default_usage_limit: 100,
        });

        TestApp {
            store,
            scraper,
            router,
        }
    }

    fn post_json(uri: &str, key: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(CONTENT_TYPE, "application/json");
        if let Some(key) = key {
            builder = builder.header(AUTHORIZATION, format!("Bearer {key}"));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn get(uri: &str, key: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(key) = key {
            builder = builder.header(AUTHORIZATION, format!("Bearer {key}"));
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn missing_key_is_rejected_before_storage() {
        let app = test_app();

        let response = app
            .router
            .oneshot(post_json(
                "/scrape/website",
                None,
                json!({ "urls": ["https://example.com"] }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(app.store.calls(), 0);
        assert_eq!(app.scraper.request_count(), 0);
    }

    #[tokio::test]
    async fn unknown_key_gets_the_same_401() {
        let app = test_app();
        let request_body = json!({ "urls": ["https://example.com"] });

        let missing = app
            .router
            .clone()
            .oneshot(post_json("/scrape/website", None, request_body.clone()))
            .await
            .unwrap();
        let unknown = app
            .router
            .oneshot(post_json("/scrape/website", Some("sk-nope"), request_body))
            .await
            .unwrap();

        assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(missing).await, json_body(unknown).await);
    }

    #[tokio::test]
    async fn exhausted_key_gets_429_without_incrementing() {
        let app = test_app();
        let key = app.store.seed_api_key(&hash_api_key(KEY), 1, 1);

        let response = app
            .router
            .oneshot(post_json(
                "/scrape/website",
                Some(KEY),
                json!({ "urls": ["https://example.com"] }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(json_body(response).await["error"]["code"], "rate_limited");
        assert_eq!(app.store.api_key(key.id).unwrap().usage_count, 1);
        assert_eq!(app.scraper.request_count(), 0);
    }

    #[tokio::test]
    async fn scrape_website_end_to_end() {
        let app = test_app();
        let key = app.store.seed_api_key(&hash_api_key(KEY), 10, 0);

        let response = app
            .router
            .oneshot(post_json(
                "/scrape/website",
                Some(KEY),
                json!({ "urls": ["https://example.com"] }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        let records = body["records"].as_array().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["url"], "https://example.com");
        assert_eq!(records[0]["scraping_status"], "success");
        assert_eq!(records[0]["data"]["title"], "Example");

        assert_eq!(app.scraper.request_count(), 1);
        assert_eq!(app.store.websites().len(), 1);
        assert_eq!(app.store.api_key(key.id).unwrap().usage_count, 1);

        let usages = app.store.usages();
        assert_eq!(usages.len(), 1);
        assert_eq!(usages[0].usage_type, "WEBSITE_SCRAPE");
        assert_eq!(usages[0].ref_id, "https://example.com");
    }

    #[tokio::test]
    async fn usage_log_holds_the_validated_urls() {
        let app = test_app();
        app.store.seed_api_key(&hash_api_key(KEY), 10, 0);

        let response = app
            .router
            .oneshot(post_json(
                "/scrape/website",
                Some(KEY),
                json!({
                    "urls": [" https://example.com ", "https://example.com", "https://rust-lang.org"]
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let usages = app.store.usages();
        assert_eq!(usages.len(), 1);
        assert_eq!(usages[0].ref_id, "https://example.com,https://rust-lang.org");
    }

    fn seed_linkedin(
        store: &MemoryStore,
        url: &str,
        url_type: LinkedInUrlType,
        status: ScrapingStatus,
    ) {
        store.seed_linkedin(
            NewLinkedInPlaceholder {
                url: url.to_string(),
                url_type,
            },
            json!({ "name": url }),
            status,
        );
    }

    #[tokio::test]
    async fn linkedin_records_are_filtered_and_paged() {
        let app = test_app();
        let key = app.store.seed_api_key(&hash_api_key(KEY), 10, 3);
        seed_linkedin(
            &app.store,
            "https://www.linkedin.com/company/acme",
            LinkedInUrlType::Company,
            ScrapingStatus::Success,
        );
        seed_linkedin(
            &app.store,
            "https://www.linkedin.com/company/pending",
            LinkedInUrlType::Company,
            ScrapingStatus::Pending,
        );
        seed_linkedin(
            &app.store,
            "https://www.linkedin.com/in/jane",
            LinkedInUrlType::Profile,
            ScrapingStatus::Success,
        );
        seed_linkedin(
            &app.store,
            "https://www.linkedin.com/company/globex",
            LinkedInUrlType::Company,
            ScrapingStatus::Success,
        );
        assert_eq!(app.store.linkedin_records().len(), 4);

        let all_matching = app
            .router
            .clone()
            .oneshot(get(
                "/scrape/linkedin/records?url_type=company&status=success",
                Some(KEY),
            ))
            .await
            .unwrap();
        assert_eq!(all_matching.status(), StatusCode::OK);
        let body = json_body(all_matching).await;
        let urls: Vec<_> = body["records"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["url"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(
            urls,
            [
                "https://www.linkedin.com/company/globex",
                "https://www.linkedin.com/company/acme"
            ]
        );

        let first_page = app
            .router
            .clone()
            .oneshot(get(
                "/scrape/linkedin/records?url_type=company&status=success&limit=1",
                Some(KEY),
            ))
            .await
            .unwrap();
        let body = json_body(first_page).await;
        let records = body["records"].as_array().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["url_type"], "company");
        assert_eq!(records[0]["scraping_status"], "success");

        // Authenticated but free
        assert_eq!(app.store.api_key(key.id).unwrap().usage_count, 3);
        assert!(app.store.usages().is_empty());

        let anonymous = app
            .router
            .oneshot(get("/scrape/linkedin/records", None))
            .await
            .unwrap();
        assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn malformed_body_is_a_400() {
        let app = test_app();
        app.store.seed_api_key(&hash_api_key(KEY), 10, 0);

        let response = app
            .router
            .oneshot(post_json(
                "/scrape/linkedin",
                Some(KEY),
                json!({ "links": [] }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"]["code"], "invalid_request");
    }

    #[tokio::test]
    async fn created_key_authenticates() {
        let app = test_app();

        let created = app
            .router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api-keys")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(created.status(), StatusCode::CREATED);
        let created = json_body(created).await;
        let api_key = created["api_key"].as_str().unwrap().to_string();
        assert_eq!(created["usage_limit"], 100);

        let listed = app
            .router
            .clone()
            .oneshot(get("/api-keys", None))
            .await
            .unwrap();
        let listed = json_body(listed).await;
        assert_eq!(listed["keys"].as_array().unwrap().len(), 1);
        assert_eq!(listed["keys"][0]["hash"], created["hash"]);

        let usage = app
            .router
            .oneshot(get("/api-keys/usage", Some(&api_key)))
            .await
            .unwrap();
        assert_eq!(usage.status(), StatusCode::OK);
        let usage = json_body(usage).await;
        assert_eq!(usage["api_key_id"], created["id"]);
        assert_eq!(usage["usage_count"], 0);
        assert_eq!(usage["usages"], json!([]));
    }

    #[tokio::test]
    async fn summarize_website_returns_sanitized_input() {
        let app = test_app();
        let key = app.store.seed_api_key(&hash_api_key(KEY), 10, 0);
        app.store.seed_website(
            "https://example.com",
            json!({ "title": "Acme", "page_html": "<html></html>", "tags": [] }),
            ScrapingStatus::Success,
        );

        let response = app
            .router
            .oneshot(post_json(
                "/summarize/website",
                Some(KEY),
                json!({ "url": "https://example.com" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["message"], "Summarize Website (Placeholder)");
        assert_eq!(body["input"], json!({ "title": "Acme" }));
        assert_eq!(app.store.usages()[0].usage_type, "WEBSITE_SUMMARY");
        assert_eq!(app.store.api_key(key.id).unwrap().usage_count, 1);
    }

    #[tokio::test]
    async fn summarize_unknown_url_is_a_404() {
        let app = test_app();
        app.store.seed_api_key(&hash_api_key(KEY), 10, 0);

        let response = app
            .router
            .oneshot(post_json(
                "/summarize/linkedin",
                Some(KEY),
                json!({ "url": "https://www.linkedin.com/in/nobody" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(app.store.usages().is_empty());
    }

    #[tokio::test]
    async fn healthz_is_public() {
        let app = test_app();

        let response = app.router.oneshot(get("/healthz", None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["database"], "connected");
    }

    #[tokio::test]
    async fn responses_carry_a_request_id() {
        let app = test_app();

        let response = app.router.oneshot(get("/healthz", None)).await.unwrap();

        assert!(response.headers().contains_key("x-request-id"));
    }
}
