use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client as ReqwestClient, Method, RequestBuilder};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, instrument};

use super::rate_limiter::TokenBucketRateLimiter;
use super::retry::RetryPolicy;
use super::types::{normalize_listing, AddResultsRequest, CreatedRun};
use crate::domain::errors::{CatalogError, CatalogResult};
use crate::domain::models::{
    CatalogCase, CatalogTest, Config, NewRun, Page, ResultEntry,
};
use crate::domain::ports::CatalogClient;
use crate::infrastructure::logging::SecretScrubber;

/// Configuration for the TestRail HTTP client
#[derive(Debug, Clone)]
pub struct TestRailConfig {
    /// Scheme and host, without a trailing slash
    pub domain: String,
    /// Path between the domain and the endpoint, e.g. `index.php?/api/v2`
    pub api_path: String,
    /// Account used for basic auth
    pub username: String,
    /// Password or API key
    pub secret: String,
    /// Rate limit in requests per second
    pub rate_limit_rps: f64,
    /// Retries after the first attempt
    pub max_retries: u32,
    /// First retry delay
    pub initial_backoff_ms: u64,
    /// Upper bound for the retry delay
    pub max_backoff_ms: u64,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl TestRailConfig {
    /// Client settings from application config. `None` when the catalog
    /// credentials are incomplete.
    pub fn from_config(config: &Config) -> Option<Self> {
        let credentials = config.catalog.credentials()?;
        Some(Self {
            domain: credentials.domain,
            api_path: config.catalog.api_path.trim_matches('/').to_string(),
            username: credentials.username,
            secret: credentials.secret,
            rate_limit_rps: config.rate_limit.requests_per_second,
            max_retries: config.retry.max_retries,
            initial_backoff_ms: config.retry.initial_backoff_ms,
            max_backoff_ms: config.retry.max_backoff_ms,
            timeout_secs: config.catalog.timeout_secs,
        })
    }
}

/// HTTP client for a TestRail-compatible catalog
///
/// Every request passes the rate limiter and the retry policy. Reads retry
/// all transient errors; writes only retry rate limiting, since a 5xx after
/// the server applied a write would otherwise duplicate runs or results.
pub struct TestRailClient {
    http_client: ReqwestClient,
    base_url: String,
    username: String,
    secret: String,
    rate_limiter: TokenBucketRateLimiter,
    retry_policy: RetryPolicy,
    scrubber: SecretScrubber,
}

impl TestRailClient {
    pub fn new(config: TestRailConfig) -> CatalogResult<Self> {
        info!(
            domain = %config.domain,
            rate_limit = config.rate_limit_rps,
            timeout_secs = config.timeout_secs,
            "Initializing TestRail client"
        );

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let http_client = ReqwestClient::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(4)
            .build()
            .map_err(|e| CatalogError::Network(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            base_url: format!("{}/{}", config.domain, config.api_path),
            scrubber: SecretScrubber::new().with_secrets([config.secret.clone()]),
            username: config.username,
            secret: config.secret,
            rate_limiter: TokenBucketRateLimiter::new(config.rate_limit_rps),
            retry_policy: RetryPolicy::new(
                config.max_retries,
                config.initial_backoff_ms,
                config.max_backoff_ms,
            ),
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint)
    }

    fn request(&self, method: Method, endpoint: &str) -> RequestBuilder {
        self.http_client
            .request(method, self.url(endpoint))
            .basic_auth(&self.username, Some(&self.secret))
    }

    /// One round trip. Empty bodies decode to `Value::Null`.
    async fn send_once<B: Serialize + Sync>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&B>,
    ) -> CatalogResult<Value> {
        self.rate_limiter.acquire().await;

        let mut request = self.request(method.clone(), endpoint);
        if let Some(body) = body {
            request = request.json(body);
        }

        debug!(%method, endpoint, "Catalog request");
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(CatalogError::from_status(
                status.as_u16(),
                self.scrubber.scrub(&text),
            ));
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }

    async fn get(&self, endpoint: &str) -> CatalogResult<Value> {
        self.retry_policy
            .execute(|| self.send_once::<Value>(Method::GET, endpoint, None))
            .await
    }

    async fn post<B: Serialize + Sync>(&self, endpoint: &str, body: &B) -> CatalogResult<Value> {
        self.retry_policy
            .execute_when(
                || self.send_once(Method::POST, endpoint, Some(body)),
                |err| matches!(err, CatalogError::RateLimitExceeded),
            )
            .await
    }
}

#[async_trait]
impl CatalogClient for TestRailClient {
    #[instrument(skip(self))]
    async fn list_cases(
        &self,
        project_id: u64,
        suite_id: u64,
        limit: u32,
        offset: u64,
    ) -> CatalogResult<Page<CatalogCase>> {
        let body = self
            .get(&format!(
                "get_cases/{project_id}&suite_id={suite_id}&limit={limit}&offset={offset}"
            ))
            .await?;
        Ok(normalize_listing(body, "cases")?)
    }

    #[instrument(skip(self))]
    async fn get_case(&self, case_id: u64) -> CatalogResult<Option<CatalogCase>> {
        match self.get(&format!("get_case/{case_id}")).await {
            Ok(Value::Null) => Ok(None),
            Ok(body) => Ok(Some(serde_json::from_value(body)?)),
            // TestRail answers 400 for ids that do not exist
            Err(CatalogError::NotFound | CatalogError::InvalidRequest(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    #[instrument(skip(self, run), fields(name = %run.name, cases = run.case_ids.len()))]
    async fn add_run(&self, project_id: u64, run: &NewRun) -> CatalogResult<u64> {
        let body = self.post(&format!("add_run/{project_id}"), run).await?;
        let created: CreatedRun = serde_json::from_value(body)?;
        Ok(created.id)
    }

    #[instrument(skip(self, results), fields(results = results.len()))]
    async fn add_results_for_cases(&self, run_id: u64, results: &[ResultEntry]) -> CatalogResult<()> {
        self.post(
            &format!("add_results_for_cases/{run_id}"),
            &AddResultsRequest { results },
        )
        .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn close_run(&self, run_id: u64) -> CatalogResult<()> {
        self.post(&format!("close_run/{run_id}"), &serde_json::json!({}))
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_tests(&self, run_id: u64, limit: u32, offset: u64) -> CatalogResult<Page<CatalogTest>> {
        let body = self
            .get(&format!("get_tests/{run_id}&limit={limit}&offset={offset}"))
            .await?;
        Ok(normalize_listing(body, "tests")?)
    }
}
