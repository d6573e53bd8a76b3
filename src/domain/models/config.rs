use serde::{Deserialize, Serialize};

/// Main configuration structure for xporter
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Remote test catalog connection and routing defaults
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Report discovery settings
    #[serde(default)]
    pub reports: ReportsConfig,

    /// Run naming and result formatting
    #[serde(default)]
    pub reporting: ReportingConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Retry policy configuration
    #[serde(default)]
    pub retry: RetryConfig,
}

/// Catalog (TestRail-compatible) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CatalogConfig {
    /// Base URL, e.g. `https://example.testrail.io`
    #[serde(default)]
    pub domain: Option<String>,

    /// Path between the domain and the endpoint name
    #[serde(default = "default_api_path")]
    pub api_path: String,

    /// Account name
    #[serde(default)]
    pub username: Option<String>,

    /// Password, used when no API key is set
    #[serde(default)]
    pub password: Option<String>,

    /// Used when `password` is not set
    #[serde(default)]
    pub api_key: Option<String>,

    /// Project used when no `[P<n>]` tag is found
    #[serde(default)]
    pub project_id: Option<u64>,

    /// Suite used when no `[S<n>]` tag is found
    #[serde(default = "default_suite_id")]
    pub default_suite_id: u64,

    /// Page size for paginated listings
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Resolved catalog credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogCredentials {
    /// Catalog host
    pub domain: String,
    /// Account name
    pub username: String,
    /// API key or password
    pub secret: String,
}

impl CatalogConfig {
    /// Credentials needed to talk to the catalog, if fully configured.
    pub fn credentials(&self) -> Option<CatalogCredentials> {
        let domain = self.domain.as_deref().filter(|d| !d.trim().is_empty())?;
        let username = self.username.as_deref().filter(|u| !u.is_empty())?;
        let secret = self
            .password
            .as_deref()
            .filter(|p| !p.is_empty())
            .or_else(|| self.api_key.as_deref().filter(|k| !k.is_empty()))?;

        Some(CatalogCredentials {
            domain: domain.trim_end_matches('/').to_string(),
            username: username.to_string(),
            secret: secret.to_string(),
        })
    }
}

fn default_api_path() -> String {
    "index.php?/api/v2".to_string()
}

const fn default_suite_id() -> u64 {
    1
}

const fn default_page_size() -> u32 {
    250
}

const fn default_timeout_secs() -> u64 {
    30
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            domain: None,
            api_path: default_api_path(),
            username: None,
            password: None,
            api_key: None,
            project_id: None,
            default_suite_id: default_suite_id(),
            page_size: default_page_size(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Report discovery configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ReportsConfig {
    /// Glob matched against paths relative to the search root
    #[serde(default = "default_pattern")]
    pub pattern: String,

    /// Globs excluded from discovery
    #[serde(default = "default_ignore")]
    pub ignore: Vec<String>,

    /// File name of the merged report written next to the first shard
    #[serde(default = "default_merged_file_name")]
    pub merged_file_name: Option<String>,
}

fn default_pattern() -> String {
    "**/mochawesome*.json".to_string()
}

fn default_ignore() -> Vec<String> {
    vec![
        "**/node_modules/**".to_string(),
        "**/dist/**".to_string(),
        "**/CypressTest/**".to_string(),
    ]
}

#[allow(clippy::unnecessary_wraps)]
fn default_merged_file_name() -> Option<String> {
    Some("merged-mochawesome.json".to_string())
}

impl Default for ReportsConfig {
    fn default() -> Self {
        Self {
            pattern: default_pattern(),
            ignore: default_ignore(),
            merged_file_name: default_merged_file_name(),
        }
    }
}

/// Run naming and result formatting
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ReportingConfig {
    /// Folder marker preceding the GROUP/SUBGROUP segments of a spec path
    #[serde(default = "default_root_marker")]
    pub root_marker: String,

    /// Comment posted with passing results
    #[serde(default = "default_pass_comment")]
    pub pass_comment: String,
}

fn default_root_marker() -> String {
    "cypress/e2e/".to_string()
}

fn default_pass_comment() -> String {
    "Test passed".to_string()
}

impl Default for ReportingConfig {
    fn default() -> Self {
        Self {
            root_marker: default_root_marker(),
            pass_comment: default_pass_comment(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files (stderr only when unset)
    #[serde(default)]
    pub log_dir: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
        }
    }
}

/// Rate limiting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RateLimitConfig {
    /// Requests per second allowed against the catalog
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: f64,
}

const fn default_requests_per_second() -> f64 {
    5.0
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: default_requests_per_second(),
        }
    }
}

/// Retry policy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RetryConfig {
    /// Maximum number of retry attempts
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Initial backoff in milliseconds
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Maximum backoff in milliseconds
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

const fn default_max_retries() -> u32 {
    3
}

const fn default_initial_backoff_ms() -> u64 {
    1_000
}

const fn default_max_backoff_ms() -> u64 {
    30_000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}
