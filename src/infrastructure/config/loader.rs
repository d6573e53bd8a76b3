use std::path::Path;

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::config::Config;

/// Catalog settings read from the conventional `TESTRAIL_*` variables.
const TESTRAIL_ENV_KEYS: [&str; 5] = ["domain", "username", "password", "api_key", "project_id"];

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid rate limit: {0}. Must be positive")]
    InvalidRateLimit(f64),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid max_retries: {0}. Cannot be 0")]
    InvalidMaxRetries(u32),

    #[error(
        "Invalid backoff configuration: initial_backoff_ms ({0}) must not exceed max_backoff_ms ({1})"
    )]
    InvalidBackoff(u64, u64),

    #[error("Invalid catalog page size: {0}. Must be at least 1")]
    InvalidPageSize(u32),

    #[error("Invalid default suite id: {0}. Must be at least 1")]
    InvalidSuiteId(u64),

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .xporter/config.yaml (project config)
    /// 3. .xporter/local.yaml (project local overrides, optional)
    /// 4. TESTRAIL_* variables, mapped onto `catalog.*`
    /// 5. XPORTER_* variables (`__` separates nested keys)
    pub fn load() -> Result<Config> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(".xporter/config.yaml"))
            .merge(Yaml::file(".xporter/local.yaml"));

        let config: Config = Self::with_env(figment)
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file. Environment variables still
    /// override it, so credentials can stay out of the file.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let path = path.as_ref();
        if !path.is_file() {
            anyhow::bail!("Config file not found: {}", path.display());
        }

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path));

        let config: Config = Self::with_env(figment)
            .extract()
            .with_context(|| format!("Failed to load config from {}", path.display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    fn with_env(figment: Figment) -> Figment {
        figment
            .merge(
                Env::prefixed("TESTRAIL_")
                    .only(&TESTRAIL_ENV_KEYS)
                    .map(|key| format!("catalog.{}", key.as_str()).into()),
            )
            .merge(Env::prefixed("XPORTER_").split("__"))
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.to_lowercase().as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        if config.rate_limit.requests_per_second <= 0.0 {
            return Err(ConfigError::InvalidRateLimit(
                config.rate_limit.requests_per_second,
            ));
        }

        if config.retry.max_retries == 0 {
            return Err(ConfigError::InvalidMaxRetries(config.retry.max_retries));
        }

        if config.retry.initial_backoff_ms > config.retry.max_backoff_ms {
            return Err(ConfigError::InvalidBackoff(
                config.retry.initial_backoff_ms,
                config.retry.max_backoff_ms,
            ));
        }

        if config.catalog.page_size == 0 {
            return Err(ConfigError::InvalidPageSize(config.catalog.page_size));
        }

        if config.catalog.default_suite_id == 0 {
            return Err(ConfigError::InvalidSuiteId(config.catalog.default_suite_id));
        }

        if config.reports.pattern.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "reports.pattern cannot be empty".to_string(),
            ));
        }

        if config.reporting.root_marker.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "reporting.root_marker cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.catalog.page_size, 250);
        assert_eq!(config.catalog.default_suite_id, 1);
        assert_eq!(config.reports.pattern, "**/mochawesome*.json");
        assert_eq!(config.logging.level, "info");
        ConfigLoader::validate(&config).expect("Default config should be valid");
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r"
catalog:
  domain: https://acme.testrail.io
  project_id: 7
  page_size: 100
reports:
  pattern: 'reports/**/*.json'
logging:
  level: debug
  format: json
retry:
  max_retries: 5
";

        let config: Config = serde_yaml::from_str(yaml).expect("YAML should parse");

        assert_eq!(config.catalog.domain.as_deref(), Some("https://acme.testrail.io"));
        assert_eq!(config.catalog.project_id, Some(7));
        assert_eq!(config.catalog.page_size, 100);
        assert_eq!(config.catalog.api_path, "index.php?/api/v2");
        assert_eq!(config.reports.pattern, "reports/**/*.json");
        assert_eq!(config.reports.ignore.len(), 3);
        assert_eq!(config.retry.max_retries, 5);
        assert_eq!(config.retry.initial_backoff_ms, 1_000);

        ConfigLoader::validate(&config).expect("Parsed config should be valid");
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let mut config = Config::default();
        config.logging.level = "invalid".to_string();

        match ConfigLoader::validate(&config) {
            Err(ConfigError::InvalidLogLevel(level)) => assert_eq!(level, "invalid"),
            other => panic!("Expected InvalidLogLevel error, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_invalid_log_format() {
        let mut config = Config::default();
        config.logging.format = "xml".to_string();

        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidLogFormat(_))
        ));
    }

    #[test]
    fn test_validate_zero_rate_limit() {
        let mut config = Config::default();
        config.rate_limit.requests_per_second = 0.0;

        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidRateLimit(_))
        ));
    }

    #[test]
    fn test_validate_zero_max_retries() {
        let mut config = Config::default();
        config.retry.max_retries = 0;

        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidMaxRetries(0))
        ));
    }

    #[test]
    fn test_validate_invalid_backoff() {
        let mut config = Config::default();
        config.retry.initial_backoff_ms = 30000;
        config.retry.max_backoff_ms = 10000;

        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidBackoff(30000, 10000))
        ));
    }

    #[test]
    fn test_validate_zero_page_size_and_suite() {
        let mut config = Config::default();
        config.catalog.page_size = 0;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidPageSize(0))
        ));

        let mut config = Config::default();
        config.catalog.default_suite_id = 0;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidSuiteId(0))
        ));
    }

    #[test]
    fn test_hierarchical_merging() {
        let mut base_file = NamedTempFile::new().unwrap();
        writeln!(base_file, "catalog:\n  page_size: 50\nlogging:\n  level: info\n  format: json").unwrap();
        base_file.flush().unwrap();

        let mut override_file = NamedTempFile::new().unwrap();
        writeln!(override_file, "catalog:\n  page_size: 75\nlogging:\n  level: debug").unwrap();
        override_file.flush().unwrap();

        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(base_file.path()))
            .merge(Yaml::file(override_file.path()))
            .extract()
            .unwrap();

        assert_eq!(config.catalog.page_size, 75, "Override should win");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "json", "Base value should persist");
    }

    #[test]
    fn test_testrail_env_maps_onto_catalog() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "catalog:\n  domain: https://from-file.testrail.io\n  project_id: 1").unwrap();
        file.flush().unwrap();

        temp_env::with_vars(
            [
                ("TESTRAIL_DOMAIN", Some("https://acme.testrail.io")),
                ("TESTRAIL_USERNAME", Some("qa@acme.io")),
                ("TESTRAIL_API_KEY", Some("k3y-abcdef")),
                ("TESTRAIL_PROJECT_ID", Some("42")),
                ("XPORTER_CATALOG__PAGE_SIZE", Some("20")),
            ],
            || {
                let config = ConfigLoader::load_from_file(file.path()).unwrap();
                assert_eq!(config.catalog.domain.as_deref(), Some("https://acme.testrail.io"));
                assert_eq!(config.catalog.project_id, Some(42));
                assert_eq!(config.catalog.page_size, 20);

                let credentials = config.catalog.credentials().unwrap();
                assert_eq!(credentials.username, "qa@acme.io");
                assert_eq!(credentials.secret, "k3y-abcdef");
            },
        );
    }

    #[test]
    fn test_env_override_is_validated() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "logging:\n  level: info").unwrap();
        file.flush().unwrap();

        temp_env::with_var("XPORTER_RETRY__MAX_RETRIES", Some("0"), || {
            assert!(ConfigLoader::load_from_file(file.path()).is_err());
        });
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(ConfigLoader::load_from_file("/nonexistent/xporter.yaml").is_err());
    }
}
