//! Configuration management infrastructure
//!
//! Hierarchical configuration using figment:
//! - YAML file loading
//! - Environment variable overrides (`TESTRAIL_*`, `XPORTER_*`)
//! - Configuration validation

pub mod loader;

pub use loader::{ConfigError, ConfigLoader};
