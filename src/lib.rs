//! xporter - Cypress report merger and TestRail reporter
//!
//! xporter combines the per-spec mochawesome JSON files of a Cypress run into
//! one report, flattens it into test outcomes routed by `[P#]`, `[S#]` and
//! `[C#]` title tags, and posts the results to TestRail runs.
//!
//! # Architecture
//!
//! This crate follows Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): report documents, outcomes, run groups and port traits
//! - **Service Layer** (`services`): merging, flattening, validation and run orchestration
//! - **Infrastructure Layer** (`infrastructure`): TestRail client, config, logging, dashboards
//! - **CLI Layer** (`cli`): Command-line interface
//!
//! # Example
//!
//! ```ignore
//! use xporter::{ConfigLoader, PipelineOptions, ReportPipeline, ReportingSession};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let pipeline = ReportPipeline::new(ConfigLoader::load()?);
//!     let mut session = ReportingSession::new();
//!     let report = pipeline.run(&mut session, &PipelineOptions::new("cypress/reports")).await?;
//!     println!("{} passed, {} failed", report.passed, report.failed);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{CatalogError, CatalogResult, ReportError, ReportResult};
pub use domain::models::{
    Config, GroupOutcome, ReportBundle, ReportStats, ReportableOutcome, RunMode, RunSummary,
    TestOutcome, TestState,
};
pub use domain::ports::{CatalogClient, DashboardPublisher, DashboardSummary, IssueTracker};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use infrastructure::testrail::{TestRailClient, TestRailConfig};
pub use services::{PipelineOptions, PipelineReport, ReportPipeline, ReportingSession};
