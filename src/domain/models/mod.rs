pub mod catalog;
pub mod config;
pub mod outcome;
pub mod report;
pub mod routing;
pub mod run;

pub use catalog::{CatalogCase, CatalogTest, NewRun, Page, ResultEntry, ResultStatus};
pub use config::{
    CatalogConfig, CatalogCredentials, Config, LoggingConfig, RateLimitConfig, ReportingConfig,
    ReportsConfig, RetryConfig,
};
pub use outcome::{IssueRef, ReportableOutcome, TestOutcome, TestState};
pub use report::{RawError, RawTest, ReportBundle, ReportStats, ShardReport, SuiteNode};
pub use routing::{RoutingDefaults, RoutingTags};
pub use run::{
    CompletedGroup, GroupOutcome, GroupScope, GroupState, RunGroup, RunGroupKey, RunMode,
    RunSummary, SkipReason,
};
