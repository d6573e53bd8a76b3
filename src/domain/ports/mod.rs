//! Port trait definitions (Hexagonal Architecture)
//!
//! - CatalogClient: remote test catalog operations
//! - IssueTracker: bug filing for failed tests
//! - DashboardPublisher: summary publishing

pub mod catalog_client;
pub mod dashboard;
pub mod issue_tracker;

pub use catalog_client::CatalogClient;
pub use dashboard::{DashboardPublisher, DashboardSummary};
pub use issue_tracker::IssueTracker;
