//! Issue tracker collaborator.
//!
//! Receives failed outcomes and answers with one reference per record, in
//! input order. Bug creation and duplicate detection live behind this port.

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::models::{IssueRef, TestOutcome};

/// Files issues for failed outcomes.
#[async_trait]
pub trait IssueTracker: Send + Sync {
    /// File (or find) issues for `failed`. The returned vector is aligned
    /// with the input; shorter answers leave the remaining records untouched.
    async fn file_issues(&self, failed: &[TestOutcome]) -> Result<Vec<IssueRef>>;
}
