//! Dashboard publisher collaborator.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::models::{ReportStats, RunSummary, TestOutcome};

/// Aggregate figures handed to dashboard publishers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardSummary {
    /// Merged counters
    pub stats: ReportStats,
    /// Passed outcomes
    pub passed: usize,
    /// Failed outcomes
    pub failed: usize,
    /// Outcomes not sent to the catalog
    pub unreportable: usize,
    /// Failed outcomes, with issue references when a tracker ran
    pub failures: Vec<TestOutcome>,
    /// Present when results were sent to the catalog
    pub runs: Option<RunSummary>,
}

/// Destination for the end-of-run summary.
#[async_trait]
pub trait DashboardPublisher: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    async fn publish(&self, summary: &DashboardSummary) -> Result<()>;
}
