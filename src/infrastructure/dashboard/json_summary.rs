use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::info;

use crate::domain::ports::{DashboardPublisher, DashboardSummary};

/// Writes the summary as pretty JSON to a file.
#[derive(Debug, Clone)]
pub struct JsonSummaryDashboard {
    path: PathBuf,
}

impl JsonSummaryDashboard {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl DashboardPublisher for JsonSummaryDashboard {
    fn name(&self) -> &'static str {
        "json-summary"
    }

    async fn publish(&self, summary: &DashboardSummary) -> Result<()> {
        let json = serde_json::to_string_pretty(summary).context("Failed to serialize summary")?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        tokio::fs::write(&self.path, json)
            .await
            .with_context(|| format!("Failed to write summary to {}", self.path.display()))?;
        info!(path = %self.path.display(), "Summary written");
        Ok(())
    }
}
