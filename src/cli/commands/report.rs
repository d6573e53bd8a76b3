//! Implementation of the `xporter report` command.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use tracing::info;

use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{Config, GroupOutcome};
use crate::infrastructure::dashboard::{ConsoleDashboard, JsonSummaryDashboard};
use crate::infrastructure::testrail::{TestRailClient, TestRailConfig};
use crate::services::{PipelineOptions, PipelineReport, ReportPipeline, ReportingSession};

/// Arguments of `xporter report`.
#[derive(Args, Debug)]
pub struct ReportArgs {
    /// Directory searched for shard files
    #[arg(short, long, default_value = ".")]
    pub root: PathBuf,

    /// Send results to TestRail, creating one run per project and suite
    #[arg(long)]
    pub testrail: bool,

    /// Post results into this existing run instead
    #[arg(long, value_name = "RUN_ID")]
    pub adhoc_run: Option<u64>,

    /// Also write the summary as JSON to this file
    #[arg(long, value_name = "PATH")]
    pub summary_json: Option<PathBuf>,

    /// Do not write the merged report to disk
    #[arg(long)]
    pub no_merged_file: bool,
}

impl ReportArgs {
    fn uses_catalog(&self) -> bool {
        self.testrail || self.adhoc_run.is_some()
    }

    fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            adhoc_run_id: self.adhoc_run,
            write_merged: !self.no_merged_file,
            ..PipelineOptions::new(&self.root)
        }
    }
}

/// Result of a report run.
#[derive(Debug, Serialize)]
pub struct ReportOutput {
    /// Always true; failures go through the error path
    pub success: bool,
    /// Pipeline result
    #[serde(flatten)]
    pub report: PipelineReport,
}

impl CommandOutput for ReportOutput {
    fn to_human(&self) -> String {
        let report = &self.report;
        let mut lines = vec![format!(
            "Processed {} shard(s): {} passed, {} failed, {} unreportable",
            report.shard_files.len(),
            report.passed,
            report.failed,
            report.unreportable
        )];
        if let Some(path) = &report.merged_path {
            lines.push(format!("Merged report: {}", path.display()));
        }
        if let Some(runs) = &report.runs {
            lines.push(format!(
                "Posted {} result(s) to run(s) {:?}, {} group(s) skipped",
                runs.posted_count(),
                runs.run_ids(),
                runs.skipped_count()
            ));
            for group in &runs.groups {
                if let GroupOutcome::Skipped { scope, reason } = group {
                    lines.push(format!("  - {scope}: {reason}"));
                }
            }
        }
        lines.join("\n")
    }
}

fn build_pipeline(args: &ReportArgs, config: &Config, json_mode: bool) -> Result<ReportPipeline> {
    let mut pipeline = ReportPipeline::new(config.clone());

    if args.uses_catalog() {
        let client_config = TestRailConfig::from_config(config).context(
            "TestRail reporting needs catalog.domain, catalog.username and a password or api_key \
             (or TESTRAIL_DOMAIN, TESTRAIL_USERNAME, TESTRAIL_PASSWORD/TESTRAIL_API_KEY)",
        )?;
        let client = TestRailClient::new(client_config).context("Failed to create TestRail client")?;
        pipeline = pipeline.with_catalog(Arc::new(client));
    }
    if !json_mode {
        pipeline = pipeline.with_dashboard(Arc::new(ConsoleDashboard::new()));
    }
    if let Some(path) = &args.summary_json {
        pipeline = pipeline.with_dashboard(Arc::new(JsonSummaryDashboard::new(path)));
    }
    Ok(pipeline)
}

/// Run the full pipeline and print its report.
pub async fn execute(args: ReportArgs, config: Config, json_mode: bool) -> Result<()> {
    let pipeline = build_pipeline(&args, &config, json_mode)?;
    let options = args.pipeline_options();
    info!(root = %options.root.display(), mode = ?options.run_mode(), "Starting report");

    let mut session = ReportingSession::new();
    let report = pipeline.run(&mut session, &options).await?;

    output(
        &ReportOutput {
            success: true,
            report,
        },
        json_mode,
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> ReportArgs {
        ReportArgs {
            root: PathBuf::from("reports"),
            testrail: false,
            adhoc_run: None,
            summary_json: None,
            no_merged_file: false,
        }
    }

    #[test]
    fn test_catalog_requires_credentials() {
        let args = ReportArgs {
            testrail: true,
            ..args()
        };
        let err = build_pipeline(&args, &Config::default(), true).err().unwrap();
        assert!(err.to_string().contains("catalog.domain"));
    }

    #[test]
    fn test_local_only_needs_no_credentials() {
        assert!(build_pipeline(&args(), &Config::default(), false).is_ok());
    }

    #[test]
    fn test_pipeline_options() {
        let args = ReportArgs {
            adhoc_run: Some(44),
            no_merged_file: true,
            ..args()
        };
        let options = args.pipeline_options();
        assert_eq!(options.root, PathBuf::from("reports"));
        assert_eq!(options.adhoc_run_id, Some(44));
        assert!(!options.write_merged);
        assert!(args.uses_catalog());
    }
}
