//! End-to-end reporting pipeline.
//!
//! discover → merge → write merged file → flatten → deduplicate → partition
//! → issue tracker → run orchestration → dashboards.
//!
//! Only discovery, parsing and the merged-file write can fail the pipeline.
//! Collaborator and catalog problems are logged and the pipeline moves on.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::domain::errors::ReportResult;
use crate::domain::models::{
    Config, ReportStats, ReportableOutcome, RoutingDefaults, RunMode, RunSummary, TestOutcome,
};
use crate::domain::ports::{CatalogClient, DashboardPublisher, DashboardSummary, IssueTracker};
use crate::services::deduplicator::deduplicate;
use crate::services::report_merger::{discover_report_files, load_and_merge, write_merged};
use crate::services::reporting_session::ReportingSession;
use crate::services::run_orchestrator::RunOrchestrator;
use crate::services::test_flattener::{partition_by_state, TestFlattener};

/// Per-invocation options.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Directory searched for shard files
    pub root: PathBuf,
    /// Post into this existing run instead of managing runs
    pub adhoc_run_id: Option<u64>,
    /// Write the merged report to disk
    pub write_merged: bool,
    /// Explicit merged report path; defaults to the configured file name
    /// next to the first shard
    pub merged_output: Option<PathBuf>,
}

impl PipelineOptions {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            adhoc_run_id: None,
            write_merged: true,
            merged_output: None,
        }
    }

    /// Adhoc when a run id is given, normal otherwise.
    pub fn run_mode(&self) -> RunMode {
        self.adhoc_run_id
            .map_or(RunMode::Normal, |run_id| RunMode::Adhoc { run_id })
    }
}

/// What one pipeline execution produced.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    /// Shards that were merged
    pub shard_files: Vec<PathBuf>,
    /// Where the merged report was written
    pub merged_path: Option<PathBuf>,
    /// Merged counters
    pub stats: ReportStats,
    /// Outcomes after deduplication
    pub total_outcomes: usize,
    /// Passed outcomes after dedup
    pub passed: usize,
    /// Failed outcomes after dedup
    pub failed: usize,
    /// Passed or failed outcomes missing a case, project or suite id
    pub unreportable: usize,
    /// The failed outcomes themselves
    pub failures: Vec<TestOutcome>,
    /// Present when a catalog was attached
    pub runs: Option<RunSummary>,
}

impl PipelineReport {
    /// The subset of the report handed to dashboards.
    pub fn dashboard_summary(&self) -> DashboardSummary {
        DashboardSummary {
            stats: self.stats.clone(),
            passed: self.passed,
            failed: self.failed,
            unreportable: self.unreportable,
            failures: self.failures.clone(),
            runs: self.runs.clone(),
        }
    }
}

/// The reporting pipeline and its optional collaborators.
pub struct ReportPipeline {
    config: Config,
    catalog: Option<Arc<dyn CatalogClient>>,
    issue_tracker: Option<Arc<dyn IssueTracker>>,
    dashboards: Vec<Arc<dyn DashboardPublisher>>,
}

impl ReportPipeline {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            catalog: None,
            issue_tracker: None,
            dashboards: Vec::new(),
        }
    }

    /// Send results to a catalog.
    pub fn with_catalog(mut self, client: Arc<dyn CatalogClient>) -> Self {
        self.catalog = Some(client);
        self
    }

    pub fn with_issue_tracker(mut self, tracker: Arc<dyn IssueTracker>) -> Self {
        self.issue_tracker = Some(tracker);
        self
    }

    pub fn with_dashboard(mut self, dashboard: Arc<dyn DashboardPublisher>) -> Self {
        self.dashboards.push(dashboard);
        self
    }

    fn routing_defaults(&self) -> RoutingDefaults {
        RoutingDefaults {
            project_id: self.config.catalog.project_id,
            suite_id: self.config.catalog.default_suite_id,
        }
    }

    fn merged_path(&self, options: &PipelineOptions, files: &[PathBuf]) -> Option<PathBuf> {
        if !options.write_merged {
            return None;
        }
        if let Some(path) = &options.merged_output {
            return Some(path.clone());
        }
        let name = self.config.reports.merged_file_name.as_deref()?;
        let dir = files
            .first()
            .and_then(|f| f.parent())
            .unwrap_or_else(|| Path::new("."));
        Some(dir.join(name))
    }

    /// Run the whole pipeline once.
    #[instrument(skip(self, session, options), fields(root = %options.root.display()))]
    pub async fn run(
        &self,
        session: &mut ReportingSession,
        options: &PipelineOptions,
    ) -> ReportResult<PipelineReport> {
        let files = discover_report_files(&options.root, &self.config.reports)?;
        let bundle = load_and_merge(&files)?;

        let merged_path = self.merged_path(options, &files);
        if let Some(path) = &merged_path {
            write_merged(&bundle, path)?;
        }

        let flattened: Vec<TestOutcome> =
            TestFlattener::new(&bundle, self.routing_defaults()).iter().collect();
        let total_flattened = flattened.len();
        let outcomes = deduplicate(flattened);
        let (passed, mut failed) = partition_by_state(&outcomes);
        info!(
            flattened = total_flattened,
            unique = outcomes.len(),
            passed = passed.len(),
            failed = failed.len(),
            "Collected test outcomes"
        );

        if let Some(tracker) = &self.issue_tracker {
            attach_issue_refs(tracker.as_ref(), &mut failed).await;
        }

        let mode = options.run_mode();
        let (reportable, unreportable) =
            split_reportable(passed.iter().chain(failed.iter()), mode);
        if unreportable > 0 {
            info!(count = unreportable, "Outcomes without the routing ids this mode needs will not be sent");
        }

        let runs = match &self.catalog {
            Some(client) => {
                let orchestrator = RunOrchestrator::for_mode(mode, client.clone(), &self.config);
                info!(mode = orchestrator.mode_name(), count = reportable.len(), "Reporting outcomes");
                Some(orchestrator.orchestrate(session, reportable).await)
            }
            None => None,
        };

        let report = PipelineReport {
            shard_files: files,
            merged_path,
            stats: bundle.stats,
            total_outcomes: outcomes.len(),
            passed: passed.len(),
            failed: failed.len(),
            unreportable,
            failures: failed,
            runs,
        };

        self.publish(&report.dashboard_summary()).await;
        Ok(report)
    }

    async fn publish(&self, summary: &DashboardSummary) {
        for dashboard in &self.dashboards {
            if let Err(err) = dashboard.publish(summary).await {
                warn!(dashboard = dashboard.name(), error = %err, "Dashboard publish failed");
            }
        }
    }
}

/// Ask the tracker about failed outcomes and attach references by position.
async fn attach_issue_refs(tracker: &dyn IssueTracker, failed: &mut [TestOutcome]) {
    if failed.is_empty() {
        return;
    }
    match tracker.file_issues(failed).await {
        Ok(refs) => {
            if refs.len() != failed.len() {
                warn!(expected = failed.len(), got = refs.len(), "Issue tracker answered a different number of records");
            }
            for (outcome, issue) in failed.iter_mut().zip(refs) {
                outcome.issue_ref = Some(issue);
            }
        }
        Err(err) => warn!(error = %err, "Issue tracker failed, continuing without issue references"),
    }
}

fn split_reportable<'a>(
    outcomes: impl Iterator<Item = &'a TestOutcome>,
    mode: RunMode,
) -> (Vec<ReportableOutcome>, usize) {
    let mut reportable = Vec::new();
    let mut unreportable = 0;
    for outcome in outcomes {
        match outcome.reportable_for(mode) {
            Some(r) => reportable.push(r),
            None => unreportable += 1,
        }
    }
    (reportable, unreportable)
}
