//! Run orchestration
//!
//! Groups reportable outcomes, makes sure each group has a remote run and
//! posts results into it. The lifecycle differs per [`RunMode`]:
//!
//! - Normal: validate, create or reuse a run per project/suite, post, close
//! - Adhoc: post into one existing run, restricted to its members
//!
//! Failures are contained per group; one group going wrong never stops the
//! others.

mod adhoc;
mod naming;
mod normal;

pub use adhoc::AdhocRunStrategy;
pub use naming::{derive_run_name, RUN_TIMESTAMP_FORMAT};
pub use normal::NormalRunStrategy;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, instrument};

use crate::domain::models::outcome::DEFAULT_FAILURE_MESSAGE;
use crate::domain::models::{
    Config, GroupOutcome, ReportableOutcome, ResultEntry, ResultStatus, RunGroup, RunMode,
    RunSummary,
};
use crate::domain::ports::CatalogClient;
use crate::services::catalog_validator::CatalogValidator;
use crate::services::reporting_session::ReportingSession;

/// Per-mode group planning and lifecycle.
#[async_trait]
pub trait RunStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Split outcomes into groups, each bound for one remote run.
    fn plan(&self, outcomes: Vec<ReportableOutcome>) -> Vec<RunGroup>;

    /// Drive one group to a terminal outcome. Never fails; problems are
    /// reported through the returned outcome.
    async fn apply(&self, session: &mut ReportingSession, group: RunGroup) -> GroupOutcome;
}

/// Result line for an outcome.
pub fn result_entry(outcome: &ReportableOutcome, pass_comment: &str) -> ResultEntry {
    if outcome.passed {
        ResultEntry::new(outcome.case_id, ResultStatus::Passed, pass_comment)
    } else {
        let comment = outcome
            .error_message
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_FAILURE_MESSAGE);
        ResultEntry::new(outcome.case_id, ResultStatus::Failed, comment)
    }
}

/// Runs every group of a batch through a [`RunStrategy`].
pub struct RunOrchestrator {
    strategy: Box<dyn RunStrategy>,
}

impl RunOrchestrator {
    pub fn new(strategy: Box<dyn RunStrategy>) -> Self {
        Self { strategy }
    }

    /// Orchestrator for `mode`, wired from configuration.
    pub fn for_mode(mode: RunMode, client: Arc<dyn CatalogClient>, config: &Config) -> Self {
        let pass_comment = config.reporting.pass_comment.clone();
        let strategy: Box<dyn RunStrategy> = match mode {
            RunMode::Normal => Box::new(NormalRunStrategy::new(
                client.clone(),
                CatalogValidator::new(client, config.catalog.page_size),
                config.reporting.root_marker.clone(),
                pass_comment,
            )),
            RunMode::Adhoc { run_id } => Box::new(AdhocRunStrategy::new(
                client,
                run_id,
                config.catalog.page_size,
                pass_comment,
            )),
        };
        Self::new(strategy)
    }

    /// Name of the active strategy.
    pub fn mode_name(&self) -> &'static str {
        self.strategy.name()
    }

    /// Plan and apply every group, in order.
    ///
    /// Run ids and validation answers accumulate in `session`, so calling
    /// this twice with the same session reuses runs instead of creating new
    /// ones.
    #[instrument(skip(self, session, outcomes), fields(mode = self.strategy.name(), outcomes = outcomes.len()))]
    pub async fn orchestrate(
        &self,
        session: &mut ReportingSession,
        outcomes: Vec<ReportableOutcome>,
    ) -> RunSummary {
        let groups = self.strategy.plan(outcomes);
        info!(groups = groups.len(), "Planned run groups");

        let mut summary = RunSummary::default();
        for group in groups {
            let outcome = self.strategy.apply(session, group).await;
            summary.groups.push(outcome);
        }

        info!(
            posted = summary.posted_count(),
            skipped = summary.skipped_count(),
            runs = summary.run_ids().len(),
            "Run orchestration finished"
        );
        summary
    }
}
