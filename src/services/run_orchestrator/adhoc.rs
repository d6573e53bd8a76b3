//! Adhoc mode: post into an existing run. Runs are never created, closed or
//! given new members here.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, instrument, warn};

use super::{result_entry, RunStrategy};
use crate::domain::errors::CatalogResult;
use crate::domain::models::{
    CompletedGroup, GroupOutcome, GroupScope, GroupState, ReportableOutcome, RunGroup, SkipReason,
};
use crate::domain::ports::CatalogClient;
use crate::services::reporting_session::ReportingSession;

/// Posts the intersection of local and run case ids into one external run.
pub struct AdhocRunStrategy {
    client: Arc<dyn CatalogClient>,
    run_id: u64,
    page_size: u32,
    pass_comment: String,
}

impl AdhocRunStrategy {
    pub fn new(
        client: Arc<dyn CatalogClient>,
        run_id: u64,
        page_size: u32,
        pass_comment: impl Into<String>,
    ) -> Self {
        Self {
            client,
            run_id,
            page_size: page_size.max(1),
            pass_comment: pass_comment.into(),
        }
    }

    /// Case ids of every test in the run.
    async fn fetch_members(&self) -> CatalogResult<HashSet<u64>> {
        let mut members = HashSet::new();
        let mut seen_tests = HashSet::new();
        let mut offset = 0u64;

        loop {
            let page = self
                .client
                .list_tests(self.run_id, self.page_size, offset)
                .await?;

            offset += page.items.len() as u64;
            let is_last = page.is_last(self.page_size, offset);
            let mut fresh = 0usize;
            for test in page.items {
                if seen_tests.insert(test.id) {
                    fresh += 1;
                }
                if let Some(case_id) = test.case_id {
                    members.insert(case_id);
                }
            }

            if is_last || fresh == 0 {
                break;
            }
        }

        Ok(members)
    }
}

#[async_trait]
impl RunStrategy for AdhocRunStrategy {
    fn name(&self) -> &'static str {
        "adhoc"
    }

    /// Everything goes to the one external run.
    fn plan(&self, outcomes: Vec<ReportableOutcome>) -> Vec<RunGroup> {
        if outcomes.is_empty() {
            return Vec::new();
        }
        vec![RunGroup {
            scope: GroupScope::Adhoc { run_id: self.run_id },
            outcomes,
        }]
    }

    #[instrument(skip(self, session, group), fields(run_id = self.run_id))]
    async fn apply(&self, session: &mut ReportingSession, group: RunGroup) -> GroupOutcome {
        let members = if let Some(members) = session.adhoc_members(self.run_id) {
            members.clone()
        } else {
            match self.fetch_members().await {
                Ok(members) => {
                    info!(tests = members.len(), "Fetched run membership");
                    session.remember_adhoc_members(self.run_id, members.clone());
                    members
                }
                Err(err) => {
                    warn!(error = %err, "Could not list tests of the adhoc run");
                    return GroupOutcome::Skipped {
                        scope: group.scope,
                        reason: SkipReason::MembershipUnavailable(err.to_string()),
                    };
                }
            }
        };

        // Last occurrence of a case id wins.
        let mut last_index: HashMap<u64, usize> = HashMap::new();
        for (index, outcome) in group.outcomes.iter().enumerate() {
            last_index.insert(outcome.case_id, index);
        }

        let mut dropped_case_ids = Vec::new();
        for case_id in group.case_ids() {
            if !members.contains(&case_id) {
                warn!(case_id, "Case is not part of the adhoc run, dropping it");
                dropped_case_ids.push(case_id);
            }
        }

        let entries: Vec<_> = group
            .outcomes
            .iter()
            .enumerate()
            .filter(|(index, o)| members.contains(&o.case_id) && last_index.get(&o.case_id) == Some(index))
            .map(|(_, o)| result_entry(o, &self.pass_comment))
            .collect();

        if entries.is_empty() {
            warn!("No local case ids belong to the adhoc run");
            return GroupOutcome::Skipped {
                scope: group.scope,
                reason: SkipReason::NoMatchingCases,
            };
        }

        let passed = entries.iter().filter(|e| e.passed()).count();
        let post_failed = match self.client.add_results_for_cases(self.run_id, &entries).await {
            Ok(()) => {
                info!(results = entries.len(), "Posted results to adhoc run");
                false
            }
            Err(err) => {
                warn!(error = %err, "Posting results to adhoc run failed");
                true
            }
        };

        GroupOutcome::Completed(CompletedGroup {
            scope: group.scope,
            run_id: self.run_id,
            run_name: None,
            reused_run: true,
            posted: entries.len(),
            passed,
            failed: entries.len() - passed,
            dropped_case_ids,
            post_failed,
            close_failed: false,
            final_state: GroupState::Reported,
        })
    }
}
