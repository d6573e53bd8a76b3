//! Normal mode: one run per project/suite pair, created or reused, then
//! reported and closed.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, instrument, warn};

use super::naming::derive_run_name;
use super::{result_entry, RunStrategy};
use crate::domain::models::{
    CompletedGroup, GroupOutcome, GroupScope, GroupState, NewRun, ReportableOutcome, RunGroup,
    RunGroupKey, SkipReason,
};
use crate::domain::ports::CatalogClient;
use crate::services::catalog_validator::CatalogValidator;
use crate::services::reporting_session::ReportingSession;

/// Create-or-reuse, post, close.
pub struct NormalRunStrategy {
    client: Arc<dyn CatalogClient>,
    validator: CatalogValidator,
    root_marker: String,
    pass_comment: String,
}

impl NormalRunStrategy {
    pub fn new(
        client: Arc<dyn CatalogClient>,
        validator: CatalogValidator,
        root_marker: impl Into<String>,
        pass_comment: impl Into<String>,
    ) -> Self {
        Self {
            client,
            validator,
            root_marker: root_marker.into(),
            pass_comment: pass_comment.into(),
        }
    }

    fn advance(state: &mut GroupState, next: GroupState, key: RunGroupKey) {
        debug_assert!(!state.is_terminal(), "group {key} already finished as {state}");
        debug!(group = %key, from = %state, to = %next, "Group state transition");
        *state = next;
    }
}

#[async_trait]
impl RunStrategy for NormalRunStrategy {
    fn name(&self) -> &'static str {
        "normal"
    }

    /// Partition by `(project_id, suite_id)` in first-seen order.
    fn plan(&self, outcomes: Vec<ReportableOutcome>) -> Vec<RunGroup> {
        let mut groups: Vec<RunGroup> = Vec::new();
        let mut index: HashMap<RunGroupKey, usize> = HashMap::new();

        for outcome in outcomes {
            let Some(key) = outcome.group_key() else {
                debug!(case_id = outcome.case_id, "No project or suite, leaving outcome out");
                continue;
            };
            let slot = *index.entry(key).or_insert_with(|| {
                groups.push(RunGroup {
                    scope: GroupScope::Catalog(key),
                    outcomes: Vec::new(),
                });
                groups.len() - 1
            });
            groups[slot].outcomes.push(outcome);
        }

        groups
    }

    #[instrument(skip(self, session, group), fields(group = %group.scope))]
    async fn apply(&self, session: &mut ReportingSession, group: RunGroup) -> GroupOutcome {
        let GroupScope::Catalog(key) = group.scope else {
            warn!("Normal strategy received a group without a project/suite key");
            return GroupOutcome::Skipped {
                scope: group.scope,
                reason: SkipReason::NoValidCases,
            };
        };
        let mut state = GroupState::Grouped;

        let case_ids = group.case_ids();
        let valid = self
            .validator
            .valid_case_ids(&mut session.cases, key.project_id, key.suite_id, &case_ids)
            .await;
        if valid.is_empty() {
            Self::advance(&mut state, GroupState::Skipped, key);
            warn!(cases = case_ids.len(), "No valid case ids, skipping group");
            return GroupOutcome::Skipped {
                scope: group.scope,
                reason: SkipReason::NoValidCases,
            };
        }
        Self::advance(&mut state, GroupState::Validated, key);

        let valid_set: HashSet<u64> = valid.iter().copied().collect();
        let dropped_case_ids: Vec<u64> = case_ids
            .iter()
            .copied()
            .filter(|id| !valid_set.contains(id))
            .collect();

        let (run_id, run_name, reused_run) = if let Some(run_id) = session.run_for(key) {
            info!(run_id, "Reusing run created earlier in this session");
            (run_id, None, true)
        } else {
            let name = derive_run_name(&group.outcomes, &self.root_marker, session.start_time());
            let new_run = NewRun {
                name: name.clone(),
                suite_id: key.suite_id,
                include_all: false,
                case_ids: valid.clone(),
            };
            match self.client.add_run(key.project_id, &new_run).await {
                Ok(run_id) => {
                    info!(run_id, name = %name, cases = valid.len(), "Created run");
                    session.remember_run(key, run_id);
                    (run_id, Some(name), false)
                }
                Err(err) => {
                    Self::advance(&mut state, GroupState::Skipped, key);
                    warn!(error = %err, "Run creation failed, skipping group");
                    return GroupOutcome::Skipped {
                        scope: group.scope,
                        reason: SkipReason::RunCreationFailed(err.to_string()),
                    };
                }
            }
        };
        Self::advance(&mut state, GroupState::RunEnsured, key);

        let entries: Vec<_> = group
            .outcomes
            .iter()
            .filter(|o| valid_set.contains(&o.case_id))
            .map(|o| result_entry(o, &self.pass_comment))
            .collect();
        let passed = entries.iter().filter(|e| e.passed()).count();

        let post_failed = match self.client.add_results_for_cases(run_id, &entries).await {
            Ok(()) => {
                info!(run_id, results = entries.len(), "Posted results");
                false
            }
            Err(err) => {
                warn!(run_id, error = %err, "Posting results failed, closing run anyway");
                true
            }
        };
        Self::advance(&mut state, GroupState::Reported, key);

        let close_failed = if session.is_closed(run_id) {
            debug!(run_id, "Run already closed in this session");
            false
        } else {
            match self.client.close_run(run_id).await {
                Ok(()) => {
                    info!(run_id, "Closed run");
                    session.mark_closed(run_id);
                    false
                }
                Err(err) => {
                    warn!(run_id, error = %err, "Closing run failed");
                    true
                }
            }
        };
        Self::advance(&mut state, GroupState::Closed, key);

        GroupOutcome::Completed(CompletedGroup {
            scope: group.scope,
            run_id,
            run_name,
            reused_run,
            posted: entries.len(),
            passed,
            failed: entries.len() - passed,
            dropped_case_ids,
            post_failed,
            close_failed,
            final_state: state,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: RunGroupKey = RunGroupKey {
        project_id: 1,
        suite_id: 2,
    };

    #[test]
    fn test_advance_moves_state() {
        let mut state = GroupState::Grouped;
        NormalRunStrategy::advance(&mut state, GroupState::Validated, KEY);
        assert_eq!(state, GroupState::Validated);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "already finished")]
    fn test_finished_group_cannot_advance() {
        let mut state = GroupState::Closed;
        NormalRunStrategy::advance(&mut state, GroupState::Reported, KEY);
    }
}
