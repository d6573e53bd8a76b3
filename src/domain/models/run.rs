//! Run groups and their lifecycle outcomes.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::outcome::ReportableOutcome;

/// Local grouping key deciding which remote run a result belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RunGroupKey {
    /// Catalog project
    pub project_id: u64,
    /// Catalog suite
    pub suite_id: u64,
}

impl fmt::Display for RunGroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}/S{}", self.project_id, self.suite_id)
    }
}

/// Where a group's results go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum GroupScope {
    /// A run created (or reused) for one project/suite pair
    Catalog(RunGroupKey),
    /// An existing run supplied from outside
    Adhoc { run_id: u64 },
}

impl fmt::Display for GroupScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Catalog(key) => write!(f, "{key}"),
            Self::Adhoc { run_id } => write!(f, "adhoc R{run_id}"),
        }
    }
}

/// Outcomes routed to one remote run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunGroup {
    /// Where the group reports to
    pub scope: GroupScope,
    /// Outcomes in first-seen order
    pub outcomes: Vec<ReportableOutcome>,
}

impl RunGroup {
    /// Distinct case ids in first-seen order.
    pub fn case_ids(&self) -> Vec<u64> {
        let mut seen = std::collections::HashSet::new();
        self.outcomes
            .iter()
            .map(|o| o.case_id)
            .filter(|id| seen.insert(*id))
            .collect()
    }
}

/// Lifecycle state of a group in normal mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupState {
    Grouped,
    Validated,
    RunEnsured,
    Reported,
    Closed,
    Skipped,
}

impl GroupState {
    /// Closed and skipped groups take no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Closed | Self::Skipped)
    }
}

impl fmt::Display for GroupState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Grouped => "grouped",
            Self::Validated => "validated",
            Self::RunEnsured => "run_ensured",
            Self::Reported => "reported",
            Self::Closed => "closed",
            Self::Skipped => "skipped",
        };
        write!(f, "{s}")
    }
}

/// Why a group ended without posting anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "reason", content = "detail")]
pub enum SkipReason {
    NoValidCases,
    RunCreationFailed(String),
    MembershipUnavailable(String),
    NoMatchingCases,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoValidCases => write!(f, "no valid case ids"),
            Self::RunCreationFailed(err) => write!(f, "run creation failed: {err}"),
            Self::MembershipUnavailable(err) => write!(f, "run tests unavailable: {err}"),
            Self::NoMatchingCases => write!(f, "no local case ids belong to the run"),
        }
    }
}

/// A group that reached a run and had results posted (or attempted).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedGroup {
    /// Where the group reported to
    pub scope: GroupScope,
    /// Run the results were posted to
    pub run_id: u64,
    /// Name given to a created run
    pub run_name: Option<String>,
    /// The run id came from the session memo rather than a new run
    pub reused_run: bool,
    /// Results posted
    pub posted: usize,
    /// Posted results that passed
    pub passed: usize,
    /// Posted results that failed
    pub failed: usize,
    /// Case ids observed locally but never posted
    pub dropped_case_ids: Vec<u64>,
    /// The results call failed
    pub post_failed: bool,
    /// The close call failed
    pub close_failed: bool,
    /// Last state reached
    pub final_state: GroupState,
}

/// Terminal result of applying a strategy to one group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum GroupOutcome {
    Completed(CompletedGroup),
    Skipped { scope: GroupScope, reason: SkipReason },
}

impl GroupOutcome {
    /// Where the group reports to.
    pub fn scope(&self) -> GroupScope {
        match self {
            Self::Completed(group) => group.scope,
            Self::Skipped { scope, .. } => *scope,
        }
    }

    /// Run posted to, if any.
    pub fn run_id(&self) -> Option<u64> {
        match self {
            Self::Completed(group) => Some(group.run_id),
            Self::Skipped { .. } => None,
        }
    }
}

/// Everything one orchestrator invocation did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// One entry per group, in order
    pub groups: Vec<GroupOutcome>,
}

impl RunSummary {
    pub fn completed(&self) -> impl Iterator<Item = &CompletedGroup> {
        self.groups.iter().filter_map(|g| match g {
            GroupOutcome::Completed(group) => Some(group),
            GroupOutcome::Skipped { .. } => None,
        })
    }

    pub fn skipped_count(&self) -> usize {
        self.groups
            .iter()
            .filter(|g| matches!(g, GroupOutcome::Skipped { .. }))
            .count()
    }

    /// Results posted across all groups.
    pub fn posted_count(&self) -> usize {
        self.completed().map(|g| g.posted).sum()
    }

    /// Distinct run ids that received results.
    pub fn run_ids(&self) -> Vec<u64> {
        let mut seen = std::collections::HashSet::new();
        self.completed()
            .map(|g| g.run_id)
            .filter(|id| seen.insert(*id))
            .collect()
    }
}

/// How results are routed to remote runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    /// Create-or-reuse one run per project/suite pair, post, close
    #[default]
    Normal,
    /// Post into an existing run without managing its lifecycle
    Adhoc { run_id: u64 },
}
