use std::fmt;

use serde::{Deserialize, Serialize};

use super::report::RawTest;
use super::routing::{RoutingDefaults, RoutingTags};
use super::run::{RunGroupKey, RunMode};

/// Comment used for failed tests whose error carries no message.
pub const DEFAULT_FAILURE_MESSAGE: &str = "Test failed";

/// Observed state of a single test execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestState {
    Passed,
    Failed,
    Pending,
    Skipped,
    /// State was absent or not recognised.
    Unknown,
}

impl TestState {
    /// Case-insensitive; anything unrecognized is `Unknown`.
    pub fn from_raw(state: Option<&str>) -> Self {
        match state.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("passed") => Self::Passed,
            Some("failed") => Self::Failed,
            Some("pending") => Self::Pending,
            Some("skipped") => Self::Skipped,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for TestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Pending => "pending",
            Self::Skipped => "skipped",
            Self::Unknown => "unknown",
        };
        write!(f, "{s}")
    }
}

/// External reference returned by the issue tracker for one outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "key")]
pub enum IssueRef {
    Created(String),
    NotCreated,
}

/// One observed execution of one test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestOutcome {
    /// Test title including tags
    pub title: String,
    /// Title prefixed with the enclosing suites
    pub full_title: String,
    /// Normalized state
    pub state: TestState,
    /// Spec file the test came from
    pub file: String,
    /// Present iff `state` is `Failed`
    pub error_message: Option<String>,
    /// Test source, when the reporter captured it
    pub body: String,
    /// Case id from the title tag
    pub case_id: Option<u64>,
    /// Suite from tags or the configured default
    pub suite_id: Option<u64>,
    /// Project from tags or configuration
    pub project_id: Option<u64>,
    /// Set by the issue tracker for failed tests
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_ref: Option<IssueRef>,
}

impl TestOutcome {
    /// Build an outcome from a raw runner entry.
    ///
    /// `context` holds the tags resolved along the suite chain; tags in the
    /// test's own title take precedence over it.
    pub fn from_raw(
        raw: &RawTest,
        file: &str,
        context: RoutingTags,
        defaults: RoutingDefaults,
    ) -> Self {
        let title = raw.title.clone().unwrap_or_default();
        let full_title = raw.full_title.clone().unwrap_or_else(|| title.clone());
        let state = TestState::from_raw(raw.state.as_deref());

        let error_message = (state == TestState::Failed).then(|| {
            raw.err
                .as_ref()
                .and_then(|err| {
                    err.message
                        .clone()
                        .filter(|m| !m.is_empty())
                        .or_else(|| err.estack.clone().filter(|s| !s.is_empty()))
                })
                .unwrap_or_else(|| DEFAULT_FAILURE_MESSAGE.to_string())
        });

        let tags = RoutingTags::parse(&title).over(context);

        Self {
            title,
            full_title,
            state,
            file: file.to_string(),
            error_message,
            body: raw.code.clone().unwrap_or_default(),
            case_id: tags.case_id,
            suite_id: tags.suite_id.or(Some(defaults.suite_id)),
            project_id: tags.project_id.or(defaults.project_id),
            issue_ref: None,
        }
    }

    /// The remote-facing view of this outcome. Only a case id is required;
    /// whether project and suite are needed depends on the run mode.
    pub fn reportable(&self) -> Option<ReportableOutcome> {
        Some(ReportableOutcome {
            case_id: self.case_id?,
            project_id: self.project_id,
            suite_id: self.suite_id,
            passed: self.state == TestState::Passed,
            title: self.title.clone(),
            file: self.file.clone(),
            error_message: self.error_message.clone(),
        })
    }

    /// Reportable view if the outcome can be sent in `mode`.
    ///
    /// Normal mode groups by project and suite, so both must be known. Adhoc
    /// mode posts into a fixed run and only needs the case id.
    pub fn reportable_for(&self, mode: RunMode) -> Option<ReportableOutcome> {
        let reportable = self.reportable()?;
        match mode {
            RunMode::Normal => reportable.group_key().map(|_| reportable),
            RunMode::Adhoc { .. } => Some(reportable),
        }
    }
}

/// An outcome that carries a case id, ready to be posted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportableOutcome {
    /// Catalog case the result belongs to
    pub case_id: u64,
    /// Project from tags or configuration
    pub project_id: Option<u64>,
    /// Suite from tags or configuration
    pub suite_id: Option<u64>,
    /// False means failed
    pub passed: bool,
    /// Test title
    pub title: String,
    /// Spec file the test came from
    pub file: String,
    /// Present for failed outcomes
    pub error_message: Option<String>,
}

impl ReportableOutcome {
    /// The project/suite pair, when both are known.
    pub fn group_key(&self) -> Option<RunGroupKey> {
        Some(RunGroupKey {
            project_id: self.project_id?,
            suite_id: self.suite_id?,
        })
    }
}
