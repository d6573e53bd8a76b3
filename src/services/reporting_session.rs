//! Per-execution state shared by the validator and the orchestrator.
//!
//! Owned by the caller and passed in by `&mut`; two sessions never share
//! anything, so repeated invocations in tests stay isolated.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Local};
use tracing::debug;

use crate::domain::models::RunGroupKey;

/// What the catalog said about one case id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaseResolution {
    /// Whether the catalog knows the case
    pub exists: bool,
    /// Suite the catalog places the case in, when known
    pub suite_id: Option<u64>,
}

impl CaseResolution {
    /// The catalog has the case, in `suite_id` if it said so.
    pub const fn found(suite_id: Option<u64>) -> Self {
        Self {
            exists: true,
            suite_id,
        }
    }

    /// The catalog does not have the case, or could not say.
    pub const fn missing() -> Self {
        Self {
            exists: false,
            suite_id: None,
        }
    }

    /// Valid for a group addressed at `suite_id`. The catalog must have
    /// reported that exact suite.
    pub fn is_valid_for(&self, suite_id: u64) -> bool {
        self.exists && self.suite_id == Some(suite_id)
    }
}

/// Lazily filled `case_id → resolution` memo.
#[derive(Debug, Clone, Default)]
pub struct CaseValidationCache {
    entries: HashMap<u64, CaseResolution>,
}

impl CaseValidationCache {
    pub fn get(&self, case_id: u64) -> Option<CaseResolution> {
        self.entries.get(&case_id).copied()
    }

    pub fn contains(&self, case_id: u64) -> bool {
        self.entries.contains_key(&case_id)
    }

    /// Record a resolution. The first answer for a case id is kept.
    pub fn resolve(&mut self, case_id: u64, resolution: CaseResolution) {
        self.entries.entry(case_id).or_insert(resolution);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// State of one reporting execution.
#[derive(Debug, Clone)]
pub struct ReportingSession {
    started_at: DateTime<Local>,
    run_ids: HashMap<RunGroupKey, u64>,
    closed_runs: HashSet<u64>,
    adhoc_members: HashMap<u64, HashSet<u64>>,
    /// Case validation memo
    pub cases: CaseValidationCache,
}

impl ReportingSession {
    pub fn new() -> Self {
        Self::started_at(Local::now())
    }

    /// A session with a fixed wall-clock start, used for run names.
    pub fn started_at(started_at: DateTime<Local>) -> Self {
        Self {
            started_at,
            run_ids: HashMap::new(),
            closed_runs: HashSet::new(),
            adhoc_members: HashMap::new(),
            cases: CaseValidationCache::default(),
        }
    }

    /// When the session began; used in run names.
    pub fn start_time(&self) -> DateTime<Local> {
        self.started_at
    }

    /// Run already created for `key` in this session.
    pub fn run_for(&self, key: RunGroupKey) -> Option<u64> {
        self.run_ids.get(&key).copied()
    }

    pub fn remember_run(&mut self, key: RunGroupKey, run_id: u64) {
        debug!(group = %key, run_id, "Memoized run for group");
        self.run_ids.insert(key, run_id);
    }

    /// Whether this session closed `run_id`.
    pub fn is_closed(&self, run_id: u64) -> bool {
        self.closed_runs.contains(&run_id)
    }

    pub fn mark_closed(&mut self, run_id: u64) {
        self.closed_runs.insert(run_id);
    }

    /// Cached case ids of an adhoc run.
    pub fn adhoc_members(&self, run_id: u64) -> Option<&HashSet<u64>> {
        self.adhoc_members.get(&run_id)
    }

    pub fn remember_adhoc_members(&mut self, run_id: u64, case_ids: HashSet<u64>) {
        self.adhoc_members.insert(run_id, case_ids);
    }
}

impl Default for ReportingSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_validity() {
        assert!(CaseResolution::found(Some(3)).is_valid_for(3));
        assert!(!CaseResolution::found(Some(3)).is_valid_for(4));
        assert!(!CaseResolution::found(None).is_valid_for(4));
        assert!(!CaseResolution::missing().is_valid_for(1));
    }

    #[test]
    fn test_cache_keeps_first_answer() {
        let mut cache = CaseValidationCache::default();
        cache.resolve(10, CaseResolution::found(Some(1)));
        cache.resolve(10, CaseResolution::missing());
        assert_eq!(cache.get(10), Some(CaseResolution::found(Some(1))));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_sessions_are_isolated() {
        let key = RunGroupKey {
            project_id: 1,
            suite_id: 2,
        };
        let mut first = ReportingSession::new();
        first.remember_run(key, 99);
        first.mark_closed(99);

        let second = ReportingSession::new();
        assert_eq!(first.run_for(key), Some(99));
        assert!(first.is_closed(99));
        assert!(second.run_for(key).is_none());
        assert!(!second.is_closed(99));
    }
}
