//! Mochawesome report documents.
//!
//! Shard files are parsed into these types at the edge of the pipeline.
//! Unknown fields are carried in `extra` so a merged report written back to
//! disk keeps everything the runner emitted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Aggregate counters of a report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportStats {
    /// Suite count
    #[serde(default)]
    pub suites: u64,
    /// Test count
    #[serde(default)]
    pub tests: u64,
    /// Passed tests
    #[serde(default)]
    pub passes: u64,
    /// Pending tests
    #[serde(default)]
    pub pending: u64,
    /// Failed tests
    #[serde(default)]
    pub failures: u64,
    /// Earliest start across shards
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<DateTime<Utc>>,
    /// Latest end across shards
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<DateTime<Utc>>,
    /// Milliseconds
    #[serde(default)]
    pub duration: u64,
    /// Tests registered with the runner
    #[serde(default)]
    pub tests_registered: u64,
    /// Percentage of `tests` that passed
    #[serde(default)]
    pub pass_percent: f64,
    /// Percentage of `tests` that are pending
    #[serde(default)]
    pub pending_percent: f64,
    /// Tests in no known state
    #[serde(default)]
    pub other: u64,
    /// Whether `other` is non-zero
    #[serde(default)]
    pub has_other: bool,
    /// Skipped tests
    #[serde(default)]
    pub skipped: u64,
    /// Whether `skipped` is non-zero
    #[serde(default)]
    pub has_skipped: bool,
}

impl ReportStats {
    /// Recompute the derived percentages from the counters.
    pub fn recompute_percentages(&mut self) {
        if self.tests == 0 {
            self.pass_percent = 0.0;
            self.pending_percent = 0.0;
        } else {
            let total = self.tests as f64;
            self.pass_percent = self.passes as f64 / total * 100.0;
            self.pending_percent = self.pending as f64 / total * 100.0;
        }
    }

    /// `tests` equals passes + failures + pending (+ skipped).
    pub fn is_consistent(&self) -> bool {
        let counted = self.passes + self.failures + self.pending;
        self.tests == counted || self.tests == counted + self.skipped
    }
}

/// One shard document as written by a single runner process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShardReport {
    /// Counters
    pub stats: ReportStats,
    /// Top-level suites, kept as raw JSON
    pub results: Vec<Value>,
    /// Reporter metadata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

/// A suite in the nested result tree. Top-level results are suites with a
/// `file`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuiteNode {
    /// Suite title, possibly carrying tags
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Spec file, set on top-level suites
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Tests declared directly in this suite
    #[serde(default)]
    pub tests: Vec<RawTest>,
    /// Nested suites
    #[serde(default)]
    pub suites: Vec<SuiteNode>,
    /// Fields this crate does not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A test entry as emitted by the runner.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTest {
    /// Title, possibly carrying tags
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Title with suite prefixes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_title: Option<String>,
    /// Reporter state string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Error payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub err: Option<RawError>,
    /// Test source
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Fields this crate does not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Error payload of a failed test. Passing tests carry an empty object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawError {
    /// Assertion message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Stack trace
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estack: Option<String>,
    /// Fields this crate does not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Merged view over every shard of one execution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportBundle {
    /// Merged counters
    pub stats: ReportStats,
    /// Suites from every shard, in shard order
    pub results: Vec<SuiteNode>,
    /// Metadata from the first shard
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}
