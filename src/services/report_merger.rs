//! Shard discovery and report merging.
//!
//! Every shard must load before anything is merged: a single unreadable or
//! malformed file fails the whole merge, so downstream stages never see a
//! partial report.

use std::fs;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};
use walkdir::WalkDir;

use crate::domain::errors::{ReportError, ReportResult};
use crate::domain::models::{ReportBundle, ReportStats, ReportsConfig, ShardReport, SuiteNode};

/// A shard whose results passed shape validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedShard {
    /// File the shard was read from
    pub path: PathBuf,
    /// Counters as written by the reporter
    pub stats: ReportStats,
    /// Top-level suites
    pub results: Vec<SuiteNode>,
    /// Reporter metadata
    pub meta: Option<Value>,
}

impl ParsedShard {
    /// Validate a raw document. Non-object `results` entries are dropped;
    /// object entries must parse as suites.
    pub fn from_report(path: impl Into<PathBuf>, report: ShardReport) -> Result<Self, serde_json::Error> {
        let path = path.into();
        let mut results = Vec::with_capacity(report.results.len());

        for entry in report.results {
            if entry.is_object() {
                results.push(serde_json::from_value::<SuiteNode>(entry)?);
            } else {
                debug!(path = %path.display(), "Dropping non-object results entry");
            }
        }

        Ok(Self {
            path,
            stats: report.stats,
            results,
            meta: report.meta,
        })
    }
}

fn build_glob_set(patterns: &[String]) -> ReportResult<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| ReportError::InvalidPattern {
            pattern: pattern.clone(),
            reason: e.to_string(),
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|e| ReportError::InvalidPattern {
        pattern: patterns.join(", "),
        reason: e.to_string(),
    })
}

/// Find shard files under `root`.
///
/// Paths are matched relative to `root` and returned sorted. Finding nothing
/// is an error: it means discovery failed, not that zero tests ran.
#[instrument(skip(config), fields(pattern = %config.pattern))]
pub fn discover_report_files(root: &Path, config: &ReportsConfig) -> ReportResult<Vec<PathBuf>> {
    let include = build_glob_set(std::slice::from_ref(&config.pattern))?;
    let ignore = build_glob_set(&config.ignore)?;

    if !root.is_dir() {
        return Err(ReportError::Discovery {
            root: root.to_path_buf(),
            reason: "not a readable directory".to_string(),
        });
    }

    let walker = WalkDir::new(root).into_iter().filter_entry(|entry| {
        if !entry.file_type().is_dir() || entry.depth() == 0 {
            return true;
        }
        // Prune directories whose contents would all be ignored.
        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
        !ignore.is_match(relative.join("_"))
    });

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|e| ReportError::Discovery {
            root: root.to_path_buf(),
            reason: e.to_string(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
        if include.is_match(relative) && !ignore.is_match(relative) {
            files.push(entry.into_path());
        }
    }

    if files.is_empty() {
        return Err(ReportError::NoReportFiles {
            root: root.to_path_buf(),
            pattern: config.pattern.clone(),
        });
    }

    files.sort();
    info!(count = files.len(), "Found report file(s)");
    for file in &files {
        debug!(file = %file.display(), "Report file");
    }
    Ok(files)
}

/// Read and validate one shard file.
pub fn load_shard(path: &Path) -> ReportResult<ParsedShard> {
    let content = fs::read_to_string(path).map_err(|source| ReportError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let parse_err = |source| ReportError::Parse {
        path: path.to_path_buf(),
        source,
    };
    let report: ShardReport = serde_json::from_str(&content).map_err(parse_err)?;
    ParsedShard::from_report(path, report).map_err(parse_err)
}

/// Merge validated shards into one bundle.
///
/// Counters are summed, flags OR-ed, results concatenated in shard order,
/// percentages recomputed and `meta` taken from the first shard.
pub fn merge_shards(shards: Vec<ParsedShard>) -> ReportBundle {
    let mut stats = ReportStats::default();
    let mut results = Vec::new();
    let meta = shards.first().and_then(|s| s.meta.clone());

    for shard in shards {
        let s = &shard.stats;
        stats.tests += s.tests;
        stats.passes += s.passes;
        stats.failures += s.failures;
        stats.pending += s.pending;
        stats.suites += s.suites;
        stats.duration += s.duration;
        stats.tests_registered += s.tests_registered;
        stats.skipped += s.skipped;
        stats.other += s.other;
        stats.has_skipped |= s.has_skipped;
        stats.has_other |= s.has_other;
        stats.start = match (stats.start, s.start) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        stats.end = match (stats.end, s.end) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
        results.extend(shard.results);
    }

    stats.recompute_percentages();
    if !stats.is_consistent() {
        warn!(
            tests = stats.tests,
            passes = stats.passes,
            failures = stats.failures,
            pending = stats.pending,
            skipped = stats.skipped,
            "Merged counters do not add up"
        );
    }

    ReportBundle {
        stats,
        results,
        meta,
    }
}

/// Load every file, then merge. Any load failure aborts before merging.
pub fn load_and_merge(paths: &[PathBuf]) -> ReportResult<ReportBundle> {
    let shards = paths
        .iter()
        .map(|path| load_shard(path))
        .collect::<ReportResult<Vec<_>>>()?;

    let bundle = merge_shards(shards);
    info!(
        shards = paths.len(),
        tests = bundle.stats.tests,
        passes = bundle.stats.passes,
        failures = bundle.stats.failures,
        "Merged report shards"
    );
    Ok(bundle)
}

/// Write the merged bundle as pretty JSON.
pub fn write_merged(bundle: &ReportBundle, path: &Path) -> ReportResult<()> {
    let write_err = |reason: String| ReportError::Write {
        path: path.to_path_buf(),
        reason,
    };
    let json = serde_json::to_string_pretty(bundle).map_err(|e| write_err(e.to_string()))?;
    fs::write(path, json).map_err(|e| write_err(e.to_string()))?;
    info!(path = %path.display(), "Merged report saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn shard(value: Value) -> ParsedShard {
        let report: ShardReport = serde_json::from_value(value).unwrap();
        ParsedShard::from_report("shard.json", report).unwrap()
    }

    #[test]
    fn test_merge_sums_and_recomputes_percentages() {
        let first = shard(json!({
            "stats": { "tests": 3, "passes": 2, "failures": 1, "pending": 0, "suites": 1, "duration": 100 },
            "results": [],
            "meta": { "mocha": { "version": "10.0.0" } }
        }));
        let second = shard(json!({
            "stats": { "tests": 2, "passes": 2, "failures": 0, "pending": 0, "suites": 2, "duration": 50, "hasSkipped": true },
            "results": [],
            "meta": { "mocha": { "version": "9.0.0" } }
        }));

        let bundle = merge_shards(vec![first, second]);
        assert_eq!(bundle.stats.tests, 5);
        assert_eq!(bundle.stats.passes, 4);
        assert_eq!(bundle.stats.failures, 1);
        assert_eq!(bundle.stats.suites, 3);
        assert_eq!(bundle.stats.duration, 150);
        assert!(bundle.stats.has_skipped);
        assert!((bundle.stats.pass_percent - 80.0).abs() < f64::EPSILON);
        assert_eq!(bundle.meta, Some(json!({ "mocha": { "version": "10.0.0" } })));
    }

    #[test]
    fn test_merge_zero_tests_has_zero_percent() {
        let bundle = merge_shards(vec![shard(json!({ "stats": {}, "results": [] }))]);
        assert_eq!(bundle.stats.tests, 0);
        assert!(bundle.stats.pass_percent.abs() < f64::EPSILON);
        assert!(bundle.stats.pending_percent.abs() < f64::EPSILON);
    }

    #[test]
    fn test_merge_keeps_start_and_end_bounds() {
        let a = shard(json!({
            "stats": { "start": "2024-05-01T10:00:00.000Z", "end": "2024-05-01T10:05:00.000Z" },
            "results": []
        }));
        let b = shard(json!({
            "stats": { "start": "2024-05-01T09:59:00.000Z", "end": "2024-05-01T10:03:00.000Z" },
            "results": []
        }));
        let bundle = merge_shards(vec![a, b]);
        assert_eq!(bundle.stats.start.unwrap().to_rfc3339(), "2024-05-01T09:59:00+00:00");
        assert_eq!(bundle.stats.end.unwrap().to_rfc3339(), "2024-05-01T10:05:00+00:00");
    }

    #[test]
    fn test_non_object_results_are_filtered() {
        let parsed = shard(json!({
            "stats": { "tests": 1 },
            "results": [null, 3, "x", { "file": "a.cy.js", "tests": [], "suites": [] }]
        }));
        assert_eq!(parsed.results.len(), 1);
        assert_eq!(parsed.results[0].file.as_deref(), Some("a.cy.js"));
    }

    #[test]
    fn test_results_concatenate_in_shard_order() {
        let a = shard(json!({ "stats": {}, "results": [{ "file": "a.cy.js" }] }));
        let b = shard(json!({ "stats": {}, "results": [{ "file": "b.cy.js" }, { "file": "c.cy.js" }] }));
        let files: Vec<_> = merge_shards(vec![a, b])
            .results
            .into_iter()
            .filter_map(|s| s.file)
            .collect();
        assert_eq!(files, vec!["a.cy.js", "b.cy.js", "c.cy.js"]);
    }

    #[test]
    fn test_missing_results_is_a_shape_error() {
        let value = json!({ "stats": {} });
        assert!(serde_json::from_value::<ShardReport>(value).is_err());
    }

    #[test]
    fn test_discovery_matches_pattern_and_skips_ignored_dirs() {
        let root = tempfile::tempdir().unwrap();
        let write = |rel: &str| {
            let path = root.path().join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, "{}").unwrap();
        };
        write("b/mochawesome_002.json");
        write("a/mochawesome.json");
        write("a/other.json");
        write("node_modules/pkg/mochawesome.json");
        write("CypressTest/mochawesome.json");

        let files = discover_report_files(root.path(), &ReportsConfig::default()).unwrap();
        assert_eq!(
            files,
            vec![
                root.path().join("a/mochawesome.json"),
                root.path().join("b/mochawesome_002.json"),
            ]
        );
    }

    #[test]
    fn test_discovery_errors() {
        let root = tempfile::tempdir().unwrap();
        assert!(matches!(
            discover_report_files(root.path(), &ReportsConfig::default()),
            Err(ReportError::NoReportFiles { .. })
        ));
        assert!(matches!(
            discover_report_files(&root.path().join("missing"), &ReportsConfig::default()),
            Err(ReportError::Discovery { .. })
        ));

        let config = ReportsConfig {
            pattern: "**/[".to_string(),
            ..ReportsConfig::default()
        };
        assert!(matches!(
            discover_report_files(root.path(), &config),
            Err(ReportError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_written_merge_loads_back_as_a_shard() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = merge_shards(vec![shard(json!({
            "stats": { "tests": 1, "passes": 1 },
            "results": [{ "file": "a.cy.js", "uuid": "u-1", "tests": [{ "title": "t", "state": "passed" }] }]
        }))]);
        let path = dir.path().join("merged.json");

        write_merged(&bundle, &path).unwrap();
        let loaded = load_shard(&path).unwrap();

        assert_eq!(loaded.stats, bundle.stats);
        assert_eq!(loaded.results, bundle.results);
    }
}
