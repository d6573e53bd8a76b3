//! Common test utilities for integration tests
//!
//! Shard fixtures and an in-memory catalog shared across test files.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};
use xporter::domain::models::{CatalogCase, CatalogTest, NewRun, Page, ResultEntry};
use xporter::{CatalogClient, CatalogResult};

/// Write a shard document into `dir`.
#[allow(dead_code)]
pub fn write_shard(dir: &Path, name: &str, value: &Value) {
    std::fs::create_dir_all(dir).expect("Failed to create shard dir");
    std::fs::write(dir.join(name), value.to_string()).expect("Failed to write shard");
}

/// A shard with one spec file whose suite carries project and suite tags.
///
/// `tests` are `(title, state)` pairs.
#[allow(dead_code)]
pub fn shard(spec_file: &str, suite_title: &str, tests: &[(&str, &str)]) -> Value {
    let passes = tests.iter().filter(|(_, s)| *s == "passed").count();
    let failures = tests.iter().filter(|(_, s)| *s == "failed").count();
    let pending = tests.iter().filter(|(_, s)| *s == "pending").count();
    let raw_tests: Vec<Value> = tests
        .iter()
        .map(|(title, state)| {
            let err = if *state == "failed" {
                json!({ "message": format!("AssertionError: {title}") })
            } else {
                json!({})
            };
            json!({
                "title": title,
                "fullTitle": format!("{suite_title} {title}"),
                "state": state,
                "err": err,
                "code": "cy.visit('/')"
            })
        })
        .collect();

    json!({
        "stats": {
            "suites": 1,
            "tests": tests.len(),
            "passes": passes,
            "failures": failures,
            "pending": pending,
            "start": "2026-10-19T08:00:00.000Z",
            "end": "2026-10-19T08:01:00.000Z",
            "duration": 60000
        },
        "results": [{
            "title": "",
            "file": spec_file,
            "tests": [],
            "suites": [{
                "title": suite_title,
                "tests": raw_tests,
                "suites": []
            }]
        }],
        "meta": { "mocha": { "version": "7.0.1" } }
    })
}

/// In-memory catalog recording every write.
#[derive(Default)]
#[allow(dead_code)]
pub struct InMemoryCatalog {
    /// case id to suite id
    pub cases: HashMap<u64, u64>,
    /// case ids instantiated in pre-existing runs
    pub run_members: HashMap<u64, Vec<u64>>,
    pub next_run_id: Mutex<u64>,
    pub runs: Mutex<Vec<(u64, u64, NewRun)>>,
    pub posts: Mutex<Vec<(u64, Vec<ResultEntry>)>>,
    pub closes: Mutex<Vec<u64>>,
}

#[allow(dead_code)]
impl InMemoryCatalog {
    pub fn with_cases(cases: &[(u64, u64)]) -> Self {
        Self {
            cases: cases.iter().copied().collect(),
            next_run_id: Mutex::new(500),
            ..Default::default()
        }
    }

    pub fn with_run(mut self, run_id: u64, members: &[u64]) -> Self {
        self.run_members.insert(run_id, members.to_vec());
        self
    }

    pub fn created_runs(&self) -> Vec<(u64, u64, NewRun)> {
        self.runs.lock().unwrap().clone()
    }

    pub fn posts(&self) -> Vec<(u64, Vec<ResultEntry>)> {
        self.posts.lock().unwrap().clone()
    }

    pub fn closes(&self) -> Vec<u64> {
        self.closes.lock().unwrap().clone()
    }
}

#[async_trait]
impl CatalogClient for InMemoryCatalog {
    async fn list_cases(
        &self,
        _project_id: u64,
        suite_id: u64,
        limit: u32,
        offset: u64,
    ) -> CatalogResult<Page<CatalogCase>> {
        let mut ids: Vec<u64> = self
            .cases
            .iter()
            .filter(|(_, suite)| **suite == suite_id)
            .map(|(id, _)| *id)
            .collect();
        ids.sort_unstable();
        let items = ids
            .into_iter()
            .skip(usize::try_from(offset).unwrap())
            .take(limit as usize)
            .map(|id| CatalogCase {
                id,
                suite_id: Some(suite_id),
                title: None,
            })
            .collect();
        Ok(Page::single(items))
    }

    async fn get_case(&self, case_id: u64) -> CatalogResult<Option<CatalogCase>> {
        Ok(self.cases.get(&case_id).map(|suite| CatalogCase {
            id: case_id,
            suite_id: Some(*suite),
            title: None,
        }))
    }

    async fn add_run(&self, project_id: u64, run: &NewRun) -> CatalogResult<u64> {
        let mut next = self.next_run_id.lock().unwrap();
        *next += 1;
        self.runs.lock().unwrap().push((*next, project_id, run.clone()));
        Ok(*next)
    }

    async fn add_results_for_cases(&self, run_id: u64, results: &[ResultEntry]) -> CatalogResult<()> {
        self.posts.lock().unwrap().push((run_id, results.to_vec()));
        Ok(())
    }

    async fn close_run(&self, run_id: u64) -> CatalogResult<()> {
        self.closes.lock().unwrap().push(run_id);
        Ok(())
    }

    async fn list_tests(&self, run_id: u64, limit: u32, offset: u64) -> CatalogResult<Page<CatalogTest>> {
        let members = self.run_members.get(&run_id).cloned().unwrap_or_default();
        let items = members
            .into_iter()
            .enumerate()
            .skip(usize::try_from(offset).unwrap())
            .take(limit as usize)
            .map(|(i, case_id)| CatalogTest {
                id: i as u64 + 1,
                case_id: Some(case_id),
                run_id: Some(run_id),
            })
            .collect();
        Ok(Page::single(items))
    }
}
