use async_trait::async_trait;

use crate::domain::errors::CatalogResult;
use crate::domain::models::{CatalogCase, CatalogTest, NewRun, Page, ResultEntry};

/// Remote test-management catalog.
///
/// Every call is a blocking round trip from the caller's point of view; the
/// orchestrator awaits them one at a time.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// List cases of a project/suite, one page at a time.
    async fn list_cases(
        &self,
        project_id: u64,
        suite_id: u64,
        limit: u32,
        offset: u64,
    ) -> CatalogResult<Page<CatalogCase>>;

    /// Look up a single case.
    ///
    /// # Returns
    /// * `Ok(Some(case))` if the case exists
    /// * `Ok(None)` if the catalog reports it missing
    async fn get_case(&self, case_id: u64) -> CatalogResult<Option<CatalogCase>>;

    /// Create a run and return its id.
    async fn add_run(&self, project_id: u64, run: &NewRun) -> CatalogResult<u64>;

    /// Post results for cases of a run.
    async fn add_results_for_cases(&self, run_id: u64, results: &[ResultEntry])
        -> CatalogResult<()>;

    async fn close_run(&self, run_id: u64) -> CatalogResult<()>;

    /// List the tests of an existing run, one page at a time.
    async fn list_tests(&self, run_id: u64, limit: u32, offset: u64)
        -> CatalogResult<Page<CatalogTest>>;
}
