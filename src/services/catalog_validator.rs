//! Confirms that case ids exist in the catalog under the expected suite.
//!
//! Two paths: a paginated bulk listing of the suite, then a per-id lookup for
//! every candidate the listing did not confirm. Catalog failures never
//! propagate; an id that cannot be confirmed is simply not valid.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::domain::errors::CatalogResult;
use crate::domain::models::CatalogCase;
use crate::domain::ports::CatalogClient;
use crate::services::reporting_session::{CaseResolution, CaseValidationCache};

/// Catalog-backed case validator.
#[derive(Clone)]
pub struct CatalogValidator {
    client: Arc<dyn CatalogClient>,
    page_size: u32,
}

impl CatalogValidator {
    pub fn new(client: Arc<dyn CatalogClient>, page_size: u32) -> Self {
        Self {
            client,
            page_size: page_size.max(1),
        }
    }

    /// Subset of `candidates` confirmed under `project_id`/`suite_id`, in
    /// candidate order without duplicates.
    ///
    /// Resolutions are written to `cache`; an id already in the cache is
    /// never sent to the catalog again.
    #[instrument(skip(self, cache, candidates), fields(candidates = candidates.len()))]
    pub async fn valid_case_ids(
        &self,
        cache: &mut CaseValidationCache,
        project_id: u64,
        suite_id: u64,
        candidates: &[u64],
    ) -> Vec<u64> {
        let mut seen = HashSet::new();
        let candidates: Vec<u64> = candidates
            .iter()
            .copied()
            .filter(|id| seen.insert(*id))
            .collect();

        let unresolved: Vec<u64> = candidates
            .iter()
            .copied()
            .filter(|id| !cache.contains(*id))
            .collect();

        if !unresolved.is_empty() {
            match self.list_all_cases(project_id, suite_id).await {
                Ok(cases) => {
                    debug!(listed = cases.len(), "Bulk case listing complete");
                    for case in cases {
                        cache.resolve(case.id, CaseResolution::found(case.suite_id.or(Some(suite_id))));
                    }
                }
                Err(err) => {
                    warn!(error = %err, "Bulk case listing failed, falling back to per-case lookups");
                }
            }

            for case_id in unresolved {
                if cache.contains(case_id) {
                    continue;
                }
                let resolution = self.lookup_case(case_id).await;
                cache.resolve(case_id, resolution);
            }
        }

        let mut valid = Vec::with_capacity(candidates.len());
        for case_id in candidates {
            match cache.get(case_id) {
                Some(resolution) if resolution.is_valid_for(suite_id) => valid.push(case_id),
                Some(CaseResolution {
                    exists: true,
                    suite_id: Some(actual),
                }) => warn!(
                    case_id,
                    expected_suite = suite_id,
                    actual_suite = actual,
                    "Case belongs to a different suite, excluding it from this group"
                ),
                _ => debug!(case_id, "Case not found in catalog"),
            }
        }

        info!(valid = valid.len(), "Validated case ids");
        valid
    }

    /// Every case of a project/suite, following pages until the listing ends.
    async fn list_all_cases(&self, project_id: u64, suite_id: u64) -> CatalogResult<Vec<CatalogCase>> {
        let mut cases = Vec::new();
        let mut seen = HashSet::new();
        let mut offset = 0u64;

        loop {
            let page = self
                .client
                .list_cases(project_id, suite_id, self.page_size, offset)
                .await?;

            let fetched = page.items.len() as u64;
            let fresh = page.items.iter().filter(|c| seen.insert(c.id)).count();
            offset += fetched;
            let is_last = page.is_last(self.page_size, offset);
            cases.extend(page.items);

            // A catalog that ignores the offset would otherwise loop forever.
            if is_last || fresh == 0 {
                break;
            }
        }

        Ok(cases)
    }

    async fn lookup_case(&self, case_id: u64) -> CaseResolution {
        match self.client.get_case(case_id).await {
            Ok(Some(case)) => CaseResolution::found(case.suite_id),
            Ok(None) => CaseResolution::missing(),
            Err(err) => {
                warn!(case_id, error = %err, "Case lookup failed");
                CaseResolution::missing()
            }
        }
    }
}
