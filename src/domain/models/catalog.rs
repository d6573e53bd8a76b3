//! Entities exchanged with the remote test catalog.

use serde::{Deserialize, Serialize};

/// A test case definition in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogCase {
    /// Case id
    pub id: u64,
    /// Owning suite, when reported
    #[serde(default)]
    pub suite_id: Option<u64>,
    /// Case title
    #[serde(default)]
    pub title: Option<String>,
}

/// A test inside a run: one case instantiated for that run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogTest {
    /// Test id within the run
    pub id: u64,
    /// Case the test instantiates
    #[serde(default)]
    pub case_id: Option<u64>,
    /// Run the test belongs to
    #[serde(default)]
    pub run_id: Option<u64>,
}

/// One page of a paginated listing, already normalized to a list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// Items on this page
    pub items: Vec<T>,
    /// Total item count, when the catalog reports one
    pub total: Option<u64>,
    /// Whether the catalog advertised another page, when it says so
    pub has_next: Option<bool>,
}

impl<T> Page<T> {
    /// A page holding every item.
    pub fn single(items: Vec<T>) -> Self {
        Self {
            items,
            total: None,
            has_next: None,
        }
    }

    /// Whether paging should stop after this page.
    ///
    /// `fetched` counts items received so far including this page.
    pub fn is_last(&self, limit: u32, fetched: u64) -> bool {
        if self.items.is_empty() || self.items.len() < limit as usize {
            return true;
        }
        if self.total.is_some_and(|total| fetched >= total) {
            return true;
        }
        self.has_next == Some(false)
    }
}

/// Payload for creating a run scoped to an explicit case list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRun {
    /// Run name shown in the catalog
    pub name: String,
    /// Suite the run is created in
    pub suite_id: u64,
    /// Always false; the run holds only `case_ids`
    pub include_all: bool,
    /// Cases included in the run
    pub case_ids: Vec<u64>,
}

/// Binary result status posted for a case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultStatus {
    Passed,
    Failed,
}

impl ResultStatus {
    /// Catalog status identifier.
    pub const fn id(self) -> u8 {
        match self {
            Self::Passed => 1,
            Self::Failed => 5,
        }
    }
}

/// One result line for `add_results_for_cases`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultEntry {
    /// Case the result is for
    pub case_id: u64,
    /// 1 for passed, 5 for failed
    pub status_id: u8,
    /// Pass comment or failure message
    pub comment: String,
}

impl ResultEntry {
    pub fn new(case_id: u64, status: ResultStatus, comment: impl Into<String>) -> Self {
        Self {
            case_id,
            status_id: status.id(),
            comment: comment.into(),
        }
    }

    pub fn passed(&self) -> bool {
        self.status_id == ResultStatus::Passed.id()
    }
}
