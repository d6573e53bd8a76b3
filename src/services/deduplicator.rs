//! Collapses repeated records of the same logical test.
//!
//! The key is the trimmed, lowercased `title`; nothing else is compared.
//! Distinct tests that share a title (for example the same `it` reused in
//! two spec files) collapse too. That is a known limitation.

use std::collections::HashMap;

use tracing::debug;

use crate::domain::models::TestOutcome;

/// Normalized deduplication key of a title.
pub fn dedup_key(title: &str) -> String {
    title.trim().to_lowercase()
}

/// Keep the last record for every key. Kept records stay in the relative
/// order of their positions in `outcomes`.
pub fn deduplicate(outcomes: Vec<TestOutcome>) -> Vec<TestOutcome> {
    let mut last_index: HashMap<String, usize> = HashMap::with_capacity(outcomes.len());
    for (index, outcome) in outcomes.iter().enumerate() {
        last_index.insert(dedup_key(&outcome.title), index);
    }

    let before = outcomes.len();
    let kept: Vec<TestOutcome> = outcomes
        .into_iter()
        .enumerate()
        .filter(|(index, outcome)| last_index.get(&dedup_key(&outcome.title)) == Some(index))
        .map(|(_, outcome)| outcome)
        .collect();

    if kept.len() < before {
        debug!(removed = before - kept.len(), kept = kept.len(), "Deduplicated test outcomes");
    }
    kept
}
