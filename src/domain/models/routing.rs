//! Routing tags embedded in test and suite titles.
//!
//! Grammar (case-insensitive, anywhere in a title, any order):
//! `[C<digits>]` case, `[P<digits>]` project, `[S<digits>]` suite.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static TAG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\[([cps])(\d+)\]").expect("tag pattern is valid"));

/// Identifiers parsed from one title, or inherited from ancestors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoutingTags {
    /// From `[C#]`
    pub case_id: Option<u64>,
    /// From `[P#]`
    pub project_id: Option<u64>,
    /// From `[S#]`
    pub suite_id: Option<u64>,
}

impl RoutingTags {
    /// Parse every tag kind out of `title`. The first occurrence of a kind
    /// wins; malformed brackets such as `[C]` are not matches.
    pub fn parse(title: &str) -> Self {
        let mut tags = Self::default();

        for caps in TAG_PATTERN.captures_iter(title) {
            let Ok(value) = caps[2].parse::<u64>() else {
                continue;
            };
            let slot = match caps[1].as_bytes()[0].to_ascii_lowercase() {
                b'c' => &mut tags.case_id,
                b'p' => &mut tags.project_id,
                _ => &mut tags.suite_id,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }

        tags
    }

    /// Tags of a nested title laid over the inherited ones. Each kind present
    /// in `self` replaces the inherited value; absent kinds are inherited.
    #[must_use]
    pub fn over(self, inherited: Self) -> Self {
        Self {
            case_id: self.case_id.or(inherited.case_id),
            project_id: self.project_id.or(inherited.project_id),
            suite_id: self.suite_id.or(inherited.suite_id),
        }
    }

    /// No tag was found.
    pub fn is_empty(&self) -> bool {
        self.case_id.is_none() && self.project_id.is_none() && self.suite_id.is_none()
    }
}

/// Fallbacks applied when no title in the chain carries a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutingDefaults {
    /// Used when no `[P#]` tag applies
    pub project_id: Option<u64>,
    /// Used when no `[S#]` tag applies
    pub suite_id: u64,
}

impl Default for RoutingDefaults {
    fn default() -> Self {
        Self {
            project_id: None,
            suite_id: 1,
        }
    }
}
