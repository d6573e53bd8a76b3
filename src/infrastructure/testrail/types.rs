//! Wire types of the TestRail v2 API.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::models::{Page, ResultEntry};

/// Body of `add_results_for_cases`.
#[derive(Debug, Serialize)]
pub struct AddResultsRequest<'a> {
    /// One entry per case
    pub results: &'a [ResultEntry],
}

/// The part of `add_run` answers we need.
#[derive(Debug, Deserialize)]
pub struct CreatedRun {
    /// Id of the new run
    pub id: u64,
}

/// Normalize a listing response into a page.
///
/// TestRail answered bulk endpoints with a bare array before 6.7 and with a
/// paginated envelope (`{offset, limit, size, _links, <key>: [...]}`) since.
/// Null and scalar bodies are treated as empty; an object carrying an `id`
/// instead of the list key is taken as a single item.
pub fn normalize_listing<T: DeserializeOwned>(body: Value, key: &str) -> Result<Page<T>, serde_json::Error> {
    match body {
        Value::Array(items) => Ok(Page::single(decode_items(items)?)),
        Value::Object(mut map) => {
            if !map.contains_key(key) && map.contains_key("id") {
                return Ok(Page::single(vec![serde_json::from_value(Value::Object(map))?]));
            }
            let items = match map.remove(key).unwrap_or(Value::Null) {
                Value::Array(items) => decode_items(items)?,
                Value::Null => Vec::new(),
                single => vec![serde_json::from_value(single)?],
            };
            let has_next = map
                .get("_links")
                .and_then(|links| links.get("next"))
                .map(|next| !next.is_null());
            Ok(Page {
                items,
                total: None,
                has_next,
            })
        }
        _ => Ok(Page::single(Vec::new())),
    }
}

fn decode_items<T: DeserializeOwned>(items: Vec<Value>) -> Result<Vec<T>, serde_json::Error> {
    items.into_iter().map(serde_json::from_value).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{CatalogCase, CatalogTest};
    use serde_json::json;

    #[test]
    fn test_bare_array() {
        let page: Page<CatalogCase> =
            normalize_listing(json!([{ "id": 1, "suite_id": 2 }, { "id": 3 }]), "cases").unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].suite_id, Some(2));
        assert_eq!(page.has_next, None);
    }

    #[test]
    fn test_envelope_with_next_link() {
        let body = json!({
            "offset": 0,
            "limit": 250,
            "size": 1,
            "_links": { "next": "/api/v2/get_tests/5&offset=250", "prev": null },
            "tests": [{ "id": 10, "case_id": 4, "run_id": 5 }]
        });
        let page: Page<CatalogTest> = normalize_listing(body, "tests").unwrap();
        assert_eq!(page.items[0].case_id, Some(4));
        assert_eq!(page.has_next, Some(true));
    }

    #[test]
    fn test_envelope_last_page() {
        let body = json!({ "_links": { "next": null }, "cases": [] });
        let page: Page<CatalogCase> = normalize_listing(body, "cases").unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.has_next, Some(false));
    }

    #[test]
    fn test_null_and_scalar_are_empty() {
        let page: Page<CatalogCase> = normalize_listing(Value::Null, "cases").unwrap();
        assert!(page.items.is_empty());
        let page: Page<CatalogCase> = normalize_listing(json!(0), "cases").unwrap();
        assert!(page.items.is_empty());
    }

    #[test]
    fn test_single_object() {
        let page: Page<CatalogCase> = normalize_listing(json!({ "id": 9, "suite_id": 1 }), "cases").unwrap();
        assert_eq!(page.items, vec![CatalogCase {
            id: 9,
            suite_id: Some(1),
            title: None,
        }]);
    }
}
