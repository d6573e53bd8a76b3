use chrono::{DateTime, Local};

use crate::domain::models::ReportableOutcome;

/// Timestamp format used in run names.
pub const RUN_TIMESTAMP_FORMAT: &str = "%m/%d/%Y, %I:%M:%S %p";

/// Name for a new run, taken from the first outcome whose spec path contains
/// `root_marker`.
///
/// `cypress/e2e/shop/cart/checkout.cy.js` gives `SHOP-CART Automated Run (..)`,
/// `cypress/e2e/smoke.cy.js` gives `SMOKE.CY.JS Automated Run (..)` and no
/// match at all gives `Automated Run (..)`.
pub fn derive_run_name(
    outcomes: &[ReportableOutcome],
    root_marker: &str,
    started_at: DateTime<Local>,
) -> String {
    let timestamp = started_at.format(RUN_TIMESTAMP_FORMAT);
    let marker = root_marker.replace('\\', "/").to_lowercase();

    for outcome in outcomes {
        let file = outcome.file.replace('\\', "/").to_lowercase();
        let Some((_, rest)) = file.split_once(marker.as_str()) else {
            continue;
        };

        let segments: Vec<&str> = rest.split('/').filter(|s| !s.is_empty()).collect();
        match segments.as_slice() {
            [group, subgroup, ..] => {
                return format!(
                    "{}-{} Automated Run ({timestamp})",
                    group.to_uppercase(),
                    subgroup.to_uppercase()
                );
            }
            [group] => return format!("{} Automated Run ({timestamp})", group.to_uppercase()),
            [] => {}
        }
    }

    format!("Automated Run ({timestamp})")
}
