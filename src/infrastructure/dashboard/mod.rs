//! Dashboard publishers
//!
//! - ConsoleDashboard: summary tables on the terminal
//! - JsonSummaryDashboard: machine-readable summary file

pub mod console;
pub mod json_summary;

pub use console::ConsoleDashboard;
pub use json_summary::JsonSummaryDashboard;
