//! Domain layer for the xporter reporting pipeline
//!
//! Report documents, test outcomes, routing tags, run lifecycle types and the
//! ports through which the pipeline talks to external systems.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{CatalogError, CatalogResult, ReportError, ReportResult};
