pub mod catalog_validator;
pub mod deduplicator;
pub mod report_merger;
pub mod report_pipeline;
pub mod reporting_session;
pub mod run_orchestrator;
pub mod test_flattener;

pub use catalog_validator::CatalogValidator;
pub use deduplicator::deduplicate;
pub use report_pipeline::{PipelineOptions, PipelineReport, ReportPipeline};
pub use reporting_session::{CaseResolution, CaseValidationCache, ReportingSession};
pub use run_orchestrator::{AdhocRunStrategy, NormalRunStrategy, RunOrchestrator, RunStrategy};
pub use test_flattener::{partition_by_state, TestFlattener};
