pub mod ingestion_manager;
pub mod reconcile;

pub use ingestion_manager::{IngestionManager, IngestionOptions, IngestionSummary, OperatorOutcome};
pub use reconcile::{reconcile, reconcile_operator, ReconcileSummary, WriteMode};
