//! Services module for reconciliation-service.

pub mod discrepancy;
pub mod match_key;
pub mod matcher;
pub mod metrics;
pub mod summary;

pub use discrepancy::{find_mismatches, AMOUNT_TOLERANCE};
pub use match_key::generate_match_key;
pub use matcher::{reconcile_datasets, reconcile_with_diagnostics, Reconciliation};
pub use metrics::{
    get_metrics, init_metrics, record_duplicate_key, record_error, record_reconciliation_run,
    record_records_ingested, record_results,
};
pub use summary::calculate_summary;
