//! Prometheus metrics for reconciliation-service.

use crate::models::ReconciliationSummary;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::{Lazy, OnceCell};
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, Encoder, HistogramVec, TextEncoder,
};

/// Recorder behind the `metrics` facade used by the HTTP middleware. `None`
/// when another recorder was already installed in this process.
static HTTP_METRICS: OnceCell<Option<PrometheusHandle>> = OnceCell::new();

/// Counter for reconciliation runs by endpoint and outcome.
pub static RECONCILIATION_RUNS: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "reconciliation_runs_total",
        "Total number of reconciliation runs",
        &["endpoint", "status"]
    )
    .expect("Failed to register RECONCILIATION_RUNS")
});

/// Histogram for reconciliation run duration by endpoint.
pub static RECONCILIATION_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "reconciliation_run_duration_seconds",
        "Reconciliation run duration in seconds",
        &["endpoint"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]
    )
    .expect("Failed to register RECONCILIATION_DURATION")
});

/// Counter for classified results by status.
pub static RECONCILIATION_RESULTS: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "reconciliation_results_total",
        "Total number of reconciliation results",
        &["status"]
    )
    .expect("Failed to register RECONCILIATION_RESULTS")
});

/// Counter for records received per dataset.
pub static RECORDS_INGESTED: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "reconciliation_records_ingested_total",
        "Total number of records received for reconciliation",
        &["dataset"]
    )
    .expect("Failed to register RECORDS_INGESTED")
});

/// Counter for duplicate match keys per dataset.
pub static DUPLICATE_KEYS: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "reconciliation_duplicate_keys_total",
        "Total number of match keys repeated within one dataset",
        &["dataset"]
    )
    .expect("Failed to register DUPLICATE_KEYS")
});

/// Counter for errors.
pub static ERRORS: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "reconciliation_errors_total",
        "Total number of errors",
        &["error_type"]
    )
    .expect("Failed to register ERRORS")
});

/// Initialize all metrics (forces lazy initialization).
pub fn init_metrics() {
    Lazy::force(&RECONCILIATION_RUNS);
    Lazy::force(&RECONCILIATION_DURATION);
    Lazy::force(&RECONCILIATION_RESULTS);
    Lazy::force(&RECORDS_INGESTED);
    Lazy::force(&DUPLICATE_KEYS);
    Lazy::force(&ERRORS);

    HTTP_METRICS.get_or_init(|| match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => Some(handle),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to install HTTP metrics recorder");
            None
        }
    });
}

/// Get all metrics as Prometheus text format.
pub fn get_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return String::new();
    }
    let mut text = String::from_utf8_lossy(&buffer).into_owned();

    if let Some(handle) = HTTP_METRICS.get().and_then(Option::as_ref) {
        text.push_str(&handle.render());
    }
    text
}

/// Record a finished run.
pub fn record_reconciliation_run(endpoint: &str, status: &str, duration_secs: f64) {
    RECONCILIATION_RUNS
        .with_label_values(&[endpoint, status])
        .inc();
    RECONCILIATION_DURATION
        .with_label_values(&[endpoint])
        .observe(duration_secs);
}

/// Record per-status result counts from a summary.
pub fn record_results(summary: &ReconciliationSummary) {
    let counts = [
        ("matched", summary.matched),
        ("mismatched", summary.mismatched),
        ("missing_in_purchase", summary.missing_in_purchase),
        ("missing_in_sales", summary.missing_in_sales),
    ];
    for (status, count) in counts {
        RECONCILIATION_RESULTS
            .with_label_values(&[status])
            .inc_by(count as f64);
    }
}

/// Record incoming records for a dataset.
pub fn record_records_ingested(dataset: &str, count: usize) {
    RECORDS_INGESTED
        .with_label_values(&[dataset])
        .inc_by(count as f64);
}

/// Record a duplicate key.
pub fn record_duplicate_key(dataset: &str) {
    DUPLICATE_KEYS.with_label_values(&[dataset]).inc();
}

/// Record an error.
pub fn record_error(error_type: &str) {
    ERRORS.with_label_values(&[error_type]).inc();
}
