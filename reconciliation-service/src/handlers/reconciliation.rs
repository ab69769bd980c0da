//! Reconciliation endpoints.

use crate::dtos::{
    ReconcileRequest, ReconcileResponse, ResultView, StatusDescriptor, SummaryResponse,
};
use crate::models::{
    DuplicateKey, FinancialRecord, ReconciliationStatus, ReconciliationSummary,
};
use crate::services::{
    calculate_summary, reconcile_with_diagnostics, record_duplicate_key, record_error,
    record_reconciliation_run, record_records_ingested, record_results,
};
use crate::startup::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::Utc;
use service_core::error::AppError;
use service_core::middleware::tracing::RequestId;
use std::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

/// Run a full reconciliation and return every classified result.
pub async fn reconcile(
    State(state): State<AppState>,
    request_id: Option<Extension<RequestId>>,
    payload: Result<Json<ReconcileRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    const ENDPOINT: &str = "reconcile";
    let started = Instant::now();

    let (purchase, sales) = accept(&state, payload).map_err(|e| reject(ENDPOINT, started, e))?;

    let reconciliation = reconcile_with_diagnostics(&purchase, &sales);
    let summary = calculate_summary(&reconciliation.results);
    let run_id = Uuid::new_v4();

    observe(ENDPOINT, started, &summary, &reconciliation.duplicates);
    info!(
        run_id = %run_id,
        request_id = request_id_of(&request_id),
        total_records = summary.total_records,
        matched = summary.matched,
        mismatched = summary.mismatched,
        missing_in_purchase = summary.missing_in_purchase,
        missing_in_sales = summary.missing_in_sales,
        "Reconciliation completed"
    );

    let response = ReconcileResponse {
        run_id,
        generated_utc: Utc::now(),
        summary,
        results: reconciliation
            .results
            .into_iter()
            .map(ResultView::from)
            .collect(),
        duplicates: reconciliation.duplicates,
    };

    Ok(Json(response).into_response())
}

/// Run a reconciliation and return only the aggregate summary.
pub async fn summarize(
    State(state): State<AppState>,
    request_id: Option<Extension<RequestId>>,
    payload: Result<Json<ReconcileRequest>, JsonRejection>,
) -> Result<Json<SummaryResponse>, AppError> {
    const ENDPOINT: &str = "summarize";
    let started = Instant::now();

    let (purchase, sales) = accept(&state, payload).map_err(|e| reject(ENDPOINT, started, e))?;

    let reconciliation = reconcile_with_diagnostics(&purchase, &sales);
    let summary = calculate_summary(&reconciliation.results);
    let run_id = Uuid::new_v4();

    observe(ENDPOINT, started, &summary, &reconciliation.duplicates);
    info!(
        run_id = %run_id,
        request_id = request_id_of(&request_id),
        total_records = summary.total_records,
        match_percentage = summary.match_percentage,
        "Reconciliation summary completed"
    );

    Ok(Json(SummaryResponse {
        run_id,
        generated_utc: Utc::now(),
        summary,
        duplicate_keys: reconciliation.duplicates.len(),
    }))
}

/// The closed set of result statuses with their display label and badge.
pub async fn list_statuses() -> Json<Vec<StatusDescriptor>> {
    Json(
        ReconciliationStatus::ALL
            .into_iter()
            .map(StatusDescriptor::from)
            .collect(),
    )
}

/// Parse, validate and convert an incoming payload into engine records.
fn accept(
    state: &AppState,
    payload: Result<Json<ReconcileRequest>, JsonRejection>,
) -> Result<(Vec<FinancialRecord>, Vec<FinancialRecord>), AppError> {
    let Json(request) = payload?;

    request.check_limits(state.config.limits.max_records_per_dataset)?;
    request.validate()?;
    request.check_unique_ids()?;

    record_records_ingested("purchase", request.purchase.len());
    record_records_ingested("sales", request.sales.len());

    Ok(request.into_records())
}

fn request_id_of(request_id: &Option<Extension<RequestId>>) -> &str {
    request_id
        .as_ref()
        .map(|Extension(id)| id.0.as_str())
        .unwrap_or("-")
}

fn reject(endpoint: &str, started: Instant, error: AppError) -> AppError {
    warn!(endpoint = endpoint, error = %error, "Rejected reconciliation request");
    record_error(error.kind());
    record_reconciliation_run(endpoint, "rejected", started.elapsed().as_secs_f64());
    error
}

fn observe(
    endpoint: &str,
    started: Instant,
    summary: &ReconciliationSummary,
    duplicates: &[DuplicateKey],
) {
    record_results(summary);
    for duplicate in duplicates {
        record_duplicate_key(duplicate.dataset.as_str());
    }
    record_reconciliation_run(endpoint, "completed", started.elapsed().as_secs_f64());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LimitsConfig, ReconciliationConfig};
    use crate::startup::build_router;
    use axum::{body::Body, http};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use service_core::config::Config as CommonConfig;
    use tower::ServiceExt;

    fn state(max_records_per_dataset: usize) -> AppState {
        state_with_body_limit(max_records_per_dataset, LimitsConfig::default().max_body_bytes)
    }

    fn state_with_body_limit(max_records_per_dataset: usize, max_body_bytes: usize) -> AppState {
        AppState {
            config: ReconciliationConfig {
                common: CommonConfig { port: 0 },
                service_name: "reconciliation-service-test".to_string(),
                service_version: "test".to_string(),
                log_level: "debug".to_string(),
                otlp_endpoint: None,
                limits: LimitsConfig {
                    max_records_per_dataset,
                    max_body_bytes,
                },
            },
        }
    }

    async fn post(app: axum::Router, uri: &str, body: &str) -> (http::StatusCode, Value) {
        let request = http::Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn register(rows: usize, prefix: &str) -> Vec<Value> {
        (0..rows)
            .map(|i| {
                json!({
                    "gstin": "29AAACH7409R1ZX",
                    "party_name": "HCL Technologies Limited",
                    "invoice_no": format!("{}-2024-{:06}", prefix, i),
                    "invoice_date": "01-04-2024",
                    "taxable_amount": "100000.00",
                    "igst": "18000.00",
                    "total_amount": "118000.00"
                })
            })
            .collect()
    }

    #[tokio::test]
    async fn test_reconcile_attaches_labels() {
        let body = json!({
            "purchase": [{ "invoice_no": "INV-1", "invoice_date": "2024-01-05", "taxable_amount": 100 }],
            "sales": [{ "invoice_no": "inv-1", "invoice_date": "05/01/2024", "taxable_amount": 100 }]
        });

        let (status, json) =
            post(build_router(state(10)), "/reconciliations", &body.to_string()).await;

        assert_eq!(status, http::StatusCode::OK);
        assert_eq!(json["summary"]["matched"], 1);
        assert_eq!(json["results"][0]["status"], "matched");
        assert_eq!(json["results"][0]["status_label"], "Matched");
        assert_eq!(json["results"][0]["badge"], "success");
        assert_eq!(json["results"][0]["match_key"], "INV-1|2024-01-05");
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let (status, json) = post(build_router(state(10)), "/reconciliations", "{not json").await;
        assert_eq!(status, http::StatusCode::BAD_REQUEST);
        assert!(json["error"].is_string());
    }

    #[tokio::test]
    async fn test_oversized_dataset_is_rejected() {
        let body = json!({
            "purchase": [{ "invoice_no": "A" }, { "invoice_no": "B" }],
            "sales": []
        });

        let (status, json) =
            post(build_router(state(1)), "/reconciliations/summary", &body.to_string()).await;
        assert_eq!(status, http::StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json["error"], "Validation error");
    }

    #[tokio::test]
    async fn test_large_body_under_record_cap_is_accepted() {
        let body = json!({
            "purchase": register(10_000, "INV"),
            "sales": register(10_000, "INV")
        })
        .to_string();
        assert!(body.len() > 2 * 1024 * 1024);

        let (status, json) =
            post(build_router(state(50_000)), "/reconciliations/summary", &body).await;

        assert_eq!(status, http::StatusCode::OK);
        assert_eq!(json["summary"]["total_records"], 10_000);
        assert_eq!(json["summary"]["matched"], 10_000);
    }

    #[tokio::test]
    async fn test_body_over_byte_limit_is_payload_too_large() {
        let body = json!({ "purchase": register(50, "INV"), "sales": [] }).to_string();

        let (status, json) = post(
            build_router(state_with_body_limit(50_000, 1024)),
            "/reconciliations",
            &body,
        )
        .await;

        assert_eq!(status, http::StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(json["error"], "Payload too large");
    }

    #[tokio::test]
    async fn test_duplicate_record_ids_are_rejected() {
        let body = json!({
            "purchase": [
                { "id": "X", "invoice_no": "INV-1" },
                { "id": "X", "invoice_no": "INV-1" }
            ],
            "sales": []
        });

        let (status, json) =
            post(build_router(state(10)), "/reconciliations", &body.to_string()).await;
        assert_eq!(status, http::StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json["error"], "Validation error");
    }
}
