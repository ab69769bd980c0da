//! Request and response types for the HTTP API.
//!
//! This is the ingestion boundary: records arrive already column-mapped with
//! amounts parsed to decimals. Ids are assigned and missing totals synthesized
//! here so the engine only ever sees complete `FinancialRecord`s.

use crate::models::{
    BadgeVariant, Dataset, DuplicateKey, FinancialRecord, ReconciliationResult,
    ReconciliationStatus, ReconciliationSummary,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

/// One register row as supplied by the caller.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct FinancialRecordInput {
    #[validate(length(max = 128))]
    pub id: Option<String>,
    #[serde(default)]
    #[validate(length(max = 32))]
    pub gstin: String,
    #[serde(default)]
    #[validate(length(max = 512))]
    pub party_name: String,
    #[serde(default)]
    #[validate(length(max = 128))]
    pub invoice_no: String,
    #[validate(length(max = 32))]
    pub invoice_date: Option<String>,
    #[serde(default)]
    pub taxable_amount: Decimal,
    #[serde(default)]
    pub igst: Decimal,
    #[serde(default)]
    pub cgst: Decimal,
    #[serde(default)]
    pub sgst: Decimal,
    pub total_amount: Option<Decimal>,
    #[serde(default)]
    pub raw: Option<serde_json::Value>,
}

impl FinancialRecordInput {
    /// Convert to an engine record. `position` is the row's index within its
    /// dataset and names the record when the caller supplied no id.
    pub fn into_record(self, dataset: Dataset, position: usize) -> FinancialRecord {
        let total_amount = self.effective_total();
        FinancialRecord {
            id: self.record_id(dataset, position),
            gstin: self.gstin,
            party_name: self.party_name,
            invoice_no: self.invoice_no,
            invoice_date: self.invoice_date,
            taxable_amount: self.taxable_amount,
            igst: self.igst,
            cgst: self.cgst,
            sgst: self.sgst,
            total_amount,
            raw: self.raw.unwrap_or_default(),
        }
    }

    /// The id the record will carry: the caller's, or one derived from its
    /// position when blank.
    fn record_id(&self, dataset: Dataset, position: usize) -> String {
        match self.id.as_deref() {
            Some(id) if !id.trim().is_empty() => id.to_string(),
            _ => format!("{}-{}", dataset.as_str(), position),
        }
    }

    /// A missing or zero total is rebuilt from its components when there is a
    /// taxable amount; otherwise the supplied value (or zero) stands.
    fn effective_total(&self) -> Decimal {
        match self.total_amount {
            Some(total) if !total.is_zero() => total,
            _ if !self.taxable_amount.is_zero() => [self.igst, self.cgst, self.sgst]
                .into_iter()
                .fold(self.taxable_amount, Decimal::saturating_add),
            other => other.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ReconcileRequest {
    #[serde(default)]
    #[validate(nested)]
    pub purchase: Vec<FinancialRecordInput>,
    #[serde(default)]
    #[validate(nested)]
    pub sales: Vec<FinancialRecordInput>,
}

impl ReconcileRequest {
    /// Reject datasets larger than `max_records` rows.
    pub fn check_limits(&self, max_records: usize) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        for (field, len) in [("purchase", self.purchase.len()), ("sales", self.sales.len())] {
            if len > max_records {
                let mut error = ValidationError::new("too_many_records");
                error.message = Some(
                    format!("{} records exceeds the limit of {}", len, max_records).into(),
                );
                error.add_param("max".into(), &max_records);
                errors.add(field, error);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Reject collections in which two records would end up with the same id,
    /// whether supplied by the caller or assigned from position.
    pub fn check_unique_ids(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        for (dataset, inputs) in [
            (Dataset::Purchase, &self.purchase),
            (Dataset::Sales, &self.sales),
        ] {
            let mut seen = HashSet::with_capacity(inputs.len());
            let duplicate = inputs
                .iter()
                .enumerate()
                .map(|(position, input)| input.record_id(dataset, position))
                .find(|id| !seen.insert(id.clone()));

            if let Some(id) = duplicate {
                let mut error = ValidationError::new("duplicate_id");
                error.message = Some(format!("record id {} appears more than once", id).into());
                error.add_param("id".into(), &id);
                errors.add(dataset.as_str(), error);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub fn into_records(self) -> (Vec<FinancialRecord>, Vec<FinancialRecord>) {
        (
            to_records(self.purchase, Dataset::Purchase),
            to_records(self.sales, Dataset::Sales),
        )
    }
}

fn to_records(inputs: Vec<FinancialRecordInput>, dataset: Dataset) -> Vec<FinancialRecord> {
    inputs
        .into_iter()
        .enumerate()
        .map(|(position, input)| input.into_record(dataset, position))
        .collect()
}

/// A result with its display label and badge attached.
#[derive(Debug, Serialize)]
pub struct ResultView<'a> {
    #[serde(flatten)]
    pub result: ReconciliationResult<'a>,
    pub status_label: &'static str,
    pub badge: BadgeVariant,
}

impl<'a> From<ReconciliationResult<'a>> for ResultView<'a> {
    fn from(result: ReconciliationResult<'a>) -> Self {
        Self {
            status_label: result.status.label(),
            badge: result.status.badge(),
            result,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReconcileResponse<'a> {
    pub run_id: Uuid,
    pub generated_utc: DateTime<Utc>,
    pub summary: ReconciliationSummary,
    pub results: Vec<ResultView<'a>>,
    pub duplicates: Vec<DuplicateKey>,
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub run_id: Uuid,
    pub generated_utc: DateTime<Utc>,
    pub summary: ReconciliationSummary,
    pub duplicate_keys: usize,
}

#[derive(Debug, Serialize)]
pub struct StatusDescriptor {
    pub status: ReconciliationStatus,
    pub label: &'static str,
    pub badge: BadgeVariant,
}

impl From<ReconciliationStatus> for StatusDescriptor {
    fn from(status: ReconciliationStatus) -> Self {
        Self {
            status,
            label: status.label(),
            badge: status.badge(),
        }
    }
}
