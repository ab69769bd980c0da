//! Pairs purchase and sales records by match key and classifies each key.

use crate::models::{
    Dataset, DuplicateKey, FinancialRecord, MatchKey, MismatchField, ReconciliationResult,
    ReconciliationStatus,
};
use crate::services::discrepancy::find_mismatches;
use crate::services::match_key::generate_match_key;
use rust_decimal::Decimal;
use std::collections::HashMap;
use tracing::{debug, instrument, warn};

/// Output of a reconciliation run.
#[derive(Debug, Clone)]
pub struct Reconciliation<'a> {
    /// Purchase keys first, in first-seen order, then sales-only keys in
    /// first-seen order.
    pub results: Vec<ReconciliationResult<'a>>,
    /// Keys that appeared more than once within a single dataset.
    pub duplicates: Vec<DuplicateKey>,
}

struct KeyedEntry<'a> {
    key: MatchKey,
    record: &'a FinancialRecord,
    superseded: Vec<&'a FinancialRecord>,
}

/// Key to record lookup that remembers first-seen key order.
///
/// A repeated key keeps its original position but its record is replaced by
/// the later one; the earlier records are retained only for diagnostics.
struct KeyedRecords<'a> {
    positions: HashMap<MatchKey, usize>,
    entries: Vec<KeyedEntry<'a>>,
}

impl<'a> KeyedRecords<'a> {
    fn build(records: &'a [FinancialRecord]) -> Self {
        let mut keyed = Self {
            positions: HashMap::with_capacity(records.len()),
            entries: Vec::with_capacity(records.len()),
        };

        for record in records {
            let key = generate_match_key(record);
            match keyed.positions.get(&key) {
                Some(&position) => {
                    let entry = &mut keyed.entries[position];
                    let previous = std::mem::replace(&mut entry.record, record);
                    entry.superseded.push(previous);
                }
                None => {
                    keyed.positions.insert(key.clone(), keyed.entries.len());
                    keyed.entries.push(KeyedEntry {
                        key,
                        record,
                        superseded: Vec::new(),
                    });
                }
            }
        }

        keyed
    }

    fn get(&self, key: &MatchKey) -> Option<&'a FinancialRecord> {
        self.positions
            .get(key)
            .map(|&position| self.entries[position].record)
    }

    fn contains(&self, key: &MatchKey) -> bool {
        self.positions.contains_key(key)
    }

    fn duplicates(&self, dataset: Dataset) -> impl Iterator<Item = DuplicateKey> + '_ {
        self.entries
            .iter()
            .filter(|entry| !entry.superseded.is_empty())
            .map(move |entry| DuplicateKey {
                dataset,
                match_key: entry.key.clone(),
                kept_record_id: entry.record.id.clone(),
                discarded_record_ids: entry.superseded.iter().map(|r| r.id.clone()).collect(),
            })
    }
}

/// Reconcile the two registers, returning one result per distinct match key.
pub fn reconcile_datasets<'a>(
    purchase_records: &'a [FinancialRecord],
    sales_records: &'a [FinancialRecord],
) -> Vec<ReconciliationResult<'a>> {
    reconcile_with_diagnostics(purchase_records, sales_records).results
}

/// Same classification as [`reconcile_datasets`], also reporting the records
/// that lost out to a later record with the same key.
#[instrument(skip_all, fields(purchase = purchase_records.len(), sales = sales_records.len()))]
pub fn reconcile_with_diagnostics<'a>(
    purchase_records: &'a [FinancialRecord],
    sales_records: &'a [FinancialRecord],
) -> Reconciliation<'a> {
    let purchase = KeyedRecords::build(purchase_records);
    let sales = KeyedRecords::build(sales_records);

    let mut results = Vec::with_capacity(purchase.entries.len() + sales.entries.len());

    for entry in &purchase.entries {
        let id = format!("result-{}", results.len());
        let result = match sales.get(&entry.key) {
            None => ReconciliationResult {
                id,
                status: ReconciliationStatus::MissingInSales,
                purchase_record: Some(entry.record),
                sales_record: None,
                match_key: entry.key.clone(),
                mismatches: Vec::new(),
                total_difference: entry.record.total_amount,
            },
            Some(sales_record) => {
                let mismatches = find_mismatches(entry.record, sales_record);
                if mismatches.is_empty() {
                    ReconciliationResult {
                        id,
                        status: ReconciliationStatus::Matched,
                        purchase_record: Some(entry.record),
                        sales_record: Some(sales_record),
                        match_key: entry.key.clone(),
                        mismatches,
                        total_difference: Decimal::ZERO,
                    }
                } else {
                    // Only a Total Amount discrepancy feeds the aggregate gap.
                    let total_difference = mismatches
                        .iter()
                        .find(|reason| reason.field == MismatchField::TotalAmount)
                        .and_then(|reason| reason.difference)
                        .unwrap_or(Decimal::ZERO);

                    ReconciliationResult {
                        id,
                        status: ReconciliationStatus::Mismatched,
                        purchase_record: Some(entry.record),
                        sales_record: Some(sales_record),
                        match_key: entry.key.clone(),
                        mismatches,
                        total_difference,
                    }
                }
            }
        };
        results.push(result);
    }

    for entry in sales.entries.iter().filter(|e| !purchase.contains(&e.key)) {
        results.push(ReconciliationResult {
            id: format!("result-{}", results.len()),
            status: ReconciliationStatus::MissingInPurchase,
            purchase_record: None,
            sales_record: Some(entry.record),
            match_key: entry.key.clone(),
            mismatches: Vec::new(),
            total_difference: -entry.record.total_amount,
        });
    }

    let duplicates: Vec<DuplicateKey> = purchase
        .duplicates(Dataset::Purchase)
        .chain(sales.duplicates(Dataset::Sales))
        .collect();

    for duplicate in &duplicates {
        warn!(
            dataset = duplicate.dataset.as_str(),
            match_key = %duplicate.match_key,
            kept_record_id = %duplicate.kept_record_id,
            discarded = duplicate.discarded_record_ids.len(),
            "Duplicate match key, earlier records ignored"
        );
    }

    debug!(results = results.len(), duplicates = duplicates.len(), "Reconciled datasets");

    Reconciliation {
        results,
        duplicates,
    }
}
