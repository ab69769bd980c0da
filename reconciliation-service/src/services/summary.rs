//! Aggregate counts and totals over a result list.

use crate::models::{ReconciliationResult, ReconciliationStatus, ReconciliationSummary};

pub fn calculate_summary(results: &[ReconciliationResult<'_>]) -> ReconciliationSummary {
    let mut summary = ReconciliationSummary {
        total_records: results.len(),
        ..Default::default()
    };

    for result in results {
        match result.status {
            ReconciliationStatus::Matched => summary.matched += 1,
            ReconciliationStatus::Mismatched => summary.mismatched += 1,
            ReconciliationStatus::MissingInPurchase => summary.missing_in_purchase += 1,
            ReconciliationStatus::MissingInSales => summary.missing_in_sales += 1,
        }
        summary.total_difference_amount = summary
            .total_difference_amount
            .saturating_add(result.total_difference.abs());
    }

    summary.match_percentage = match_percentage(summary.matched, summary.total_records);
    summary
}

/// Whole-number percentage, halves rounded up. Zero when there is nothing to count.
fn match_percentage(matched: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((matched * 200 + total) / (2 * total)) as u32
}
