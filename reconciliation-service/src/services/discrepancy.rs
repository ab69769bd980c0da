//! Field-level comparison of a purchase record against a sales record.

use crate::models::{FieldValue, FinancialRecord, MismatchField, MismatchReason};
use rust_decimal::Decimal;

/// Amounts within one currency unit of each other are treated as equal.
pub const AMOUNT_TOLERANCE: Decimal = Decimal::ONE;

/// Compare two records that share a match key.
///
/// Every check runs; reasons come back in reporting order: GSTIN, Party Name,
/// Taxable Amount, IGST, CGST, SGST, Total Amount. An empty list means the
/// records agree.
pub fn find_mismatches(purchase: &FinancialRecord, sales: &FinancialRecord) -> Vec<MismatchReason> {
    let mut reasons = Vec::new();

    if gstin_differs(&purchase.gstin, &sales.gstin) {
        reasons.push(text_reason(
            MismatchField::Gstin,
            &purchase.gstin,
            &sales.gstin,
        ));
    }

    if party_name_differs(&purchase.party_name, &sales.party_name) {
        reasons.push(text_reason(
            MismatchField::PartyName,
            &purchase.party_name,
            &sales.party_name,
        ));
    }

    let amounts = [
        (
            MismatchField::TaxableAmount,
            purchase.taxable_amount,
            sales.taxable_amount,
        ),
        (MismatchField::Igst, purchase.igst, sales.igst),
        (MismatchField::Cgst, purchase.cgst, sales.cgst),
        (MismatchField::Sgst, purchase.sgst, sales.sgst),
        (
            MismatchField::TotalAmount,
            purchase.total_amount,
            sales.total_amount,
        ),
    ];

    // Saturates at the Decimal bounds; such a gap is far beyond tolerance anyway.
    for (field, purchase_value, sales_value) in amounts {
        let difference = purchase_value.saturating_sub(sales_value);
        if difference.abs() > AMOUNT_TOLERANCE {
            reasons.push(MismatchReason {
                field,
                purchase_value: FieldValue::Amount(purchase_value),
                sales_value: FieldValue::Amount(sales_value),
                difference: Some(difference),
            });
        }
    }

    reasons
}

fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

/// A blank GSTIN on either side skips the check.
fn gstin_differs(purchase: &str, sales: &str) -> bool {
    let (purchase, sales) = (normalize(purchase), normalize(sales));
    !purchase.is_empty() && !sales.is_empty() && purchase != sales
}

/// Names where one contains the other ("HCL Technologies" / "HCL Technologies Ltd")
/// are not reported.
fn party_name_differs(purchase: &str, sales: &str) -> bool {
    let (purchase, sales) = (normalize(purchase), normalize(sales));
    if purchase.is_empty() || sales.is_empty() || purchase == sales {
        return false;
    }
    !purchase.contains(&sales) && !sales.contains(&purchase)
}

fn text_reason(field: MismatchField, purchase: &str, sales: &str) -> MismatchReason {
    MismatchReason {
        field,
        purchase_value: FieldValue::Text(purchase.to_string()),
        sales_value: FieldValue::Text(sales.to_string()),
        difference: None,
    }
}
