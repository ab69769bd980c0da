//! Domain models for reconciliation-service.

use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use std::fmt;

// ============================================================================
// Record Models
// ============================================================================

/// One line item from a purchase or sales register.
///
/// Built once at ingestion and never mutated by the engine. Amounts may be
/// negative or zero; the engine treats them as ordinary numbers.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FinancialRecord {
    pub id: String,
    pub gstin: String,
    pub party_name: String,
    pub invoice_no: String,
    pub invoice_date: Option<String>,
    pub taxable_amount: Decimal,
    pub igst: Decimal,
    pub cgst: Decimal,
    pub sgst: Decimal,
    pub total_amount: Decimal,
    /// Original row as received, kept for traceability.
    #[serde(skip_serializing_if = "serde_json::Value::is_null")]
    pub raw: serde_json::Value,
}

/// Which register a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Dataset {
    Purchase,
    Sales,
}

impl Dataset {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Purchase => "purchase",
            Self::Sales => "sales",
        }
    }
}

/// Canonical invoice identity shared by a purchase and a sales record.
///
/// Compared field by field, so a `|` inside an invoice number cannot make two
/// different (invoice, date) pairs collide. Renders as `INVOICE|DATE`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct MatchKey {
    pub invoice_no: String,
    pub invoice_date: String,
}

impl fmt::Display for MatchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.invoice_no, self.invoice_date)
    }
}

impl Serialize for MatchKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ============================================================================
// Mismatch Models
// ============================================================================

/// Fields compared by the discrepancy detector, in reporting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MismatchField {
    #[serde(rename = "GSTIN")]
    Gstin,
    #[serde(rename = "Party Name")]
    PartyName,
    #[serde(rename = "Taxable Amount")]
    TaxableAmount,
    #[serde(rename = "IGST")]
    Igst,
    #[serde(rename = "CGST")]
    Cgst,
    #[serde(rename = "SGST")]
    Sgst,
    #[serde(rename = "Total Amount")]
    TotalAmount,
}

impl MismatchField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gstin => "GSTIN",
            Self::PartyName => "Party Name",
            Self::TaxableAmount => "Taxable Amount",
            Self::Igst => "IGST",
            Self::Cgst => "CGST",
            Self::Sgst => "SGST",
            Self::TotalAmount => "Total Amount",
        }
    }
}

impl fmt::Display for MismatchField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value as it appeared on one side of a mismatch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Amount(Decimal),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MismatchReason {
    pub field: MismatchField,
    pub purchase_value: FieldValue,
    pub sales_value: FieldValue,
    /// Purchase minus sales. Only set for amount fields.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difference: Option<Decimal>,
}

// ============================================================================
// Result Models
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconciliationStatus {
    Matched,
    Mismatched,
    MissingInPurchase,
    MissingInSales,
}

/// Display category for a status badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeVariant {
    Success,
    Destructive,
    Warning,
}

impl ReconciliationStatus {
    pub const ALL: [ReconciliationStatus; 4] = [
        Self::Matched,
        Self::Mismatched,
        Self::MissingInPurchase,
        Self::MissingInSales,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Matched => "matched",
            Self::Mismatched => "mismatched",
            Self::MissingInPurchase => "missing_in_purchase",
            Self::MissingInSales => "missing_in_sales",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Matched => "Matched",
            Self::Mismatched => "Mismatched",
            Self::MissingInPurchase => "Missing in Purchase",
            Self::MissingInSales => "Missing in Sales",
        }
    }

    pub fn badge(&self) -> BadgeVariant {
        match self {
            Self::Matched => BadgeVariant::Success,
            Self::Mismatched => BadgeVariant::Destructive,
            Self::MissingInPurchase | Self::MissingInSales => BadgeVariant::Warning,
        }
    }
}

/// Outcome for one distinct match key.
///
/// Records are borrowed from the caller's collections. Both are present for
/// `Matched` and `Mismatched`; exactly one is present for the `Missing*` statuses.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconciliationResult<'a> {
    pub id: String,
    pub status: ReconciliationStatus,
    pub purchase_record: Option<&'a FinancialRecord>,
    pub sales_record: Option<&'a FinancialRecord>,
    pub match_key: MatchKey,
    pub mismatches: Vec<MismatchReason>,
    /// Signed total-amount gap: positive when purchase exceeds sales.
    pub total_difference: Decimal,
}

/// A key that appeared more than once in one dataset. Only the last record
/// with the key takes part in matching.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateKey {
    pub dataset: Dataset,
    pub match_key: MatchKey,
    pub kept_record_id: String,
    pub discarded_record_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReconciliationSummary {
    pub total_records: usize,
    pub matched: usize,
    pub mismatched: usize,
    pub missing_in_purchase: usize,
    pub missing_in_sales: usize,
    pub match_percentage: u32,
    pub total_difference_amount: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_labels_and_badges() {
        let table: Vec<_> = ReconciliationStatus::ALL
            .iter()
            .map(|s| (s.as_str(), s.label(), s.badge()))
            .collect();

        assert_eq!(
            table,
            vec![
                ("matched", "Matched", BadgeVariant::Success),
                ("mismatched", "Mismatched", BadgeVariant::Destructive),
                (
                    "missing_in_purchase",
                    "Missing in Purchase",
                    BadgeVariant::Warning
                ),
                ("missing_in_sales", "Missing in Sales", BadgeVariant::Warning),
            ]
        );
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_value(ReconciliationStatus::MissingInPurchase).unwrap();
        assert_eq!(json, "missing_in_purchase");
    }

    #[test]
    fn test_match_key_renders_with_separator() {
        let key = MatchKey {
            invoice_no: "INV-1".to_string(),
            invoice_date: "2024-01-05".to_string(),
        };
        assert_eq!(key.to_string(), "INV-1|2024-01-05");
        assert_eq!(serde_json::to_value(&key).unwrap(), "INV-1|2024-01-05");
        assert_eq!(MatchKey::default().to_string(), "|");
    }

    #[test]
    fn test_mismatch_reason_serialization() {
        let reason = MismatchReason {
            field: MismatchField::TotalAmount,
            purchase_value: FieldValue::Amount(Decimal::new(11801, 2)),
            sales_value: FieldValue::Amount(Decimal::new(11700, 2)),
            difference: Some(Decimal::new(101, 2)),
        };
        let json = serde_json::to_value(&reason).unwrap();
        assert_eq!(json["field"], "Total Amount");
        assert_eq!(json["difference"], "1.01");

        let text = MismatchReason {
            field: MismatchField::PartyName,
            purchase_value: FieldValue::Text("Acme".to_string()),
            sales_value: FieldValue::Text("Globex".to_string()),
            difference: None,
        };
        let json = serde_json::to_value(&text).unwrap();
        assert_eq!(json["purchase_value"], "Acme");
        assert!(json.get("difference").is_none());
    }
}
