//! Match key derivation.
//!
//! Two records with the same normalized invoice number and date are treated as
//! the same invoice, whichever register they came from.

use crate::models::{FinancialRecord, MatchKey};
use once_cell::sync::Lazy;
use regex::Regex;

static ISO_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("Failed to compile ISO_DATE"));

static DAY_FIRST_DASHED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{2})-(\d{2})-(\d{4})$").expect("Failed to compile DAY_FIRST_DASHED")
});

static DAY_FIRST_SLASHED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{2})/(\d{2})/(\d{4})$").expect("Failed to compile DAY_FIRST_SLASHED")
});

/// Derive the match key for a record. Never fails; an empty record yields `|`.
pub fn generate_match_key(record: &FinancialRecord) -> MatchKey {
    MatchKey {
        invoice_no: normalize_invoice_no(&record.invoice_no),
        invoice_date: normalize_date(record.invoice_date.as_deref()),
    }
}

/// Uppercase and drop all whitespace, including internal runs.
pub fn normalize_invoice_no(raw: &str) -> String {
    raw.split_whitespace().collect::<String>().to_uppercase()
}

/// Rewrite `DD-MM-YYYY` and `DD/MM/YYYY` to `YYYY-MM-DD`.
///
/// Anything unrecognised is returned trimmed but otherwise untouched, so two
/// unparsed spellings of the same day will not match. Digits are not checked
/// against the calendar.
pub fn normalize_date(raw: Option<&str>) -> String {
    let Some(raw) = raw else {
        return String::new();
    };
    let trimmed = raw.trim();

    if ISO_DATE.is_match(trimmed) {
        return trimmed.to_string();
    }

    let captures = DAY_FIRST_DASHED
        .captures(trimmed)
        .or_else(|| DAY_FIRST_SLASHED.captures(trimmed));

    match captures {
        Some(c) => format!("{}-{}-{}", &c[3], &c[2], &c[1]),
        None => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(invoice_no: &str, invoice_date: Option<&str>) -> FinancialRecord {
        FinancialRecord {
            invoice_no: invoice_no.to_string(),
            invoice_date: invoice_date.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_date_formats_are_equivalent() {
        let iso = generate_match_key(&record("INV-1", Some("2024-01-05")));
        let dashed = generate_match_key(&record("INV-1", Some("05-01-2024")));
        let slashed = generate_match_key(&record("INV-1", Some("05/01/2024")));

        assert_eq!(iso, dashed);
        assert_eq!(iso, slashed);
        assert_eq!(iso.to_string(), "INV-1|2024-01-05");
    }

    #[test]
    fn test_invoice_number_is_uppercased_and_compacted() {
        let key = generate_match_key(&record("  inv - 2024 / 07 ", Some("2024-03-01")));
        assert_eq!(key.invoice_no, "INV-2024/07");
    }

    #[test]
    fn test_unrecognised_date_passes_through_trimmed() {
        assert_eq!(normalize_date(Some("  5 Jan 2024 ")), "5 Jan 2024");
        assert_eq!(normalize_date(Some("2024/01/05")), "2024/01/05");
        // Mixed separators are not a recognised layout.
        assert_eq!(normalize_date(Some("05-01/2024")), "05-01/2024");
        assert_eq!(normalize_date(Some("")), "");
    }

    #[test]
    fn test_absent_date_is_empty_component() {
        let key = generate_match_key(&record("INV-9", None));
        assert_eq!(key.to_string(), "INV-9|");
    }

    #[test]
    fn test_empty_record_key() {
        let key = generate_match_key(&FinancialRecord::default());
        assert_eq!(key.to_string(), "|");
    }

    #[test]
    fn test_key_is_deterministic() {
        let r = record("inv 42", Some("31/12/2023"));
        assert_eq!(generate_match_key(&r), generate_match_key(&r));
    }

    #[test]
    fn test_separator_in_invoice_does_not_collide() {
        // Both render as "A|B|C" but are different invoices.
        let first = generate_match_key(&record("A|B", Some("C")));
        let second = generate_match_key(&record("A", Some("B|C")));
        assert_eq!(first.to_string(), second.to_string());
        assert_ne!(first, second);
    }
}
