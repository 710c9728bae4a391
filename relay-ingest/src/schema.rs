//! Header synonym table and row → [`FieldSet`] resolution.

use std::collections::HashMap;
use std::sync::OnceLock;

use relay_core::{RawRow, RowError};

use crate::types::{CanonicalField, FieldSet};

/// Known header spellings per canonical field, highest priority first.
/// Entries are lower case with single spaces.
const SYNONYMS: &[(CanonicalField, &[&str])] = &[
    (
        CanonicalField::Date,
        &["timestamp", "date", "created", "transaction date", "expense date"],
    ),
    (
        CanonicalField::Merchant,
        &["merchant", "vendor", "payee", "description"],
    ),
    (
        CanonicalField::Amount,
        &["amount", "total", "expense amount"],
    ),
    (CanonicalField::Currency, &["currency", "original currency"]),
    (
        CanonicalField::Category,
        &["category", "expense category", "gl code"],
    ),
    (CanonicalField::ReportId, &["report id", "report number"]),
    (
        CanonicalField::ExpenseId,
        &["expense id", "transaction id", "id", "reference"],
    ),
    (
        CanonicalField::Description,
        &["comment", "description", "notes", "memo"],
    ),
    (
        CanonicalField::Tag,
        &["tag", "tags", "project", "cost center"],
    ),
    (
        CanonicalField::ReportName,
        &["report name", "report", "report title"],
    ),
    (
        CanonicalField::Reimbursable,
        &["reimbursable", "is reimbursable"],
    ),
    (CanonicalField::Billable, &["billable", "is billable"]),
    (
        CanonicalField::ReceiptUrl,
        &["receipt url", "receipt", "receipt link"],
    ),
];

type HeaderIndex = HashMap<&'static str, Vec<(CanonicalField, usize)>>;

/// normalized header → every (field, priority) it can feed
fn header_index() -> &'static HeaderIndex {
    static INDEX: OnceLock<HeaderIndex> = OnceLock::new();
    INDEX.get_or_init(|| {
        let mut index: HeaderIndex = HashMap::new();
        for (field, names) in SYNONYMS {
            for (priority, name) in names.iter().enumerate() {
                index.entry(*name).or_default().push((*field, priority));
            }
        }
        index
    })
}

/// Lower-case and collapse internal whitespace: `"  Expense\tAmount "` → `"expense amount"`.
pub fn normalize_header(header: &str) -> String {
    header
        .trim_start_matches('\u{feff}')
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Synonyms for `field` in priority order.
pub fn synonyms(field: CanonicalField) -> &'static [&'static str] {
    SYNONYMS
        .iter()
        .find(|(f, _)| *f == field)
        .map(|(_, names)| *names)
        .unwrap_or(&[])
}

/// Every canonical field a header can populate, with its priority.
pub fn lookup_header(header: &str) -> &'static [(CanonicalField, usize)] {
    header_index()
        .get(normalize_header(header).as_str())
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Resolve a row's headers into canonical fields.
///
/// For each field the best-priority header with a non-blank cell wins. Rows
/// without a usable amount are rejected so the caller can record them as
/// skipped.
pub fn map_row(row: &RawRow) -> Result<FieldSet, RowError> {
    if let Some(note) = &row.note {
        return Err(RowError::Malformed(note.clone()));
    }

    let mut best: HashMap<CanonicalField, (usize, &str)> = HashMap::new();
    for (header, value) in &row.cells {
        if value.trim().is_empty() {
            continue;
        }
        for &(field, priority) in lookup_header(header) {
            let better = best
                .get(&field)
                .is_none_or(|&(current, _)| priority < current);
            if better {
                best.insert(field, (priority, value.as_str()));
            }
        }
    }

    let mut fields = FieldSet::default();
    for (field, (_, value)) in best {
        fields.set(field, value);
    }

    if fields.amount.is_none() {
        return Err(RowError::MissingField(CanonicalField::Amount.name()));
    }
    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_and_total_resolve_to_amount() {
        for header in ["Amount", "Total", "  EXPENSE   amount ", "total"] {
            assert!(
                lookup_header(header)
                    .iter()
                    .any(|(f, _)| *f == CanonicalField::Amount),
                "{header} should map to amount"
            );
        }
    }

    #[test]
    fn test_every_synonym_is_normalized() {
        for field in CanonicalField::ALL {
            for name in synonyms(field) {
                assert_eq!(normalize_header(name), *name);
            }
        }
    }

    #[test]
    fn test_amount_preferred_over_total() {
        let row = RawRow::new(1)
            .with_cell("Total", "99.00")
            .with_cell("Amount", "4.50");
        let fields = map_row(&row).unwrap();
        assert_eq!(fields.amount.as_deref(), Some("4.50"));
    }

    #[test]
    fn test_report_header_is_a_title_not_an_id() {
        let row = RawRow::new(1)
            .with_cell("Report", "January Travel")
            .with_cell("Report ID", "R-9")
            .with_cell("Amount", "4.50");
        let fields = map_row(&row).unwrap();
        assert_eq!(fields.report_name.as_deref(), Some("January Travel"));
        assert_eq!(fields.report_id.as_deref(), Some("R-9"));
    }

    #[test]
    fn test_blank_cell_falls_through_to_next_synonym() {
        let row = RawRow::new(1)
            .with_cell("Amount", "  ")
            .with_cell("Total", "12.00");
        assert_eq!(map_row(&row).unwrap().amount.as_deref(), Some("12.00"));
    }

    #[test]
    fn test_description_feeds_merchant_only_as_fallback() {
        let row = RawRow::new(1)
            .with_cell("Merchant", "Uber")
            .with_cell("Description", "airport ride")
            .with_cell("Amount", "30");
        let fields = map_row(&row).unwrap();
        assert_eq!(fields.merchant.as_deref(), Some("Uber"));
        assert_eq!(fields.description.as_deref(), Some("airport ride"));

        let row = RawRow::new(2)
            .with_cell("Description", "Lyft")
            .with_cell("Amount", "30");
        let fields = map_row(&row).unwrap();
        assert_eq!(fields.merchant.as_deref(), Some("Lyft"));
    }

    #[test]
    fn test_missing_amount_is_row_error() {
        let row = RawRow::new(4).with_cell("Merchant", "Taxi");
        assert_eq!(map_row(&row), Err(RowError::MissingField("amount")));
    }

    #[test]
    fn test_malformed_row_reports_note() {
        let mut row = RawRow::new(2);
        row.note = Some("bad record".into());
        assert!(matches!(map_row(&row), Err(RowError::Malformed(_))));
    }

    #[test]
    fn test_unknown_headers_ignored() {
        let row = RawRow::new(1)
            .with_cell("MCC", "5812")
            .with_cell("Amount", "1");
        let fields = map_row(&row).unwrap();
        assert_eq!(fields, FieldSet::default().with(CanonicalField::Amount, "1"));
    }
}
