//! Canonical expense records and the per-export report built from them

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::SignConvention;
use crate::error::Diagnostic;
use crate::row::RawRow;

pub const UNKNOWN_MERCHANT: &str = "Unknown";
pub const UNCATEGORIZED: &str = "Uncategorized";

/// One normalized line item of an expense export
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Expense {
    /// `report_id` (or source id) + ":" + expense id (or row ordinal)
    pub id: String,
    /// 1-based position of the source row
    pub ordinal: usize,
    pub date: NaiveDate,
    pub merchant: String,
    /// Signed minor units; negative = outflow
    pub amount_minor: i64,
    /// ISO 4217 code, upper case
    pub currency: String,
    pub category: String,
    /// May be empty when the export carries no report identifier
    pub report_id: String,
    pub description: Option<String>,
    pub tag: Option<String>,
    pub report_name: Option<String>,
    pub reimbursable: bool,
    pub billable: bool,
    pub receipt_url: Option<String>,
    /// Original row, kept for diagnostics
    pub raw: RawRow,
}

impl Expense {
    /// Returns true if money left the account (negative amount)
    pub fn is_outflow(&self) -> bool {
        self.amount_minor < 0
    }

    /// Returns true for reimbursements and credits (positive amount)
    pub fn is_credit(&self) -> bool {
        self.amount_minor > 0
    }
}

/// Counts and totals derived from a report's expenses
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportSummary {
    pub count: usize,
    /// Distinct currency codes, sorted
    pub currencies: Vec<String>,
    pub by_currency: BTreeMap<String, i64>,
    /// Sign handling that was applied to the export's amounts
    pub sign_convention: SignConvention,
}

/// All usable rows of a single export plus what was skipped
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Report {
    /// Identifier of the originating export (e.g. message id)
    pub source_id: String,
    /// Attachment name, when the source knows one
    pub name: Option<String>,
    /// Source row order
    pub expenses: Vec<Expense>,
    pub total_minor: i64,
    pub by_category: BTreeMap<String, i64>,
    pub summary: ReportSummary,
    pub diagnostics: Vec<Diagnostic>,
}

impl Report {
    pub fn is_empty(&self) -> bool {
        self.expenses.is_empty()
    }

    /// Caller-facing warning when nothing in the export was usable.
    pub fn warning(&self) -> Option<String> {
        if !self.expenses.is_empty() {
            return None;
        }
        if self.diagnostics.is_empty() {
            Some("export contains no data rows".to_string())
        } else {
            Some(format!(
                "no usable rows: all {} rows were skipped",
                self.diagnostics.len()
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expense(amount_minor: i64) -> Expense {
        Expense {
            id: "r1:1".into(),
            ordinal: 1,
            date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            merchant: "Coffee Shop".into(),
            amount_minor,
            currency: "USD".into(),
            category: "Dining".into(),
            report_id: "r1".into(),
            description: None,
            tag: None,
            report_name: None,
            reimbursable: false,
            billable: false,
            receipt_url: None,
            raw: RawRow::new(1),
        }
    }

    #[test]
    fn test_outflow_and_credit() {
        assert!(expense(-450).is_outflow());
        assert!(!expense(-450).is_credit());
        assert!(expense(1200).is_credit());
    }

    #[test]
    fn test_empty_report_warning() {
        let report = Report {
            source_id: "m1".into(),
            name: None,
            expenses: vec![],
            total_minor: 0,
            by_category: BTreeMap::new(),
            summary: ReportSummary {
                count: 0,
                currencies: vec![],
                by_currency: BTreeMap::new(),
                sign_convention: SignConvention::Preserve,
            },
            diagnostics: vec![],
        };
        assert_eq!(report.warning().as_deref(), Some("export contains no data rows"));
    }
}
