//! Build a [`Report`] from one export's rows.
//!
//! Row-level problems never fail the report: they are collected as
//! diagnostics, and a report with no usable rows is still a valid (empty)
//! report.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use chrono::NaiveDate;
use relay_core::{
    Diagnostic, Expense, PipelineConfig, RawRow, Report, ReportSummary, Result, RowError,
    SignConvention,
};
use relay_ingest::{map_row, parse_export, Attachment, FieldSet, TextEncoding};
use tracing::{info, warn};

use crate::normalizer::{parse_amount, Normalizer, RowContext};

/// What is known about the export a set of rows came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceInfo {
    pub source_id: String,
    pub name: Option<String>,
    pub received: Option<NaiveDate>,
}

impl SourceInfo {
    pub fn new(source_id: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            name: None,
            received: None,
        }
    }
}

impl From<&Attachment> for SourceInfo {
    fn from(a: &Attachment) -> Self {
        Self {
            source_id: a.source_id.clone(),
            name: Some(a.name.clone()),
            received: a.received,
        }
    }
}

/// Totals folded over a set of expenses
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Totals {
    pub total_minor: i64,
    pub by_category: BTreeMap<String, i64>,
    pub by_currency: BTreeMap<String, i64>,
}

impl Totals {
    /// Fold one expense in. Leaves the totals untouched and returns the
    /// error when any running sum would leave the `i64` range.
    pub fn try_add(&mut self, e: &Expense) -> std::result::Result<(), RowError> {
        let overflow = || RowError::AmountOverflow(e.amount_minor);
        let total = self.total_minor.checked_add(e.amount_minor).ok_or_else(overflow)?;
        let category = self
            .by_category
            .get(&e.category)
            .copied()
            .unwrap_or(0)
            .checked_add(e.amount_minor)
            .ok_or_else(overflow)?;
        let currency = self
            .by_currency
            .get(&e.currency)
            .copied()
            .unwrap_or(0)
            .checked_add(e.amount_minor)
            .ok_or_else(overflow)?;

        self.total_minor = total;
        self.by_category.insert(e.category.clone(), category);
        self.by_currency.insert(e.currency.clone(), currency);
        Ok(())
    }
}

/// Map, normalize and total every row of one export.
pub fn aggregate<I>(rows: I, source: &SourceInfo, config: &PipelineConfig) -> Report
where
    I: IntoIterator<Item = RawRow>,
{
    let normalizer = Normalizer::new(&config.normalizer, &config.currencies);
    let mut diagnostics = Vec::new();

    let mut mapped: Vec<(RawRow, FieldSet)> = Vec::new();
    for row in rows {
        match map_row(&row) {
            Ok(fields) => mapped.push((row, fields)),
            Err(e) => {
                warn!(source = %source.source_id, ordinal = row.ordinal, reason = %e, "skipping row");
                diagnostics.push(Diagnostic::new(row.ordinal, &e));
            }
        }
    }

    let convention = resolve_convention(&mapped, config);
    let ctx = RowContext {
        source_id: &source.source_id,
        received: source.received,
        convention,
    };

    let mut expenses = Vec::with_capacity(mapped.len());
    let mut totals = Totals::default();
    let mut seen_ids = HashSet::new();
    for (row, fields) in &mapped {
        let admitted = normalizer.normalize(row, fields, &ctx).and_then(|expense| {
            totals.try_add(&expense)?;
            Ok(expense)
        });
        match admitted {
            Ok(mut expense) => {
                // split expenses share an expense id; the ordinal keeps them apart
                if !seen_ids.insert(expense.id.clone()) {
                    expense.id = format!("{}:{}", expense.id, expense.ordinal);
                    seen_ids.insert(expense.id.clone());
                }
                expenses.push(expense);
            }
            Err(e) => {
                warn!(source = %source.source_id, ordinal = row.ordinal, reason = %e, "skipping row");
                diagnostics.push(Diagnostic::new(row.ordinal, &e));
            }
        }
    }
    diagnostics.sort_by_key(|d| d.ordinal);

    let Totals {
        total_minor,
        by_category,
        by_currency,
    } = totals;
    let currencies: Vec<String> = expenses
        .iter()
        .map(|e| e.currency.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    info!(
        source = %source.source_id,
        expenses = expenses.len(),
        skipped = diagnostics.len(),
        total_minor,
        ?convention,
        "report aggregated"
    );

    Report {
        source_id: source.source_id.clone(),
        name: source.name.clone(),
        summary: ReportSummary {
            count: expenses.len(),
            currencies,
            by_currency,
            sign_convention: convention,
        },
        expenses,
        total_minor,
        by_category,
        diagnostics,
    }
}

/// Parse an attachment and aggregate it. Fails only when the export itself
/// is unreadable.
pub fn report_from_attachment(
    attachment: &Attachment,
    encoding: TextEncoding,
    config: &PipelineConfig,
) -> Result<Report> {
    let rows = parse_export(&attachment.bytes, encoding)?;
    Ok(aggregate(rows, &SourceInfo::from(attachment), config))
}

/// Count the signs of every parseable amount and let the policy decide.
fn resolve_convention(mapped: &[(RawRow, FieldSet)], config: &PipelineConfig) -> SignConvention {
    let (mut positives, mut negatives) = (0, 0);
    for (_, fields) in mapped {
        let Some(Ok(value)) = fields.amount.as_deref().map(parse_amount) else {
            continue;
        };
        if value.is_zero() {
            continue;
        }
        if value.is_sign_negative() {
            negatives += 1;
        } else {
            positives += 1;
        }
    }
    config.normalizer.sign_policy.resolve(positives, negatives)
}
