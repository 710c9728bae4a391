//! Turn resolved export fields into canonical [`Expense`] records.
//!
//! Amounts go through `rust_decimal` and are scaled to minor units with
//! integer arithmetic only. Dates are tried against the configured format
//! list in order; the first format that consumes the whole string wins.

use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use regex::Regex;
use relay_core::{
    CurrencyTable, Expense, NormalizerConfig, RawRow, RowError, SignConvention, UNCATEGORIZED,
    UNKNOWN_MERCHANT,
};
use relay_ingest::FieldSet;
use rust_decimal::Decimal;

const CURRENCY_SYMBOLS: &[char] = &['$', '€', '£', '¥', '₹', '₩'];

fn amount_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?:\d+(?:\.\d+)?|\.\d+)$").expect("invalid amount regex"))
}

/// Per-export facts the normalizer needs besides the row itself
#[derive(Debug, Clone, Copy)]
pub struct RowContext<'a> {
    /// Used as the id prefix when a row carries no report id
    pub source_id: &'a str,
    /// Fallback for rows without a date
    pub received: Option<NaiveDate>,
    pub convention: SignConvention,
}

/// Parse an export amount into a signed decimal.
///
/// Accepts currency symbols, ISO code prefixes/suffixes, grouping
/// separators, a decimal comma, `(12.34)` and trailing-minus negatives.
pub fn parse_amount(raw: &str) -> Result<Decimal, RowError> {
    let invalid = || RowError::InvalidAmount(raw.trim().to_string());

    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    let (mut s, mut negative) = match compact
        .strip_prefix('(')
        .and_then(|v| v.strip_suffix(')'))
    {
        Some(inner) => (inner.to_string(), true),
        None => (compact.clone(), false),
    };

    s.retain(|c| !CURRENCY_SYMBOLS.contains(&c));
    let s = strip_code(&s);

    let s = if let Some(rest) = s.strip_prefix('-') {
        negative = true;
        rest
    } else if let Some(rest) = s.strip_prefix('+') {
        rest
    } else if let Some(rest) = s.strip_suffix('-') {
        negative = true;
        rest
    } else {
        s
    };
    // "USD -4.50" leaves the code in front of the sign
    let s = strip_code(s);
    let s = resolve_separators(s).ok_or_else(invalid)?;

    if !amount_re().is_match(&s) {
        return Err(invalid());
    }
    let digits = if s.starts_with('.') {
        format!("0{s}")
    } else {
        s.to_string()
    };
    let value = Decimal::from_str(&digits).map_err(|_| invalid())?;
    Ok(if negative { -value } else { value })
}

/// Rewrite `s` with `.` as the only decimal mark and no grouping.
///
/// The right-most of `,` and `.` is the decimal mark when both occur. A lone
/// comma followed by one or two digits is a decimal comma (`12,50`);
/// otherwise commas must separate groups of exactly three digits
/// (`1,234`). Anything else is ambiguous and rejected.
fn resolve_separators(s: &str) -> Option<String> {
    match (s.rfind(','), s.rfind('.')) {
        (None, _) => Some(s.to_string()),
        (Some(comma), Some(dot)) if dot > comma => {
            Some(format!("{}{}", ungroup(&s[..dot], ',')?, &s[dot..]))
        }
        (Some(comma), Some(_)) => {
            Some(format!("{}.{}", ungroup(&s[..comma], '.')?, &s[comma + 1..]))
        }
        (Some(comma), None) => {
            let frac = &s[comma + 1..];
            if s.matches(',').count() == 1 && (1..=2).contains(&frac.len()) {
                Some(format!("{}.{}", &s[..comma], frac))
            } else {
                ungroup(s, ',')
            }
        }
    }
}

/// Join `sep`-separated digit groups; every group after the first has three digits.
fn ungroup(s: &str, sep: char) -> Option<String> {
    let mut groups = s.split(sep);
    let mut out = groups.next()?.to_string();
    if out.len() > 3 && s.contains(sep) {
        return None;
    }
    for group in groups {
        if group.len() != 3 {
            return None;
        }
        out.push_str(group);
    }
    Some(out)
}

/// Drop a three-letter currency code from either end.
fn strip_code(s: &str) -> &str {
    let mut s = s;
    let lead = s.chars().take_while(|c| c.is_ascii_alphabetic()).count();
    if lead == 3 {
        s = &s[3..];
    }
    let trail = s.chars().rev().take_while(|c| c.is_ascii_alphabetic()).count();
    if trail == 3 {
        s = &s[..s.len() - 3];
    }
    s
}

/// Scale a decimal to integer minor units without rounding.
pub fn to_minor_units(value: Decimal, currency: &str, scale: u32) -> Result<i64, RowError> {
    let normalized = value.normalize();
    if normalized.scale() > scale {
        return Err(RowError::ExcessPrecision {
            value: value.to_string(),
            currency: currency.to_string(),
            scale,
        });
    }
    let factor = 10i128
        .checked_pow(scale - normalized.scale())
        .ok_or_else(|| RowError::InvalidAmount(value.to_string()))?;
    normalized
        .mantissa()
        .checked_mul(factor)
        .and_then(|v| i64::try_from(v).ok())
        .filter(|v| *v != i64::MIN)
        .ok_or_else(|| RowError::InvalidAmount(value.to_string()))
}

/// Interpret yes/true/1/y (any case) as true.
pub fn parse_flag(raw: Option<&str>) -> bool {
    raw.map(|v| {
        matches!(
            v.trim().to_ascii_lowercase().as_str(),
            "yes" | "true" | "1" | "y"
        )
    })
    .unwrap_or(false)
}

/// Row normalizer bound to one configuration
#[derive(Debug, Clone, Copy)]
pub struct Normalizer<'a> {
    config: &'a NormalizerConfig,
    currencies: &'a CurrencyTable,
}

impl<'a> Normalizer<'a> {
    pub fn new(config: &'a NormalizerConfig, currencies: &'a CurrencyTable) -> Self {
        Self { config, currencies }
    }

    /// Try each configured format in order.
    pub fn parse_date(&self, raw: &str) -> Result<NaiveDate, RowError> {
        let raw = raw.trim();
        for fmt in &self.config.date_formats {
            let parsed = if has_time_component(fmt) {
                NaiveDateTime::parse_from_str(raw, fmt).map(|dt| dt.date())
            } else {
                NaiveDate::parse_from_str(raw, fmt)
            };
            let Ok(date) = parsed else { continue };
            // chrono's %Y also accepts short years; leave those to %y
            if fmt.contains("%Y") && date.year() < 1000 {
                continue;
            }
            return Ok(date);
        }
        Err(RowError::InvalidDate(raw.to_string()))
    }

    /// Row currency, upper-cased, or the configured default.
    pub fn currency(&self, fields: &FieldSet) -> String {
        fields
            .currency
            .as_deref()
            .unwrap_or(&self.config.default_currency)
            .trim()
            .to_ascii_uppercase()
    }

    /// Minor units for a raw amount in `currency`, before any sign convention.
    pub fn amount_minor(&self, raw: &str, currency: &str) -> Result<i64, RowError> {
        let value = parse_amount(raw)?;
        to_minor_units(value, currency, self.currencies.scale_or_default(currency))
    }

    pub fn normalize(
        &self,
        row: &RawRow,
        fields: &FieldSet,
        ctx: &RowContext<'_>,
    ) -> Result<Expense, RowError> {
        let amount_raw = fields
            .amount
            .as_deref()
            .ok_or(RowError::MissingField("amount"))?;
        let currency = self.currency(fields);
        let amount_minor = ctx
            .convention
            .apply(self.amount_minor(amount_raw, &currency)?);

        let date = match fields.date.as_deref() {
            Some(raw) => self.parse_date(raw)?,
            None => ctx.received.ok_or(RowError::MissingField("date"))?,
        };

        let report_id = fields.report_id.clone().unwrap_or_default();
        let prefix = if report_id.is_empty() {
            ctx.source_id
        } else {
            report_id.as_str()
        };
        let id = match fields.expense_id.as_deref() {
            Some(expense_id) => format!("{prefix}:{expense_id}"),
            None => format!("{prefix}:{}", row.ordinal),
        };

        Ok(Expense {
            id,
            ordinal: row.ordinal,
            date,
            merchant: fields
                .merchant
                .clone()
                .unwrap_or_else(|| UNKNOWN_MERCHANT.to_string()),
            amount_minor,
            currency,
            category: fields
                .category
                .clone()
                .unwrap_or_else(|| UNCATEGORIZED.to_string()),
            report_id,
            description: fields.description.clone(),
            tag: fields.tag.clone(),
            report_name: fields.report_name.clone(),
            reimbursable: parse_flag(fields.reimbursable.as_deref()),
            billable: parse_flag(fields.billable.as_deref()),
            receipt_url: fields.receipt_url.clone(),
            raw: row.clone(),
        })
    }
}

fn has_time_component(fmt: &str) -> bool {
    ["%H", "%I", "%M", "%S", "%T", "%R", "%p"]
        .iter()
        .any(|directive| fmt.contains(directive))
}
