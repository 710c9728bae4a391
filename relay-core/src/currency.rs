//! Minor-unit scales per ISO 4217 currency code.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Scale assumed when a currency has no entry.
pub const DEFAULT_SCALE: u32 = 2;

/// Currencies whose minor unit is not 1/100.
const NON_CENT_CURRENCIES: &[(&str, u32)] = &[
    ("BIF", 0),
    ("CLP", 0),
    ("DJF", 0),
    ("GNF", 0),
    ("ISK", 0),
    ("JPY", 0),
    ("KMF", 0),
    ("KRW", 0),
    ("PYG", 0),
    ("RWF", 0),
    ("UGX", 0),
    ("VND", 0),
    ("VUV", 0),
    ("XAF", 0),
    ("XOF", 0),
    ("XPF", 0),
    ("BHD", 3),
    ("IQD", 3),
    ("JOD", 3),
    ("KWD", 3),
    ("LYD", 3),
    ("OMR", 3),
    ("TND", 3),
];

const CENT_CURRENCIES: &[&str] = &[
    "AED", "ARS", "AUD", "BDT", "BGN", "BRL", "CAD", "CHF", "CNY", "COP", "CZK", "DKK", "EGP",
    "EUR", "GBP", "HKD", "HUF", "IDR", "ILS", "INR", "KES", "MAD", "MXN", "MYR", "NGN", "NOK",
    "NZD", "PEN", "PHP", "PKR", "PLN", "QAR", "RON", "RSD", "SAR", "SEK", "SGD", "THB", "TRY",
    "TWD", "UAH", "USD", "ZAR",
];

/// Lookup table from currency code to the number of minor-unit decimal places.
///
/// Built-in entries can be overridden or extended (e.g. from the `[currencies]`
/// config section).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CurrencyTable {
    scales: BTreeMap<String, u32>,
}

impl Default for CurrencyTable {
    fn default() -> Self {
        let mut scales: BTreeMap<String, u32> = CENT_CURRENCIES
            .iter()
            .map(|code| (code.to_string(), DEFAULT_SCALE))
            .collect();
        for (code, scale) in NON_CENT_CURRENCIES {
            scales.insert(code.to_string(), *scale);
        }
        Self { scales }
    }
}

impl CurrencyTable {
    /// Decimal places for `code`, if known. Codes are matched case-insensitively.
    pub fn scale(&self, code: &str) -> Option<u32> {
        self.scales.get(&code.trim().to_ascii_uppercase()).copied()
    }

    /// Like [`scale`](Self::scale) but falls back to two decimal places.
    pub fn scale_or_default(&self, code: &str) -> u32 {
        self.scale(code).unwrap_or(DEFAULT_SCALE)
    }

    pub fn insert(&mut self, code: impl AsRef<str>, scale: u32) {
        self.scales
            .insert(code.as_ref().trim().to_ascii_uppercase(), scale);
    }

    /// Merge `overrides` over this table; override entries win.
    pub fn with_overrides(mut self, overrides: &BTreeMap<String, u32>) -> Self {
        for (code, scale) in overrides {
            self.insert(code, *scale);
        }
        self
    }
}

/// Format a minor-unit amount as a plain decimal string, e.g. `-450` at scale 2 → `-4.50`.
pub fn format_minor(amount_minor: i64, scale: u32) -> String {
    if scale == 0 {
        return amount_minor.to_string();
    }
    let sign = if amount_minor < 0 { "-" } else { "" };
    let abs = amount_minor.unsigned_abs();
    let divisor = 10u64.pow(scale);
    format!(
        "{}{}.{:0width$}",
        sign,
        abs / divisor,
        abs % divisor,
        width = scale as usize
    )
}
