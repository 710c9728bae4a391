//! Pipeline configuration: date formats, currency scales, sign handling, memo style.

use serde::{Deserialize, Serialize};

use crate::currency::CurrencyTable;

/// Date formats of the common expense-export templates, tried in order.
pub const DEFAULT_DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%m/%d/%Y",
    "%m/%d/%y",
    "%d/%m/%Y",
    "%d/%m/%y",
    "%Y-%m-%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%B %d, %Y",
    "%b %d, %Y",
];

pub const DEFAULT_CURRENCY: &str = "USD";

/// How the normalizer should interpret the sign of source amounts
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SignPolicy {
    /// Source amounts are already outflow-negative
    Preserve,
    /// Source lists outflows as positive numbers
    Invert,
    /// Decide per export from the balance of positive and negative amounts
    #[default]
    Auto,
}

impl SignPolicy {
    /// Resolve to a concrete convention given an export's parsed amount signs.
    ///
    /// `Auto` inverts when strictly more non-zero amounts are positive than
    /// negative (expense exports list spend as positive line items).
    pub fn resolve(self, positives: usize, negatives: usize) -> SignConvention {
        match self {
            SignPolicy::Preserve => SignConvention::Preserve,
            SignPolicy::Invert => SignConvention::Invert,
            SignPolicy::Auto if positives > negatives => SignConvention::Invert,
            SignPolicy::Auto => SignConvention::Preserve,
        }
    }
}

/// The sign handling actually applied to one export
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SignConvention {
    Preserve,
    Invert,
}

impl SignConvention {
    pub fn apply(self, amount_minor: i64) -> i64 {
        match self {
            SignConvention::Preserve => amount_minor,
            SignConvention::Invert => -amount_minor,
        }
    }
}

/// Normalizer settings; defaults match the observed export template
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NormalizerConfig {
    pub date_formats: Vec<String>,
    pub default_currency: String,
    pub sign_policy: SignPolicy,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            date_formats: DEFAULT_DATE_FORMATS.iter().map(|f| f.to_string()).collect(),
            default_currency: DEFAULT_CURRENCY.to_string(),
            sign_policy: SignPolicy::default(),
        }
    }
}

/// What goes into a transaction's memo
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum MemoStyle {
    Category,
    Merchant,
    /// Category, then the row's comment when there is one
    #[default]
    Detailed,
}

impl std::str::FromStr for MemoStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "category" => Ok(MemoStyle::Category),
            "merchant" => Ok(MemoStyle::Merchant),
            "detailed" => Ok(MemoStyle::Detailed),
            other => Err(format!(
                "unknown memo style '{other}' (expected category, merchant or detailed)"
            )),
        }
    }
}

/// Everything one pipeline invocation needs
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineConfig {
    pub normalizer: NormalizerConfig,
    pub currencies: CurrencyTable,
    pub memo_style: MemoStyle,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_policy_resolution() {
        assert_eq!(SignPolicy::Auto.resolve(5, 1), SignConvention::Invert);
        assert_eq!(SignPolicy::Auto.resolve(1, 1), SignConvention::Preserve);
        assert_eq!(SignPolicy::Auto.resolve(0, 3), SignConvention::Preserve);
        assert_eq!(SignPolicy::Preserve.resolve(9, 0), SignConvention::Preserve);
        assert_eq!(SignPolicy::Invert.resolve(0, 9), SignConvention::Invert);
    }

    #[test]
    fn test_normalizer_config_partial_deserialize() {
        let cfg: NormalizerConfig =
            serde_json::from_str(r#"{"default_currency":"EUR","sign_policy":"invert"}"#).unwrap();
        assert_eq!(cfg.default_currency, "EUR");
        assert_eq!(cfg.sign_policy, SignPolicy::Invert);
        assert_eq!(cfg.date_formats.len(), DEFAULT_DATE_FORMATS.len());
    }

    #[test]
    fn test_memo_style_from_str() {
        assert_eq!("Merchant".parse::<MemoStyle>(), Ok(MemoStyle::Merchant));
        assert!("emoji".parse::<MemoStyle>().is_err());
    }
}
