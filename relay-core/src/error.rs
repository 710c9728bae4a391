//! Error taxonomy shared by every relay crate.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Request-level failures. These abort a single tool call.
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("unsupported currency: {0}")]
    UnsupportedCurrency(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RelayError>;

/// Why a single row or record was excluded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RowError {
    #[error("missing {0}")]
    MissingField(&'static str),

    #[error("unparseable date '{0}'")]
    InvalidDate(String),

    #[error("unparseable amount '{0}'")]
    InvalidAmount(String),

    #[error("amount '{value}' has more than {scale} decimal places for {currency}")]
    ExcessPrecision {
        value: String,
        currency: String,
        scale: u32,
    },

    #[error("malformed row: {0}")]
    Malformed(String),

    #[error("unsupported currency '{0}'")]
    UnsupportedCurrency(String),

    #[error("amount {0} overflows milliunits")]
    AmountOverflow(i64),
}

impl RowError {
    pub fn kind(&self) -> DiagnosticKind {
        match self {
            RowError::MissingField(_) => DiagnosticKind::MissingField,
            RowError::InvalidDate(_) => DiagnosticKind::InvalidDate,
            RowError::InvalidAmount(_) | RowError::ExcessPrecision { .. } => {
                DiagnosticKind::InvalidAmount
            }
            RowError::Malformed(_) => DiagnosticKind::MalformedRow,
            RowError::UnsupportedCurrency(_) => DiagnosticKind::UnsupportedCurrency,
            RowError::AmountOverflow(_) => DiagnosticKind::AmountOverflow,
        }
    }
}

impl From<RowError> for RelayError {
    fn from(err: RowError) -> Self {
        match err {
            RowError::UnsupportedCurrency(code) => RelayError::UnsupportedCurrency(code),
            other => RelayError::InvalidInput(other.to_string()),
        }
    }
}

/// Machine-readable class of a [`Diagnostic`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    MissingField,
    InvalidDate,
    InvalidAmount,
    MalformedRow,
    UnsupportedCurrency,
    AmountOverflow,
}

/// A non-fatal note identifying a row that could not be used.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Diagnostic {
    /// 1-based position of the data row in the export
    pub ordinal: usize,
    pub kind: DiagnosticKind,
    pub reason: String,
}

impl Diagnostic {
    pub fn new(ordinal: usize, err: &RowError) -> Self {
        Self {
            ordinal,
            kind: err.kind(),
            reason: err.to_string(),
        }
    }
}
