//! relay-core: shared types for the expense-export → ledger pipeline

pub mod config;
pub mod currency;
pub mod error;
pub mod expense;
pub mod row;
pub mod transaction;

pub use config::{MemoStyle, NormalizerConfig, PipelineConfig, SignConvention, SignPolicy};
pub use currency::{format_minor, CurrencyTable};
pub use error::{Diagnostic, DiagnosticKind, RelayError, Result, RowError};
pub use expense::{Expense, Report, ReportSummary, UNCATEGORIZED, UNKNOWN_MERCHANT};
pub use row::RawRow;
pub use transaction::{Transaction, IMPORT_ID_MAX_LEN};
