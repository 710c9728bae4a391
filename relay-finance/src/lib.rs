//! relay-finance: expense normalizer, report aggregator, ledger transaction mapper and tool operations

pub mod aggregator;
pub mod normalizer;
pub mod tools;
pub mod transactions;

pub use aggregator::{aggregate, report_from_attachment, SourceInfo, Totals};
pub use normalizer::{parse_amount, to_minor_units, Normalizer, RowContext};
pub use tools::{get_report, get_transactions, list_reports, ToolError};
pub use transactions::{import_id, map_expense, map_report, to_milliunits, TransactionBatch};
