//! Tool operations exposed to the assistant host.
//!
//! Each call is independent: fetch bytes from the injected source, run the
//! pipeline, return a serializable payload. Nothing is cached between calls.

use relay_core::{Diagnostic, PipelineConfig, RelayError, Report, Result, Transaction};
use relay_ingest::{ExportSource, MessageDescriptor, TextEncoding};
use serde::Serialize;
use tracing::debug;

use crate::aggregator::report_from_attachment;
use crate::transactions::map_report;

pub const DEFAULT_LIST_LIMIT: usize = 10;

#[derive(Debug, Clone, Serialize)]
pub struct ListResponse {
    pub reports: Vec<MessageDescriptor>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportResponse {
    pub report: Report,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransactionsResponse {
    pub account_id: String,
    pub source_id: String,
    pub transactions: Vec<Transaction>,
    /// Skipped rows and unconvertible expenses, by row ordinal
    pub diagnostics: Vec<Diagnostic>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Error payload returned instead of a result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolError {
    pub error: String,
    pub message: String,
}

impl From<&RelayError> for ToolError {
    fn from(err: &RelayError) -> Self {
        let (error, message) = match err {
            RelayError::NotFound(detail) => (
                "Not found",
                format!("{detail}. Check that the expense report email has arrived and carries a CSV attachment."),
            ),
            RelayError::MalformedInput(detail) => (
                "Unreadable export",
                format!("{detail}. The attachment does not look like a delimited expense export."),
            ),
            RelayError::UnsupportedCurrency(code) => (
                "Unsupported currency",
                format!("no minor-unit scale is configured for {code}"),
            ),
            RelayError::InvalidInput(detail) => ("Invalid input", detail.clone()),
            RelayError::Io(e) => ("IO error", e.to_string()),
        };
        Self {
            error: error.to_string(),
            message,
        }
    }
}

/// List the most recent exports, newest first.
pub fn list_reports(source: &impl ExportSource, limit: Option<usize>) -> Result<ListResponse> {
    let limit = limit.unwrap_or(DEFAULT_LIST_LIMIT);
    if limit == 0 {
        return Err(RelayError::InvalidInput(
            "limit must be a positive integer".to_string(),
        ));
    }
    Ok(ListResponse {
        reports: source.list(limit)?,
    })
}

/// Parse one export (default: most recent) into a report with diagnostics.
pub fn get_report(
    source: &impl ExportSource,
    message_id: Option<&str>,
    config: &PipelineConfig,
) -> Result<ReportResponse> {
    let attachment = source.fetch(message_id)?;
    debug!(source = %attachment.source_id, bytes = attachment.bytes.len(), "export fetched");
    let report = report_from_attachment(&attachment, TextEncoding::Auto, config)?;
    Ok(ReportResponse {
        warning: report.warning(),
        report,
    })
}

/// Convert one export (default: most recent) into ledger transactions.
pub fn get_transactions(
    source: &impl ExportSource,
    account_id: &str,
    message_id: Option<&str>,
    config: &PipelineConfig,
) -> Result<TransactionsResponse> {
    let account_id = account_id.trim();
    if account_id.is_empty() {
        return Err(RelayError::InvalidInput("account_id is required".to_string()));
    }

    let ReportResponse { report, warning } = get_report(source, message_id, config)?;
    let batch = map_report(&report, account_id, config.memo_style, &config.currencies);

    let mut diagnostics = report.diagnostics;
    diagnostics.extend(batch.diagnostics);
    diagnostics.sort_by_key(|d| d.ordinal);

    Ok(TransactionsResponse {
        account_id: account_id.to_string(),
        source_id: report.source_id,
        transactions: batch.transactions,
        diagnostics,
        warning,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use relay_ingest::MemorySource;

    fn source() -> MemorySource {
        MemorySource::new()
            .with_export(
                "m2",
                "latest.csv",
                NaiveDate::from_ymd_opt(2024, 2, 1),
                "Merchant,Amount,Date,Category\nCoffee Shop,-4.50,2024-01-15,Dining\nTaxi,,2024-01-16,Travel\n",
            )
            .with_export(
                "m1",
                "older.csv",
                NaiveDate::from_ymd_opt(2024, 1, 1),
                "Merchant,Amount,Date\n",
            )
    }

    #[test]
    fn test_list_defaults_and_rejects_zero() {
        assert_eq!(list_reports(&source(), None).unwrap().reports.len(), 2);
        assert!(matches!(
            list_reports(&source(), Some(0)),
            Err(RelayError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_get_report_latest() {
        let resp = get_report(&source(), None, &PipelineConfig::default()).unwrap();
        assert_eq!(resp.report.source_id, "m2");
        assert_eq!(resp.report.name.as_deref(), Some("latest.csv"));
        assert_eq!(resp.report.expenses.len(), 1);
        assert_eq!(resp.report.diagnostics[0].ordinal, 2);
        assert!(resp.warning.is_none());
    }

    #[test]
    fn test_get_report_empty_export_warns() {
        let resp = get_report(&source(), Some("m1"), &PipelineConfig::default()).unwrap();
        assert!(resp.report.expenses.is_empty());
        assert!(resp.warning.is_some());
    }

    #[test]
    fn test_get_transactions() {
        let resp =
            get_transactions(&source(), "abc123", None, &PipelineConfig::default()).unwrap();
        assert_eq!(resp.account_id, "abc123");
        assert_eq!(resp.transactions.len(), 1);
        assert_eq!(resp.transactions[0].amount_milliunits, -4500);
        assert_eq!(resp.diagnostics.len(), 1);
    }

    #[test]
    fn test_get_transactions_requires_account() {
        let err = get_transactions(&source(), "  ", None, &PipelineConfig::default()).unwrap_err();
        assert!(matches!(err, RelayError::InvalidInput(_)));
    }

    #[test]
    fn test_not_found_error_payload() {
        let err = get_report(&source(), Some("missing"), &PipelineConfig::default()).unwrap_err();
        let payload = ToolError::from(&err);
        assert_eq!(payload.error, "Not found");
        assert!(payload.message.contains("missing"));
    }
}
