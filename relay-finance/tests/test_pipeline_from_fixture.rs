use chrono::NaiveDate;
use relay_core::{DiagnosticKind, PipelineConfig, SignConvention};
use relay_finance::tools::{get_report, get_transactions};
use relay_ingest::MemorySource;
use std::path::PathBuf;

fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .join("fixtures")
        .join("expense_report.csv")
}

fn source() -> MemorySource {
    let bytes = std::fs::read(fixture_path()).expect("fixture export should exist");
    MemorySource::new().with_export(
        "fixture",
        "expense_report.csv",
        NaiveDate::from_ymd_opt(2024, 1, 20),
        bytes,
    )
}

/// Real-template regression: positive line items are treated as outflows,
/// broken rows end up in diagnostics.
#[test]
fn test_report_from_fixture() {
    let resp = get_report(&source(), None, &PipelineConfig::default()).unwrap();
    let report = resp.report;

    assert_eq!(report.source_id, "fixture");
    assert_eq!(report.summary.sign_convention, SignConvention::Invert);
    assert_eq!(report.expenses.len(), 5);

    let coffee = &report.expenses[0];
    assert_eq!(coffee.merchant, "Blue Bottle Coffee");
    assert_eq!(coffee.amount_minor, -450);
    assert_eq!(coffee.date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
    assert_eq!(coffee.category, "Meals");
    assert_eq!(coffee.tag.as_deref(), Some("Client A"));
    assert_eq!(coffee.description.as_deref(), Some("team standup"));
    assert!(coffee.reimbursable);
    assert_eq!(coffee.receipt_url.as_deref(), Some("https://example.com/r/1"));
    assert_eq!(coffee.id, "fixture:1");

    let license = &report.expenses[1];
    assert_eq!(license.merchant, "Smith, Jones & Co");
    assert_eq!(license.amount_minor, -125_000);

    let refund = report
        .expenses
        .iter()
        .find(|e| e.merchant == "Delta Air Lines")
        .unwrap();
    assert_eq!(refund.amount_minor, 4500);
    assert!(refund.is_credit());

    let paris = report.expenses.iter().find(|e| e.currency == "EUR").unwrap();
    assert_eq!(paris.description.as_deref(), Some("lunch, Paris"));

    assert_eq!(report.total_minor, -125_970);
    assert_eq!(
        report.total_minor,
        report.expenses.iter().map(|e| e.amount_minor).sum::<i64>()
    );
    assert_eq!(report.by_category.values().sum::<i64>(), report.total_minor);
    assert_eq!(report.by_category["Travel"], 680);
    assert_eq!(report.summary.currencies, vec!["EUR".to_string(), "USD".to_string()]);

    let skipped: Vec<_> = report
        .diagnostics
        .iter()
        .map(|d| (d.ordinal, d.kind))
        .collect();
    assert_eq!(
        skipped,
        vec![
            (4, DiagnosticKind::MissingField),
            (7, DiagnosticKind::InvalidDate)
        ]
    );
}

#[test]
fn test_transactions_from_fixture_are_idempotent() {
    let config = PipelineConfig::default();
    let first = get_transactions(&source(), "acct-42", None, &config).unwrap();
    let second = get_transactions(&source(), "acct-42", None, &config).unwrap();

    assert_eq!(first.transactions.len(), 5);
    assert_eq!(first.transactions, second.transactions);

    for txn in &first.transactions {
        assert!(txn.import_id.len() <= 36, "{} too long", txn.import_id);
        assert!(!txn.cleared);
        assert!(!txn.approved);
        assert_eq!(txn.account_id, "acct-42");
    }

    let coffee = &first.transactions[0];
    assert_eq!(coffee.amount_milliunits, -4500);
    assert_eq!(coffee.payee_name, "Blue Bottle Coffee");
    assert_eq!(coffee.memo, "Meals | team standup");

    let mut ids: Vec<_> = first.transactions.iter().map(|t| &t.import_id).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), first.transactions.len());

    assert_eq!(first.diagnostics.len(), 2);
}

#[test]
fn test_transactions_payload_shape() {
    let resp = get_transactions(&source(), "acct-42", None, &PipelineConfig::default()).unwrap();
    let json = serde_json::to_value(&resp).unwrap();

    let txn = &json["transactions"][0];
    assert_eq!(txn["date"], "2024-01-15");
    assert_eq!(txn["amount_milliunits"], -4500);
    assert_eq!(txn["cleared"], false);
    assert_eq!(json["diagnostics"][0]["kind"], "missing_field");
    assert!(json.get("warning").is_none());
}

/// Split expenses carry the same expense id, date and amount; each must still
/// reach the ledger as its own transaction.
#[test]
fn test_split_expenses_get_distinct_import_ids() {
    let bytes = b"Transaction ID,Date,Merchant,Amount\n\
T1,2024-01-02,Split A,-10.00\n\
T1,2024-01-02,Split B,-10.00\n"
        .to_vec();
    let source = MemorySource::new().with_export("m", "split.csv", None, bytes);

    let resp = get_transactions(&source, "acct-42", None, &PipelineConfig::default()).unwrap();
    assert_eq!(resp.transactions.len(), 2);

    let (a, b) = (&resp.transactions[0], &resp.transactions[1]);
    assert_eq!(a.expense_id, "m:T1");
    assert_eq!(b.expense_id, "m:T1:2");
    assert_eq!(a.amount_milliunits, b.amount_milliunits);
    assert_ne!(a.import_id, b.import_id);
}
