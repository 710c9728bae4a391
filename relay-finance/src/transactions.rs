//! Expense → ledger transaction mapping.

use relay_core::{
    CurrencyTable, Diagnostic, Expense, MemoStyle, Report, RowError, Transaction,
    IMPORT_ID_MAX_LEN,
};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::warn;

const MILLIUNIT_SCALE: u32 = 3;
const PAYEE_MAX_CHARS: usize = 200;
const MEMO_MAX_CHARS: usize = 200;

/// Convert minor units to milliunits using the currency's scale.
///
/// Currencies missing from the table, or finer than 1/1000, are unsupported.
pub fn to_milliunits(
    amount_minor: i64,
    currency: &str,
    currencies: &CurrencyTable,
) -> Result<i64, RowError> {
    let scale = currencies
        .scale(currency)
        .filter(|s| *s <= MILLIUNIT_SCALE)
        .ok_or_else(|| RowError::UnsupportedCurrency(currency.to_string()))?;
    amount_minor
        .checked_mul(10i64.pow(MILLIUNIT_SCALE - scale))
        .ok_or(RowError::AmountOverflow(amount_minor))
}

/// Deterministic de-duplication key for `expense` in `account_id`.
///
/// `RELAY:{milliunits}:{date}:{hash8}`; falls back to `R:{hash34}` when that
/// would exceed the ledger's 36-character limit.
pub fn import_id(account_id: &str, expense: &Expense, amount_milliunits: i64) -> String {
    let date = expense.date.format("%Y-%m-%d").to_string();

    let mut hasher = Sha256::new();
    hasher.update(account_id.as_bytes());
    hasher.update([0u8]);
    hasher.update(expense.id.as_bytes());
    hasher.update([0u8]);
    hasher.update(date.as_bytes());
    hasher.update([0u8]);
    hasher.update(amount_milliunits.to_string().as_bytes());
    let digest = hex::encode(hasher.finalize());

    let id = format!("RELAY:{}:{}:{}", amount_milliunits, date, &digest[..8]);
    if id.len() <= IMPORT_ID_MAX_LEN {
        id
    } else {
        format!("R:{}", &digest[..IMPORT_ID_MAX_LEN - 2])
    }
}

fn memo_for(expense: &Expense, style: MemoStyle) -> String {
    match style {
        MemoStyle::Category => expense.category.clone(),
        MemoStyle::Merchant => expense.merchant.clone(),
        MemoStyle::Detailed => match &expense.description {
            Some(desc) => format!("{} | {}", expense.category, desc),
            None => expense.category.clone(),
        },
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Map one expense to exactly one transaction.
pub fn map_expense(
    expense: &Expense,
    account_id: &str,
    memo_style: MemoStyle,
    currencies: &CurrencyTable,
) -> Result<Transaction, RowError> {
    let amount_milliunits = to_milliunits(expense.amount_minor, &expense.currency, currencies)?;
    Ok(Transaction {
        account_id: account_id.to_string(),
        date: expense.date,
        amount_milliunits,
        payee_name: truncate_chars(&expense.merchant, PAYEE_MAX_CHARS),
        memo: truncate_chars(&memo_for(expense, memo_style), MEMO_MAX_CHARS),
        import_id: import_id(account_id, expense, amount_milliunits),
        cleared: false,
        approved: false,
        expense_id: expense.id.clone(),
    })
}

/// Transactions for a whole report plus the expenses that could not be mapped
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TransactionBatch {
    pub transactions: Vec<Transaction>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Map every expense of `report`; a failing expense does not stop the rest.
pub fn map_report(
    report: &Report,
    account_id: &str,
    memo_style: MemoStyle,
    currencies: &CurrencyTable,
) -> TransactionBatch {
    let mut batch = TransactionBatch::default();
    for expense in &report.expenses {
        match map_expense(expense, account_id, memo_style, currencies) {
            Ok(txn) => batch.transactions.push(txn),
            Err(e) => {
                warn!(expense = %expense.id, reason = %e, "expense not converted");
                batch.diagnostics.push(Diagnostic::new(expense.ordinal, &e));
            }
        }
    }
    batch
}
