//! Target-ledger transaction shape

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Longest import id the ledger accepts
pub const IMPORT_ID_MAX_LEN: usize = 36;

/// A transaction ready for the ledger's create-transactions endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Transaction {
    pub account_id: String,
    pub date: NaiveDate,
    /// Signed, 1/1000 of the major currency unit
    pub amount_milliunits: i64,
    pub payee_name: String,
    pub memo: String,
    /// Deterministic de-duplication key
    pub import_id: String,
    pub cleared: bool,
    pub approved: bool,
    /// Id of the expense this transaction was built from
    pub expense_id: String,
}

