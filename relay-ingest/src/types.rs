use serde::{Deserialize, Serialize};

/// Canonical fields an export column can be resolved to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    Date,
    Merchant,
    Amount,
    Currency,
    Category,
    ReportId,
    ExpenseId,
    Description,
    Tag,
    ReportName,
    Reimbursable,
    Billable,
    ReceiptUrl,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 13] = [
        CanonicalField::Date,
        CanonicalField::Merchant,
        CanonicalField::Amount,
        CanonicalField::Currency,
        CanonicalField::Category,
        CanonicalField::ReportId,
        CanonicalField::ExpenseId,
        CanonicalField::Description,
        CanonicalField::Tag,
        CanonicalField::ReportName,
        CanonicalField::Reimbursable,
        CanonicalField::Billable,
        CanonicalField::ReceiptUrl,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            CanonicalField::Date => "date",
            CanonicalField::Merchant => "merchant",
            CanonicalField::Amount => "amount",
            CanonicalField::Currency => "currency",
            CanonicalField::Category => "category",
            CanonicalField::ReportId => "report_id",
            CanonicalField::ExpenseId => "expense_id",
            CanonicalField::Description => "description",
            CanonicalField::Tag => "tag",
            CanonicalField::ReportName => "report_name",
            CanonicalField::Reimbursable => "reimbursable",
            CanonicalField::Billable => "billable",
            CanonicalField::ReceiptUrl => "receipt_url",
        }
    }
}

/// Raw values resolved per canonical field; `None` when no header matched.
///
/// Values are trimmed and never blank.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSet {
    pub date: Option<String>,
    pub merchant: Option<String>,
    pub amount: Option<String>,
    pub currency: Option<String>,
    pub category: Option<String>,
    pub report_id: Option<String>,
    pub expense_id: Option<String>,
    pub description: Option<String>,
    pub tag: Option<String>,
    pub report_name: Option<String>,
    pub reimbursable: Option<String>,
    pub billable: Option<String>,
    pub receipt_url: Option<String>,
}

impl FieldSet {
    pub fn get(&self, field: CanonicalField) -> Option<&str> {
        self.slot(field).as_deref()
    }

    /// Set a field; blank values clear it.
    pub fn set(&mut self, field: CanonicalField, value: &str) {
        let value = value.trim();
        *self.slot_mut(field) = if value.is_empty() {
            None
        } else {
            Some(value.to_string())
        };
    }

    pub fn with(mut self, field: CanonicalField, value: &str) -> Self {
        self.set(field, value);
        self
    }

    fn slot(&self, field: CanonicalField) -> &Option<String> {
        match field {
            CanonicalField::Date => &self.date,
            CanonicalField::Merchant => &self.merchant,
            CanonicalField::Amount => &self.amount,
            CanonicalField::Currency => &self.currency,
            CanonicalField::Category => &self.category,
            CanonicalField::ReportId => &self.report_id,
            CanonicalField::ExpenseId => &self.expense_id,
            CanonicalField::Description => &self.description,
            CanonicalField::Tag => &self.tag,
            CanonicalField::ReportName => &self.report_name,
            CanonicalField::Reimbursable => &self.reimbursable,
            CanonicalField::Billable => &self.billable,
            CanonicalField::ReceiptUrl => &self.receipt_url,
        }
    }

    fn slot_mut(&mut self, field: CanonicalField) -> &mut Option<String> {
        match field {
            CanonicalField::Date => &mut self.date,
            CanonicalField::Merchant => &mut self.merchant,
            CanonicalField::Amount => &mut self.amount,
            CanonicalField::Currency => &mut self.currency,
            CanonicalField::Category => &mut self.category,
            CanonicalField::ReportId => &mut self.report_id,
            CanonicalField::ExpenseId => &mut self.expense_id,
            CanonicalField::Description => &mut self.description,
            CanonicalField::Tag => &mut self.tag,
            CanonicalField::ReportName => &mut self.report_name,
            CanonicalField::Reimbursable => &mut self.reimbursable,
            CanonicalField::Billable => &mut self.billable,
            CanonicalField::ReceiptUrl => &mut self.receipt_url,
        }
    }
}
