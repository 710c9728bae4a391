//! Raw header → cell mapping produced by the export parser.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One data row of an export, keyed by (trimmed) header name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRow {
    /// 1-based position among the export's data rows
    pub ordinal: usize,
    pub cells: BTreeMap<String, String>,
    /// Set when the reader could not decode the underlying record
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl RawRow {
    pub fn new(ordinal: usize) -> Self {
        Self {
            ordinal,
            ..Default::default()
        }
    }

    /// Add a cell. The first value seen for a header is kept.
    pub fn with_cell(mut self, header: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(header, value);
        self
    }

    pub fn insert(&mut self, header: impl Into<String>, value: impl Into<String>) {
        self.cells.entry(header.into()).or_insert_with(|| value.into());
    }

    pub fn get(&self, header: &str) -> Option<&str> {
        self.cells.get(header).map(String::as_str)
    }

    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.cells.keys().map(String::as_str)
    }
}
