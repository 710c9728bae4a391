//! Delimited export parser.
//!
//! Exports arrive with unpredictable shape: optional BOM, leading padding
//! rows, `,`/`;`/tab/`|` delimiters, quoted cells containing delimiters or
//! newlines, and a header row whose column order varies between exports.
//! The parser finds the first non-blank record, treats it as the header and
//! yields every following non-blank record as a [`RawRow`].

use std::io::Cursor;

use relay_core::{RawRow, RelayError, Result};
use tracing::debug;

use crate::encoding::{decode, TextEncoding};

const DELIMITER_CANDIDATES: &[u8] = b",;\t|";

/// Lazy, single-pass sequence of data rows from one export
pub struct ExportRows {
    headers: Vec<String>,
    delimiter: u8,
    records: csv::StringRecordsIntoIter<Cursor<Vec<u8>>>,
    ordinal: usize,
}

impl std::fmt::Debug for ExportRows {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportRows")
            .field("headers", &self.headers)
            .field("delimiter", &(self.delimiter as char))
            .field("ordinal", &self.ordinal)
            .finish()
    }
}

impl ExportRows {
    /// Trimmed header names in column order
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }
}

impl Iterator for ExportRows {
    type Item = RawRow;

    fn next(&mut self) -> Option<RawRow> {
        loop {
            let record = match self.records.next()? {
                Ok(record) => record,
                Err(e) => {
                    self.ordinal += 1;
                    let mut row = RawRow::new(self.ordinal);
                    row.note = Some(e.to_string());
                    return Some(row);
                }
            };

            if is_blank(&record) {
                continue;
            }

            self.ordinal += 1;
            let mut row = RawRow::new(self.ordinal);
            for (header, cell) in self.headers.iter().zip(record.iter()) {
                if header.is_empty() {
                    continue;
                }
                row.insert(header.as_str(), cell);
            }
            return Some(row);
        }
    }
}

/// Decode `bytes` and position a row iterator just after the header row.
///
/// Fails with `MalformedInput` when the bytes do not decode or contain no
/// non-blank record to use as a header.
pub fn parse_export(bytes: &[u8], encoding: TextEncoding) -> Result<ExportRows> {
    let text = decode(bytes, encoding)?;
    parse_text(text)
}

/// Same as [`parse_export`] for already-decoded text.
pub fn parse_text(text: impl Into<String>) -> Result<ExportRows> {
    let text = text.into();
    let delimiter = sniff_delimiter(&text);

    let mut records = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(Cursor::new(text.into_bytes()))
        .into_records();

    let mut headers = None;
    for result in records.by_ref() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                debug!(error = %e, "skipping unreadable record before header");
                continue;
            }
        };
        if is_blank(&record) {
            continue;
        }
        headers = Some(
            record
                .iter()
                .map(|h| h.trim().to_string())
                .collect::<Vec<_>>(),
        );
        break;
    }

    let headers = headers
        .ok_or_else(|| RelayError::MalformedInput("no header row found in export".to_string()))?;

    debug!(
        columns = headers.len(),
        delimiter = %(delimiter as char).escape_default(),
        "export header identified"
    );

    Ok(ExportRows {
        headers,
        delimiter,
        records,
        ordinal: 0,
    })
}

fn is_blank(record: &csv::StringRecord) -> bool {
    record.iter().all(|cell| cell.trim().is_empty())
}

/// Pick the candidate delimiter occurring most often (outside quotes) on the
/// first non-blank line. Ties go to the earlier candidate; none found → `,`.
fn sniff_delimiter(text: &str) -> u8 {
    let Some(line) = text.lines().find(|l| {
        l.bytes()
            .any(|b| !b.is_ascii_whitespace() && !DELIMITER_CANDIDATES.contains(&b))
    }) else {
        return b',';
    };

    let mut counts = [0usize; DELIMITER_CANDIDATES.len()];
    let mut in_quotes = false;
    for b in line.bytes() {
        if b == b'"' {
            in_quotes = !in_quotes;
            continue;
        }
        if in_quotes {
            continue;
        }
        if let Some(i) = DELIMITER_CANDIDATES.iter().position(|&c| c == b) {
            counts[i] += 1;
        }
    }

    let mut best = 0;
    for i in 1..counts.len() {
        if counts[i] > counts[best] {
            best = i;
        }
    }
    if counts[best] == 0 {
        b','
    } else {
        DELIMITER_CANDIDATES[best]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(text: &str) -> Vec<RawRow> {
        parse_text(text).unwrap().collect()
    }

    #[test]
    fn test_basic_rows_keyed_by_header() {
        let rows = rows("Merchant,Amount,Date,Category\nCoffee Shop,-4.50,2024-01-15,Dining\n");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].ordinal, 1);
        assert_eq!(rows[0].get("Merchant"), Some("Coffee Shop"));
        assert_eq!(rows[0].get("Amount"), Some("-4.50"));
    }

    #[test]
    fn test_quoted_delimiter_and_newline() {
        let text = "Merchant,Amount,Comment\n\"Smith, Jones & Co\",\"1,234.00\",\"line one\nline two\"\n";
        let rows = rows(text);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("Merchant"), Some("Smith, Jones & Co"));
        assert_eq!(rows[0].get("Amount"), Some("1,234.00"));
        assert_eq!(rows[0].get("Comment"), Some("line one\nline two"));
    }

    #[test]
    fn test_bom_and_semicolons() {
        let bytes = b"\xEF\xBB\xBFDate;Amount;Merchant\r\n2024-02-01;12,50;Cafe\r\n";
        let parsed = parse_export(bytes, TextEncoding::Auto).unwrap();
        assert_eq!(parsed.delimiter(), b';');
        assert_eq!(parsed.headers(), ["Date", "Amount", "Merchant"]);
        let rows: Vec<_> = parsed.collect();
        assert_eq!(rows[0].get("Amount"), Some("12,50"));
    }

    #[test]
    fn test_trailing_blank_lines_and_padding_skipped() {
        let text = ",,,\n\nDate,Amount\n2024-01-01,1.00\n,\n\n\n";
        let rows = rows(text);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("Date"), Some("2024-01-01"));
    }

    #[test]
    fn test_short_row_forwarded_with_missing_fields() {
        let rows = rows("Merchant,Date,Amount\nTaxi,2024-01-01\nBus,2024-01-02,3.00\n");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("Amount"), None);
        assert_eq!(rows[1].ordinal, 2);
    }

    #[test]
    fn test_empty_input_is_malformed() {
        let err = parse_export(b"", TextEncoding::Auto).unwrap_err();
        assert!(matches!(err, RelayError::MalformedInput(_)));

        let err = parse_export(b"\n\n  \n", TextEncoding::Auto).unwrap_err();
        assert!(matches!(err, RelayError::MalformedInput(_)));
    }

    #[test]
    fn test_header_only_yields_no_rows() {
        assert!(rows("Merchant,Amount,Date\n").is_empty());
    }

    #[test]
    fn test_sniff_prefers_tabs_when_dominant() {
        assert_eq!(sniff_delimiter("Date\tAmount\tMerchant, Inc\n"), b'\t');
        assert_eq!(sniff_delimiter("Amount\n1.00\n"), b',');
    }
}
