//! Header-row discovery for loosely structured tables.
//!
//! Submitted templates shift their tables between years, so nothing here
//! depends on fixed positions: a header row is the first row (within a scan
//! window) in which every required token appears inside some cell, and each
//! column is the first header cell matching its [`ColumnRule`]. All matching
//! is done on [`normalize`]d text.

use crate::cell::CellValue;
use crate::text::normalize;

/// Default number of leading rows scanned for a header.
pub const DEFAULT_SCAN_ROWS: usize = 120;

/// Where a table header was found, with its normalized labels.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderLocation {
    pub row: usize,
    pub labels: Vec<String>,
}

/// How a column label is recognized inside a header row.
#[derive(Debug, Clone, Copy)]
pub enum ColumnRule<'a> {
    /// Label contains the token.
    Contains(&'a str),
    /// Label equals one of the alternatives.
    Exact(&'a [&'a str]),
    /// Label contains every token.
    AllOf(&'a [&'a str]),
    /// Label contains every token and ends with the suffix.
    AllOfEndsWith(&'a [&'a str], &'a str),
}

impl ColumnRule<'_> {
    pub fn matches(&self, label: &str) -> bool {
        match self {
            ColumnRule::Contains(token) => label.contains(&normalize(token)),
            ColumnRule::Exact(options) => options.iter().any(|o| label == normalize(o)),
            ColumnRule::AllOf(tokens) => tokens.iter().all(|t| label.contains(&normalize(t))),
            ColumnRule::AllOfEndsWith(tokens, suffix) => {
                tokens.iter().all(|t| label.contains(&normalize(t)))
                    && label.ends_with(&normalize(suffix))
            }
        }
    }
}

impl HeaderLocation {
    /// Index of the first label matching the rule; `None` means the column
    /// is absent and callers must treat its values as missing.
    pub fn column(&self, rule: ColumnRule<'_>) -> Option<usize> {
        self.labels.iter().position(|label| rule.matches(label))
    }
}

fn normalized_row(row: &[CellValue]) -> Vec<String> {
    row.iter().map(CellValue::normalized).collect()
}

/// First row within `scan_rows` that contains every required token.
///
/// The token order is irrelevant and the first qualifying row wins.
pub fn locate_header(
    matrix: &[Vec<CellValue>],
    required: &[&str],
    scan_rows: usize,
) -> Option<HeaderLocation> {
    let tokens: Vec<String> = required.iter().map(|t| normalize(t)).collect();
    locate_header_by(matrix, scan_rows, |labels| {
        tokens
            .iter()
            .all(|token| labels.iter().any(|label| label.contains(token.as_str())))
    })
}

/// First row within `scan_rows` whose normalized labels satisfy `accept`.
pub fn locate_header_by<F>(
    matrix: &[Vec<CellValue>],
    scan_rows: usize,
    accept: F,
) -> Option<HeaderLocation>
where
    F: Fn(&[String]) -> bool,
{
    matrix
        .iter()
        .take(scan_rows)
        .enumerate()
        .find_map(|(row, cells)| {
            let labels = normalized_row(cells);
            accept(&labels).then_some(HeaderLocation { row, labels })
        })
}
