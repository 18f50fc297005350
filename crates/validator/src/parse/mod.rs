//! One parser per sheet role. Each turns a row matrix into a typed table
//! or a [`ParseError`](crate::error::ParseError) when the header is absent.

pub mod dimension;
pub mod historical;
pub mod informe;
pub mod reference;
pub mod route;
pub mod validation;

use modelcheck_engine::CellValue;

static EMPTY: CellValue = CellValue::Empty;

/// Cell at `col` in `row`, `Empty` when the column is absent or the row is short.
pub(crate) fn cell(row: &[CellValue], col: Option<usize>) -> &CellValue {
    col.and_then(|c| row.get(c)).unwrap_or(&EMPTY)
}

pub(crate) fn number(row: &[CellValue], col: Option<usize>) -> Option<f64> {
    cell(row, col).as_number()
}

pub(crate) fn minutes(row: &[CellValue], col: Option<usize>) -> Option<f64> {
    cell(row, col).as_minutes()
}

/// Rows from `start` until the key column is blank, at most `max_rows`.
///
/// Yields `(row_index, cells)`.
pub(crate) fn table_rows(
    matrix: &[Vec<CellValue>],
    start: usize,
    max_rows: usize,
    key_col: Option<usize>,
) -> impl Iterator<Item = (usize, &[CellValue])> {
    matrix
        .iter()
        .enumerate()
        .skip(start)
        .take(max_rows)
        .map(|(i, row)| (i, row.as_slice()))
        .take_while(move |(_, row)| !cell(row, key_col).is_blank())
}
