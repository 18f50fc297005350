//! `modelcheck-engine` - typed grid model for submitted workbooks.
//!
//! Cells, sheets, and workbooks decoded from a spreadsheet, plus the
//! text-level tools the validators build on: normalization, tolerant
//! number/time parsing, and header-row discovery. No file I/O.

pub mod cell;
pub mod locate;
pub mod sheet;
pub mod text;
pub mod workbook;

pub use cell::CellValue;
pub use locate::{locate_header, ColumnRule, HeaderLocation};
pub use sheet::{Matrix, Sheet};
pub use workbook::Workbook;
