use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::cell::CellValue;

/// A dense row-major view of a sheet: `matrix[row][col]`.
pub type Matrix = Vec<Vec<CellValue>>;

/// A sparse grid of decoded cell values. Blank cells are never stored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Sheet {
    pub name: String,
    cells: FxHashMap<(usize, usize), CellValue>,
    rows: usize,
    cols: usize,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cells: FxHashMap::default(),
            rows: 0,
            cols: 0,
        }
    }

    /// Store a value. Blank values clear the cell.
    pub fn set(&mut self, row: usize, col: usize, value: CellValue) {
        if value.is_blank() {
            self.cells.remove(&(row, col));
            return;
        }
        self.rows = self.rows.max(row + 1);
        self.cols = self.cols.max(col + 1);
        self.cells.insert((row, col), value);
    }

    /// Store raw text input, classifying numbers.
    pub fn set_value(&mut self, row: usize, col: usize, value: &str) {
        self.set(row, col, CellValue::from_input(value));
    }

    /// Cell at a zero-based position. `None` means absent or blank.
    pub fn get(&self, row: usize, col: usize) -> Option<&CellValue> {
        self.cells.get(&(row, col)).filter(|v| !v.is_blank())
    }

    /// Cell at an A1-style address (`"B3"`). Invalid addresses read as absent.
    pub fn get_a1(&self, address: &str) -> Option<&CellValue> {
        let (row, col) = parse_cell_ref(address)?;
        self.get(row, col)
    }

    /// Number of rows up to and including the last populated one.
    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn col_count(&self) -> usize {
        self.cols
    }

    /// Count of non-blank cells.
    pub fn filled_count(&self) -> usize {
        self.cells.values().filter(|v| !v.is_blank()).count()
    }

    /// Populated cells in row-major order.
    pub fn cells_sorted(&self) -> Vec<((usize, usize), &CellValue)> {
        let mut cells: Vec<_> = self.cells.iter().map(|(k, v)| (*k, v)).collect();
        cells.sort_by_key(|(pos, _)| *pos);
        cells
    }

    /// Dense copy of the used range, padded with `Empty`.
    pub fn matrix(&self) -> Matrix {
        let mut matrix = vec![vec![CellValue::Empty; self.cols]; self.rows];
        for (&(row, col), value) in &self.cells {
            matrix[row][col] = value.clone();
        }
        matrix
    }

    /// True if any cell's normalized text contains the normalized label.
    pub fn contains_label(&self, label: &str) -> bool {
        let needle = crate::text::normalize(label);
        self.cells.values().any(|v| v.normalized().contains(&needle))
    }
}

/// Parse an A1 reference into zero-based `(row, col)`.
pub fn parse_cell_ref(s: &str) -> Option<(usize, usize)> {
    let s = s.trim().to_uppercase();
    let mut col_str = String::new();
    let mut row_str = String::new();

    for c in s.chars() {
        if c.is_ascii_alphabetic() && row_str.is_empty() {
            col_str.push(c);
        } else if c.is_ascii_digit() {
            row_str.push(c);
        } else {
            return None;
        }
    }

    if col_str.is_empty() || row_str.is_empty() || col_str.len() > 3 {
        return None;
    }

    // A=0, B=1, ..., Z=25, AA=26, ...
    let mut col: usize = 0;
    for c in col_str.chars() {
        col = col * 26 + (c as usize - 'A' as usize + 1);
    }
    col -= 1;

    let row: usize = row_str.parse().ok()?;
    if row == 0 {
        return None;
    }

    Some((row - 1, col))
}

/// Column letters for a zero-based index (0 is `A`, 26 is `AA`).
pub fn col_to_letters(mut col: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push((b'A' + (col % 26) as u8) as char);
        if col < 26 {
            break;
        }
        col = col / 26 - 1;
    }
    letters.iter().rev().collect()
}

/// A1 address for a zero-based position.
pub fn cell_address(row: usize, col: usize) -> String {
    format!("{}{}", col_to_letters(col), row + 1)
}
