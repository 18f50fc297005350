use serde::{Deserialize, Serialize};

use crate::sheet::Sheet;
use crate::text::normalize;

/// An ordered collection of named sheets, immutable once decoded.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Workbook {
    sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new() -> Self {
        Self { sheets: Vec::new() }
    }

    pub fn from_sheets(sheets: Vec<Sheet>) -> Self {
        Self { sheets }
    }

    pub fn add_sheet(&mut self, sheet: Sheet) {
        self.sheets.push(sheet);
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn first_sheet(&self) -> Option<&Sheet> {
        self.sheets.first()
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    /// Find a sheet by expected name: exact normalized match first, then the
    /// first sheet whose normalized name contains the expected one.
    pub fn find_sheet(&self, expected: &str) -> Option<&Sheet> {
        let wanted = normalize(expected);
        if wanted.is_empty() {
            return None;
        }
        self.sheets
            .iter()
            .find(|s| normalize(&s.name) == wanted)
            .or_else(|| self.sheets.iter().find(|s| normalize(&s.name).contains(&wanted)))
    }

    /// Try each candidate name in order.
    pub fn find_sheet_any<S: AsRef<str>>(&self, candidates: &[S]) -> Option<&Sheet> {
        candidates.iter().find_map(|c| self.find_sheet(c.as_ref()))
    }
}
