use serde::{Deserialize, Serialize};

use crate::text;

/// A decoded cell value.
///
/// The grid only distinguishes numbers from text. Booleans arrive as
/// `TRUE`/`FALSE` text, dates and times as their serial number, and
/// spreadsheet errors as their `#...` text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
}

impl Default for CellValue {
    fn default() -> Self {
        CellValue::Empty
    }
}

impl CellValue {
    /// Build a value from raw text input. Whitespace-only text is `Empty`.
    pub fn from_input(input: &str) -> Self {
        let trimmed = input.trim();

        if trimmed.is_empty() {
            return CellValue::Empty;
        }

        if let Ok(num) = trimmed.parse::<f64>() {
            if num.is_finite() {
                return CellValue::Number(num);
            }
        }

        CellValue::Text(trimmed.to_string())
    }

    pub fn text(s: impl Into<String>) -> Self {
        let s = s.into();
        if s.trim().is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(s)
        }
    }

    /// True for `Empty` and for text that is blank after trimming.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            CellValue::Number(_) => false,
        }
    }

    /// Tolerant numeric view of the value (see [`text::to_number`]).
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) if n.is_finite() => Some(*n),
            CellValue::Number(_) | CellValue::Empty => None,
            CellValue::Text(s) => text::to_number(s),
        }
    }

    /// Minutes since midnight (see [`text::to_minutes`]).
    pub fn as_minutes(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => text::serial_to_minutes(*n),
            CellValue::Text(s) => text::to_minutes(s),
            CellValue::Empty => None,
        }
    }

    /// Normalized uppercase text, accents stripped. Empty for blanks.
    pub fn normalized(&self) -> String {
        text::normalize(&self.raw_display())
    }

    pub fn raw_display(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.trim().to_string(),
            CellValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{}", n)
                }
            }
        }
    }
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.raw_display())
    }
}
