//! Memo text extraction (`pdftotext`) and field suggestions.
//!
//! Everything here degrades to empty suggestions: a missing tool or an
//! unreadable document is logged and never fails the caller.

use std::path::Path;
use std::process::Command;

use log::{debug, warn};
use modelcheck_validator::MemoFields;
use regex::Regex;

/// Pages read from the memo; the header block is on the first ones.
pub const MAX_PAGES: u32 = 3;

const MEMO_NUMBER: &str = r"(?i)Memorando\s+Nro\.?\s*([A-Z0-9\-]+-M)";
const MEMO_DATE: &str = r"de\s+fecha\s+([0-9]{1,2}\s+de\s+[A-Za-zÁÉÍÓÚáéíóúñÑ]+\s+de\s+20\d{2})";
const SUBJECT: &str = r"(?i)Asunto\s*:\s*([^\n]{10,140})";

/// Run `pdftotext -l 3 <file> -` and capture stdout.
pub fn extract_text(file: &Path) -> Result<String, String> {
    which::which("pdftotext").map_err(|_| "pdftotext not installed (poppler-utils)".to_string())?;

    let output = Command::new("pdftotext")
        .arg("-l")
        .arg(MAX_PAGES.to_string())
        .arg(file)
        .arg("-")
        .output()
        .map_err(|e| format!("failed to run pdftotext: {}", e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!(
            "pdftotext failed (exit {}): {}",
            output.status.code().unwrap_or(-1),
            stderr.trim(),
        ));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Collapse every whitespace run to a single space.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn capture(pattern: &str, text: &str) -> Option<String> {
    let re = Regex::new(pattern).ok()?;
    let found = re.captures(text)?.get(1)?;
    Some(found.as_str().trim().to_string())
}

/// Guess the memo number, date and subject from extracted text.
pub fn guess_fields(text: &str) -> MemoFields {
    let text = collapse_whitespace(text);
    MemoFields {
        memo_nro: capture(MEMO_NUMBER, &text).unwrap_or_default(),
        memo_fecha: capture(MEMO_DATE, &text).unwrap_or_default(),
        asunto: capture(SUBJECT, &text).unwrap_or_default(),
        ..MemoFields::default()
    }
}

/// Extract and guess in one step. Failures yield empty suggestions.
pub fn suggest(file: &Path) -> (Option<String>, MemoFields) {
    match extract_text(file) {
        Ok(text) => {
            let fields = guess_fields(&text);
            debug!(
                "memo '{}': {} chars, number={:?}",
                file.display(),
                text.len(),
                fields.memo_nro
            );
            (Some(text), fields)
        }
        Err(e) => {
            warn!("memo text unavailable for '{}': {}", file.display(), e);
            (None, MemoFields::default())
        }
    }
}
