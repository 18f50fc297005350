//! Text normalization and tolerant value parsing.
//!
//! Submitted workbooks are typed by hand: labels drift in case and accents,
//! numbers use `1.234,5` locale formatting, and times come either as a
//! fraction of a day or as `HH:MM[:SS]` text. Everything here returns
//! `None` on malformed input instead of failing.

use chrono::{Duration, NaiveDate};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization as _;

const MINUTES_PER_DAY: f64 = 24.0 * 60.0;

/// Trim, strip diacritics, and uppercase.
///
/// `"Validación "` and `"VALIDACION"` normalize to the same string.
pub fn normalize(s: &str) -> String {
    s.trim()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(|c| c.to_uppercase())
        .collect()
}

/// Case/diacritic-insensitive substring test.
pub fn contains_normalized(haystack: &str, needle: &str) -> bool {
    normalize(haystack).contains(&normalize(needle))
}

/// Parse a number written with `.` thousands separators and `,` decimals.
///
/// Dots are always treated as grouping, commas as the decimal mark, and
/// trailing text after the numeric prefix is ignored (`"85 %"` is 85).
pub fn to_number(s: &str) -> Option<f64> {
    let cleaned: String = s
        .trim()
        .chars()
        .filter(|c| *c != '.' && !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    parse_float_prefix(&cleaned)
}

/// Longest `[+-]digits[.digits][e[+-]digits]` prefix, parsed as f64.
fn parse_float_prefix(s: &str) -> Option<f64> {
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        end = frac_end;
    }

    if digits == 0 {
        return None;
    }

    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Minutes since midnight for a spreadsheet day fraction (`0.5` is 720).
pub fn serial_to_minutes(value: f64) -> Option<f64> {
    value.is_finite().then(|| value * MINUTES_PER_DAY)
}

/// Minutes since midnight for `H:MM` or `H:MM:SS` text.
pub fn to_minutes(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() < 2 || parts.len() > 3 {
        return None;
    }

    let field = |part: &str, min_len: usize, max_len: usize| -> Option<u32> {
        if part.len() < min_len || part.len() > max_len || !part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        part.parse().ok()
    };

    let hours = field(parts[0], 1, 2)?;
    let minutes = field(parts[1], 2, 2)?;
    let seconds = match parts.get(2) {
        Some(p) => field(p, 2, 2)?,
        None => 0,
    };

    Some(hours as f64 * 60.0 + minutes as f64 + seconds as f64 / 60.0)
}

/// Calendar date for a 1900-system serial (epoch 1899-12-30).
pub fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(Duration::days(serial.floor() as i64))
}

/// True when the text carries a "not available" marker (`#N/D`, `N/A`, ...).
pub fn is_not_available(s: &str) -> bool {
    let n = normalize(s);
    n.contains("N/D") || n.contains("N/A")
}
