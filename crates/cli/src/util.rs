use modelcheck_validator::summary::CheckGroup;
use modelcheck_validator::CheckResult;
use unicode_width::UnicodeWidthStr;

/// Display width of a string, accounting for CJK double-width, emoji, etc.
pub(crate) fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Truncate a string to fit within `width` display columns, adding ".." if truncated.
pub(crate) fn truncate_display(s: &str, width: usize) -> String {
    if display_width(s) <= width {
        return s.to_string();
    }
    if width < 3 {
        return s
            .chars()
            .next()
            .filter(|ch| unicode_width::UnicodeWidthChar::width(*ch).unwrap_or(0) <= width)
            .map(String::from)
            .unwrap_or_default();
    }

    let budget = width - 2;
    let mut used = 0;
    let mut end_byte = 0;
    for (i, ch) in s.char_indices() {
        let cw = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + cw > budget {
            end_byte = i;
            break;
        }
        used += cw;
        end_byte = i + ch.len_utf8();
    }

    format!("{}..", &s[..end_byte])
}

/// Pad or truncate a string to exactly `width` display columns.
pub(crate) fn pad_right(s: &str, width: usize) -> String {
    let sw = display_width(s);
    if sw > width {
        truncate_display(s, width)
    } else {
        format!("{}{}", s, " ".repeat(width - sw))
    }
}

const DESCRIPTION_WIDTH: usize = 44;

/// Fixed-width checklist table for the terminal. Details are never
/// truncated; they carry the numbers reviewers act on.
pub(crate) fn checklist_table(checks: &[CheckResult]) -> String {
    let code_width = checks
        .iter()
        .map(|c| display_width(&c.code))
        .max()
        .unwrap_or(4)
        .max(4);

    let mut out = String::new();
    out.push_str(&format!(
        "{}  {}  {}  {}  DETAIL\n",
        pad_right("STATUS", 6),
        pad_right("GROUP", 5),
        pad_right("CODE", code_width),
        pad_right("CHECK", DESCRIPTION_WIDTH),
    ));
    for c in checks {
        let line = format!(
            "{}  {}  {}  {}  {}",
            pad_right(&c.status.to_string(), 6),
            pad_right(CheckGroup::of(&c.code).code(), 5),
            pad_right(&c.code, code_width),
            pad_right(&c.description, DESCRIPTION_WIDTH),
            c.detail,
        );
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_width_ascii() {
        assert_eq!(display_width("hello"), 5);
        assert_eq!(display_width(""), 0);
    }

    #[test]
    fn display_width_accented() {
        assert_eq!(display_width("VALIDACIÓN"), 10);
    }

    #[test]
    fn truncate_cjk() {
        assert_eq!(truncate_display("日本語テキスト", 7), "日本..");
        assert_eq!(truncate_display("short", 10), "short");
        assert_eq!(truncate_display("abcdef", 2), "a");
    }

    #[test]
    fn pad_right_exact() {
        assert_eq!(pad_right("ab", 4), "ab  ");
        assert_eq!(pad_right("abcdefgh", 5), "abc..");
    }

    #[test]
    fn table_rows_align() {
        let checks = vec![
            CheckResult::ok("PDF-01", "Memo document supplied", "memo.pdf"),
            CheckResult::fail("SHT-VAL", "Sheet VALIDACIÓN present", ""),
        ];
        let table = checklist_table(&checks);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("OK      INS    PDF-01 "));
        assert!(lines[1].ends_with("memo.pdf"));
        assert!(lines[2].starts_with("FAIL    SHT    SHT-VAL"));
    }
}
