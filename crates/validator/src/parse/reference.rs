use std::collections::BTreeMap;

use log::debug;
use modelcheck_engine::locate::{locate_header, ColumnRule};
use modelcheck_engine::text::normalize;
use modelcheck_engine::Sheet;

use super::{cell, number, table_rows};
use crate::config::ValidatorConfig;
use crate::error::ParseError;
use crate::model::ReferenceRange;

pub const HEADER_TOKENS: [&str; 3] = ["AMIE", "MINIMO_F", "MAXIMO_F"];

/// Accepted beneficiary ranges keyed by normalized school code.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceTable {
    pub header_row: usize,
    pub ranges: BTreeMap<String, ReferenceRange>,
}

impl ReferenceTable {
    pub fn lookup(&self, code: &str) -> Option<&ReferenceRange> {
        self.ranges.get(&normalize(code))
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

/// Parse the first sheet of the reference workbook. Rows without both
/// bounds are skipped; a later row for the same code replaces an earlier one.
pub fn parse_reference(sheet: &Sheet, config: &ValidatorConfig) -> Result<ReferenceTable, ParseError> {
    let matrix = sheet.matrix();
    let header = locate_header(&matrix, &HEADER_TOKENS, config.scan.reference_scan_rows)
        .ok_or_else(|| ParseError::HeaderNotFound {
            sheet: sheet.name.clone(),
            expected: HEADER_TOKENS.iter().map(|s| s.to_string()).collect(),
        })?;

    let id = header.column(ColumnRule::Contains("AMIE"));
    let min_col = header.column(ColumnRule::Contains("MINIMO_F"));
    let max_col = header.column(ColumnRule::Contains("MAXIMO_F"));
    let estimate_col = header.column(ColumnRule::Contains("ESTIMADO"));

    let mut ranges = BTreeMap::new();
    for (_, row) in table_rows(&matrix, header.row + 1, usize::MAX, id) {
        let (Some(min), Some(max)) = (number(row, min_col), number(row, max_col)) else {
            continue;
        };
        ranges.insert(
            cell(row, id).normalized(),
            ReferenceRange {
                min,
                max,
                estimate: number(row, estimate_col),
            },
        );
    }

    debug!(
        "reference '{}': header row {}, {} ranges",
        sheet.name,
        header.row + 1,
        ranges.len()
    );

    Ok(ReferenceTable {
        header_row: header.row,
        ranges,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet(rows: &[&[&str]]) -> Sheet {
        let mut sheet = Sheet::new("Rangos");
        for (r, row) in rows.iter().enumerate() {
            for (c, v) in row.iter().enumerate() {
                sheet.set_value(r, c, v);
            }
        }
        sheet
    }

    #[test]
    fn accented_header_and_lookup() {
        let s = sheet(&[
            &["Base DAEI"],
            &["Zona", "AMIE", "Mínimo_F", "Máximo_F", "Estimado 2026"],
            &["1", "01h00001", "50", "100", "80"],
            &["1", "01H00002", "10", "", ""],
            &["1", "01H00003", "1.000,0", "2.000,5", ""],
        ]);
        let table = parse_reference(&s, &ValidatorConfig::default()).unwrap();
        assert_eq!(table.header_row, 1);
        assert_eq!(table.len(), 2);

        let r = table.lookup("01H00001").unwrap();
        assert_eq!((r.min, r.max, r.estimate), (50.0, 100.0, Some(80.0)));
        assert!(table.lookup("01H00002").is_none());
        assert_eq!(table.lookup(" 01h00003").unwrap().max, 2000.5);
    }

    #[test]
    fn header_beyond_window_is_not_found() {
        let filler: &[&str] = &["x"];
        let mut rows: Vec<&[&str]> = vec![filler; 60];
        rows.push(&["AMIE", "MINIMO_F", "MAXIMO_F"]);
        let err = parse_reference(&sheet(&rows), &ValidatorConfig::default()).unwrap_err();
        assert!(matches!(err, ParseError::HeaderNotFound { .. }));
    }
}
