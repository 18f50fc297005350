use log::debug;
use modelcheck_engine::locate::{locate_header, ColumnRule, HeaderLocation};
use modelcheck_engine::{CellValue, Sheet};

use super::{cell, number, table_rows};
use crate::config::ValidatorConfig;
use crate::model::{
    Coordinates, Identifiers, RouteIssue, RouteIssueKind, RouteRecord, RouteTable,
};

pub const HEADER_TOKENS: [&str; 3] = ["RUTA", "BENEFICIARIOS", "AMIE"];

/// District code cell.
pub const DISTRICT_CELL: &str = "B3";
/// Axis school code cell.
pub const AXIS_CODE_CELL: &str = "B4";
/// Header UTM coordinates.
pub const COORD_X_CELL: &str = "H6";
pub const COORD_Y_CELL: &str = "H7";

/// First data row (0-based) when no header row is detected.
const FALLBACK_FIRST_ROW: usize = 9;

struct Columns {
    route: Option<usize>,
    merged_code: Option<usize>,
    total: Option<usize>,
    initial: Option<usize>,
    basic: Option<usize>,
    high_school: Option<usize>,
    x: Option<usize>,
    y: Option<usize>,
    distance: Option<usize>,
}

impl Columns {
    fn from_header(header: &HeaderLocation) -> Self {
        Self {
            // A header without an exact RUTA label still keys on the first column.
            route: header.column(ColumnRule::Exact(&["RUTA"])).or(Some(0)),
            merged_code: header.column(ColumnRule::AllOf(&["AMIE", "FUSION"])),
            total: header.column(ColumnRule::AllOf(&["BENEFICIARIOS", "RUTA"])),
            initial: header.column(ColumnRule::Contains("INICIAL")),
            basic: header.column(ColumnRule::Contains("EGB")),
            high_school: header.column(ColumnRule::Contains("BACH")),
            x: header.column(ColumnRule::AllOfEndsWith(&["COORDENADA"], "X")),
            y: header.column(ColumnRule::AllOfEndsWith(&["COORDENADA"], "Y")),
            distance: header.column(ColumnRule::AllOf(&["DISTANCIA", "LINEAL"])),
        }
    }

    /// Fixed layout of the submission template.
    fn fallback() -> Self {
        Self {
            route: Some(0),
            merged_code: Some(2),
            total: Some(3),
            initial: Some(5),
            basic: Some(6),
            high_school: Some(7),
            x: None,
            y: None,
            distance: None,
        }
    }
}

fn header_text(sheet: &Sheet, address: &str) -> Option<String> {
    sheet
        .get_a1(address)
        .map(CellValue::normalized)
        .filter(|s| !s.is_empty())
}

/// Parse the ROUTE sheet. Never fails: without a detectable header the
/// table is read from the fixed fallback layout.
pub fn parse_route(sheet: &Sheet, config: &ValidatorConfig) -> RouteTable {
    let ids = Identifiers {
        district: header_text(sheet, DISTRICT_CELL),
        axis_code: header_text(sheet, AXIS_CODE_CELL),
    };
    let header_coordinates = Coordinates {
        x: sheet.get_a1(COORD_X_CELL).and_then(CellValue::as_number),
        y: sheet.get_a1(COORD_Y_CELL).and_then(CellValue::as_number),
    };

    let matrix = sheet.matrix();
    let header = locate_header(&matrix, &HEADER_TOKENS, config.scan.header_scan_rows);
    let (start, cols) = match &header {
        Some(h) => (h.row + 1, Columns::from_header(h)),
        None => (FALLBACK_FIRST_ROW, Columns::fallback()),
    };
    debug!(
        "ROUTE '{}': header {:?}, data from row {}",
        sheet.name,
        header.as_ref().map(|h| h.row + 1),
        start + 1
    );

    let tolerance = config.tolerance.beneficiary_sum;
    let has_coordinate_columns = cols.x.is_some() || cols.y.is_some();
    let has_distance_column = cols.distance.is_some();

    let mut rows = Vec::new();
    let mut affiliated_codes: Vec<String> = Vec::new();
    let mut beneficiaries_total = 0.0;
    let mut issues = Vec::new();

    for (i, row) in table_rows(&matrix, start, config.scan.route_max_rows, cols.route) {
        let row_number = i + 1;
        let route_id = cell(row, cols.route).raw_display();
        let merged = cell(row, cols.merged_code).normalized();
        let merged_school_code = (!merged.is_empty()).then_some(merged);

        let record = RouteRecord {
            row_number,
            route_id: route_id.clone(),
            merged_school_code,
            total_beneficiaries: number(row, cols.total),
            initial_level: number(row, cols.initial),
            basic_level: number(row, cols.basic),
            high_school_level: number(row, cols.high_school),
            coordinate_x: number(row, cols.x),
            coordinate_y: number(row, cols.y),
            linear_distance: number(row, cols.distance),
        };

        if let Some(code) = &record.merged_school_code {
            if !affiliated_codes.contains(code) {
                affiliated_codes.push(code.clone());
            }
        }
        if let Some(total) = record.total_beneficiaries {
            beneficiaries_total += total;
        }

        let mut flag = |kind| {
            issues.push(RouteIssue {
                row_number,
                route_id: route_id.clone(),
                kind,
            })
        };

        if let Some(kind) = beneficiary_sum_issue(&record, tolerance) {
            flag(kind);
        }
        if has_coordinate_columns && (record.coordinate_x.is_none() || record.coordinate_y.is_none()) {
            flag(RouteIssueKind::MissingCoordinates);
        }
        if has_distance_column && record.linear_distance.is_none() {
            flag(RouteIssueKind::MissingDistance);
        }

        rows.push(record);
    }

    debug!(
        "ROUTE '{}': {} routes, {} beneficiaries, {} issues",
        sheet.name,
        rows.len(),
        beneficiaries_total,
        issues.len()
    );

    RouteTable {
        header_row: header.map(|h| h.row),
        ids,
        header_coordinates,
        rows,
        affiliated_codes,
        beneficiaries_total,
        issues,
        has_coordinate_columns,
        has_distance_column,
    }
}

/// Total vs. level breakdown. Evaluated when the total and at least one
/// level are present; missing levels count as zero.
pub fn beneficiary_sum_issue(record: &RouteRecord, tolerance: f64) -> Option<RouteIssueKind> {
    let total = record.total_beneficiaries?;
    let levels = [
        record.initial_level,
        record.basic_level,
        record.high_school_level,
    ];
    if levels.iter().all(Option::is_none) {
        return None;
    }
    let components: f64 = levels.iter().flatten().sum();
    let diff = (total - components).abs();
    (diff > tolerance + 1e-9).then_some(
        RouteIssueKind::BeneficiarySum {
            total,
            components,
            diff,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(total: f64, levels: [Option<f64>; 3]) -> RouteRecord {
        RouteRecord {
            row_number: 11,
            route_id: "1".into(),
            merged_school_code: None,
            total_beneficiaries: Some(total),
            initial_level: levels[0],
            basic_level: levels[1],
            high_school_level: levels[2],
            coordinate_x: None,
            coordinate_y: None,
            linear_distance: None,
        }
    }

    fn sheet_with(rows: &[(usize, &[&str])]) -> Sheet {
        let mut sheet = Sheet::new("RUTA");
        sheet.set_value(2, 1, "d01 ");
        sheet.set_value(3, 1, "01h00001");
        sheet.set_value(5, 7, "712345");
        sheet.set_value(6, 7, "9876543");
        for (r, cells) in rows {
            for (c, v) in cells.iter().enumerate() {
                sheet.set_value(*r, c, v);
            }
        }
        sheet
    }

    #[test]
    fn exact_sum_is_within_tolerance() {
        let r = record(100.0, [Some(40.0), Some(40.0), Some(20.0)]);
        assert!(beneficiary_sum_issue(&r, 0.5).is_none());
    }

    #[test]
    fn one_unit_off_is_flagged() {
        let r = record(100.0, [Some(40.0), Some(40.0), Some(21.0)]);
        match beneficiary_sum_issue(&r, 0.5) {
            Some(RouteIssueKind::BeneficiarySum { diff, .. }) => assert!((diff - 1.0).abs() < 1e-9),
            other => panic!("expected sum issue, got {other:?}"),
        }
    }

    #[test]
    fn half_unit_rule_flags_sum_of_100_6() {
        // Strict |total - sum| <= 0.5: 100.5 passes, 100.6 is an issue
        let r = record(100.0, [Some(40.0), Some(40.0), Some(20.5)]);
        assert!(beneficiary_sum_issue(&r, 0.5).is_none());
        let r = record(100.0, [Some(40.0), Some(40.0), Some(20.6)]);
        assert!(beneficiary_sum_issue(&r, 0.5).is_some());
    }

    #[test]
    fn no_breakdown_is_not_evaluated() {
        let r = record(100.0, [None, None, None]);
        assert!(beneficiary_sum_issue(&r, 0.5).is_none());
    }

    #[test]
    fn detected_header_layout() {
        let sheet = sheet_with(&[
            (
                8,
                &[
                    "RUTA",
                    "AMIE IE FUSIONADA",
                    "BENEFICIARIOS POR RUTA",
                    "INICIAL",
                    "EGB",
                    "BACHILLERATO",
                    "COORDENADA X",
                    "COORDENADA Y",
                    "DISTANCIA LINEAL (KM)",
                ],
            ),
            (9, &["1", "01h00002", "100", "40", "40", "20", "712000", "9870000", "3,5"]),
            (10, &["2", "01h00003", "50", "10", "30", "10", "#N/D", "9870001", ""]),
            (11, &["3", "01H00002", "25", "5", "5", "5", "712100", "9870002", "1"]),
            (12, &["", "ignored", "999"]),
            (13, &["4", "after", "999"]),
        ]);
        let table = parse_route(&sheet, &ValidatorConfig::default());

        assert_eq!(table.header_row, Some(8));
        assert_eq!(table.ids.district.as_deref(), Some("D01"));
        assert_eq!(table.ids.axis_code.as_deref(), Some("01H00001"));
        assert_eq!(table.header_coordinates.x, Some(712345.0));
        assert_eq!(table.route_count(), 3);
        assert_eq!(table.beneficiaries_total, 175.0);
        assert_eq!(table.affiliated_codes, vec!["01H00002", "01H00003"]);
        assert_eq!(table.rows[0].linear_distance, Some(3.5));

        assert_eq!(table.count_issues(|k| *k == RouteIssueKind::MissingCoordinates), 1);
        assert_eq!(table.count_issues(|k| *k == RouteIssueKind::MissingDistance), 1);
        assert_eq!(
            table.count_issues(|k| matches!(k, RouteIssueKind::BeneficiarySum { .. })),
            1
        );
    }

    #[test]
    fn fallback_layout_starts_at_row_ten() {
        let sheet = sheet_with(&[
            (9, &["1", "", "01h00002", "30", "", "10", "10", "10"]),
            (10, &["2", "", "01h00003", "20", "", "5", "10", "5"]),
        ]);
        let table = parse_route(&sheet, &ValidatorConfig::default());
        assert_eq!(table.header_row, None);
        assert_eq!(table.route_count(), 2);
        assert_eq!(table.beneficiaries_total, 50.0);
        assert!(!table.has_coordinate_columns);
        assert!(table.issues.is_empty());
    }
}
