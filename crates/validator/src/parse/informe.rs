use modelcheck_engine::text::serial_to_date;
use modelcheck_engine::{CellValue, Sheet};
use serde::Serialize;

pub const DATE_CELL: &str = "C2";
pub const DEVELOPER_NAME_CELL: &str = "A105";
pub const DEVELOPER_ROLE_CELL: &str = "C105";
pub const REVIEWER_NAME_CELL: &str = "A108";
pub const REVIEWER_ROLE_CELL: &str = "C108";
pub const MAP_LABEL: &str = "MAPEO DE RUTAS";

/// Fixed-position fields of the INFORME sheet.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InformeFields {
    /// Report date; serial dates are rendered `YYYY-MM-DD`.
    pub date: Option<String>,
    pub developer_name: Option<String>,
    pub developer_role: Option<String>,
    pub reviewer_name: Option<String>,
    pub reviewer_role: Option<String>,
    pub has_map_label: bool,
}

fn text_at(sheet: &Sheet, address: &str) -> Option<String> {
    sheet.get_a1(address).map(CellValue::raw_display)
}

/// Render a date cell: serial numbers through the 1899-12-30 epoch, text as-is.
pub fn render_date(value: &CellValue) -> Option<String> {
    match value {
        CellValue::Number(n) => Some(
            serial_to_date(*n)
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| value.raw_display()),
        ),
        CellValue::Text(_) => Some(value.raw_display()),
        CellValue::Empty => None,
    }
}

pub fn parse_informe(sheet: &Sheet) -> InformeFields {
    InformeFields {
        date: sheet.get_a1(DATE_CELL).and_then(render_date),
        developer_name: text_at(sheet, DEVELOPER_NAME_CELL),
        developer_role: text_at(sheet, DEVELOPER_ROLE_CELL),
        reviewer_name: text_at(sheet, REVIEWER_NAME_CELL),
        reviewer_role: text_at(sheet, REVIEWER_ROLE_CELL),
        has_map_label: sheet.contains_label(MAP_LABEL),
    }
}
