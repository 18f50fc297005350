// Report workbook export and auxiliary workbook fill

use std::path::Path;

use log::{debug, warn};
use modelcheck_engine::{CellValue, Sheet, Workbook};
use modelcheck_validator::config::SheetNames;
use modelcheck_validator::summary::CheckGroup;
use modelcheck_validator::{CheckResult, DocumentSlots};
use rust_xlsxwriter::{Format, Workbook as XlsxWorkbook, Worksheet};

pub const SUMMARY_SHEET: &str = "Resumen";
pub const CHECKLIST_SHEET: &str = "Checklist";

const CHECKLIST_HEADER: [&str; 5] = ["Code", "Group", "Description", "Status", "Detail"];
const SLOT_HEADER: [&str; 2] = ["Field", "Value"];

/// Export statistics
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ExportResult {
    pub sheets_exported: usize,
    pub cells_copied: usize,
    pub checklist_rows: usize,
    pub slot_rows: usize,
    /// Sheet that received the checklist, for the auxiliary fill.
    pub checklist_sheet: Option<String>,
    /// Sheet that received the slot table, for the auxiliary fill.
    pub slots_sheet: Option<String>,
}

fn xlsx_err(context: &str) -> impl Fn(rust_xlsxwriter::XlsxError) -> String + '_ {
    move |e| format!("{}: {}", context, e)
}

fn write_row(
    worksheet: &mut Worksheet,
    row: u32,
    values: &[&str],
    format: Option<&Format>,
) -> Result<(), String> {
    for (col, value) in values.iter().enumerate() {
        let col = col as u16;
        let written = match format {
            Some(f) => worksheet.write_string_with_format(row, col, *value, f),
            None => worksheet.write_string(row, col, *value),
        };
        written.map_err(xlsx_err("Failed to write cell"))?;
    }
    Ok(())
}

/// Header row then one row per check. Returns rows written, header excluded.
fn write_checklist(
    worksheet: &mut Worksheet,
    start_row: u32,
    checks: &[CheckResult],
    bold: &Format,
) -> Result<usize, String> {
    write_row(worksheet, start_row, &CHECKLIST_HEADER, Some(bold))?;
    for (i, check) in checks.iter().enumerate() {
        let status = check.status.to_string();
        write_row(
            worksheet,
            start_row + 1 + i as u32,
            &[
                &check.code,
                CheckGroup::of(&check.code).code(),
                &check.description,
                &status,
                &check.detail,
            ],
            None,
        )?;
    }
    Ok(checks.len())
}

fn write_slots(
    worksheet: &mut Worksheet,
    start_row: u32,
    slots: &DocumentSlots,
    bold: &Format,
) -> Result<usize, String> {
    write_row(worksheet, start_row, &SLOT_HEADER, Some(bold))?;
    let mut written = 0;
    for (i, (name, value)) in slots.iter().enumerate() {
        write_row(worksheet, start_row + 1 + i as u32, &[name, value], None)?;
        written += 1;
    }
    Ok(written)
}

// ============================================================================
// Report workbook
// ============================================================================

fn build_report(
    checks: &[CheckResult],
    slots: &DocumentSlots,
) -> Result<(XlsxWorkbook, ExportResult), String> {
    let mut result = ExportResult::default();
    let mut workbook = XlsxWorkbook::new();
    let bold = Format::new().set_bold();

    let summary = workbook
        .add_worksheet()
        .set_name(SUMMARY_SHEET)
        .map_err(xlsx_err("Failed to create summary sheet"))?;
    result.slot_rows = write_slots(summary, 0, slots, &bold)?;
    summary
        .set_column_width(0, 22)
        .and_then(|ws| ws.set_column_width(1, 80))
        .map_err(xlsx_err("Failed to size columns"))?;
    result.sheets_exported += 1;

    let checklist = workbook
        .add_worksheet()
        .set_name(CHECKLIST_SHEET)
        .map_err(xlsx_err("Failed to create checklist sheet"))?;
    result.checklist_rows = write_checklist(checklist, 0, checks, &bold)?;
    checklist
        .set_column_width(2, 50)
        .and_then(|ws| ws.set_column_width(4, 80))
        .map_err(xlsx_err("Failed to size columns"))?;
    result.sheets_exported += 1;

    Ok((workbook, result))
}

/// Write the report workbook: slot/value pairs and the checklist.
pub fn export_report(
    checks: &[CheckResult],
    slots: &DocumentSlots,
    path: &Path,
) -> Result<ExportResult, String> {
    let (mut workbook, result) = build_report(checks, slots)?;
    workbook
        .save(path)
        .map_err(xlsx_err("Failed to save XLSX file"))?;
    Ok(result)
}

// ============================================================================
// Auxiliary workbook fill
// ============================================================================

fn copy_cells(sheet: &Sheet, worksheet: &mut Worksheet) -> Result<usize, String> {
    let mut copied = 0;
    for ((row, col), value) in sheet.cells_sorted() {
        let (row, col) = (row as u32, col as u16);
        let written = match value {
            CellValue::Number(n) => worksheet.write_number(row, col, *n),
            CellValue::Text(s) => worksheet.write_string(row, col, s),
            CellValue::Empty => continue,
        };
        written.map_err(xlsx_err("Failed to copy cell"))?;
        copied += 1;
    }
    Ok(copied)
}

/// Copy every sheet of the decoded auxiliary workbook, appending the
/// checklist to its compliance sheet and the slot table to its revision
/// sheet, one blank row below each used range.
pub fn export_filled_aux(
    aux: &Workbook,
    checks: &[CheckResult],
    slots: &DocumentSlots,
    names: &SheetNames,
    path: &Path,
) -> Result<ExportResult, String> {
    let compliance = aux.find_sheet_any(&names.aux_compliance).map(|s| s.name.clone());
    let revision = aux.find_sheet_any(&names.aux_revision).map(|s| s.name.clone());
    if compliance.is_none() {
        warn!("auxiliary workbook has no compliance sheet; checklist not appended");
    }
    if revision.is_none() {
        warn!("auxiliary workbook has no revision sheet; fields not appended");
    }

    let mut result = ExportResult::default();
    let mut workbook = XlsxWorkbook::new();
    let bold = Format::new().set_bold();

    for sheet in aux.sheets() {
        let worksheet = workbook
            .add_worksheet()
            .set_name(&sheet.name)
            .map_err(|e| format!("Failed to create sheet '{}': {}", sheet.name, e))?;
        result.cells_copied += copy_cells(sheet, worksheet)?;

        let next_free = sheet.row_count() as u32 + 1;
        if compliance.as_deref() == Some(sheet.name.as_str()) {
            result.checklist_rows = write_checklist(worksheet, next_free, checks, &bold)?;
            result.checklist_sheet = Some(sheet.name.clone());
        } else if revision.as_deref() == Some(sheet.name.as_str()) {
            result.slot_rows = write_slots(worksheet, next_free, slots, &bold)?;
            result.slots_sheet = Some(sheet.name.clone());
        }
        result.sheets_exported += 1;
    }

    debug!(
        "filled auxiliary workbook: {} sheets, {} cells copied",
        result.sheets_exported, result.cells_copied
    );

    workbook
        .save(path)
        .map_err(xlsx_err("Failed to save XLSX file"))?;
    Ok(result)
}
