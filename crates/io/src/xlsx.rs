// Excel import via calamine, plus archive media listing

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader, Sheets};
use log::debug;
use modelcheck_engine::{CellValue, Sheet, Workbook};
use modelcheck_validator::{InputFile, ReadError, WorkbookReader};

/// Maximum number of cells to import (prevents DoS from huge files)
const MAX_CELLS: usize = 5_000_000;

/// Maximum dimensions for a sheet
const MAX_ROWS: usize = 65536;
const MAX_COLS: usize = 256;

/// Archive folder holding embedded images.
pub const MEDIA_PREFIX: &str = "xl/media/";

/// Spreadsheet backend for the validator, decoding in-memory blobs.
#[derive(Debug, Clone, Copy, Default)]
pub struct CalamineReader;

impl WorkbookReader for CalamineReader {
    fn read(&self, input: &InputFile) -> Result<Workbook, ReadError> {
        decode(&input.bytes).map_err(ReadError::Decode)
    }

    fn list_media(&self, input: &InputFile) -> Result<Vec<String>, ReadError> {
        list_media(&input.bytes).map_err(ReadError::Decode)
    }
}

/// Decode an Excel file (xlsx, xlsm, xls, xlsb, ods) held in memory.
pub fn decode(bytes: &[u8]) -> Result<Workbook, String> {
    let mut workbook: Sheets<_> = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| format!("Failed to open Excel file: {}", e))?;

    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    if sheet_names.is_empty() {
        return Err("Excel file contains no sheets".to_string());
    }

    let mut sheets = Vec::with_capacity(sheet_names.len());
    let mut total_cells = 0;

    for sheet_name in &sheet_names {
        let range = workbook
            .worksheet_range(sheet_name)
            .map_err(|e| format!("Failed to read sheet '{}': {}", sheet_name, e))?;

        let mut sheet = Sheet::new(sheet_name.as_str());

        // Range start offset (data may not begin at A1)
        let (start_row, start_col) = range.start().unwrap_or((0, 0));

        'rows: for (row_idx, row) in range.rows().enumerate() {
            let target_row = start_row as usize + row_idx;
            if target_row >= MAX_ROWS {
                break;
            }
            for (col_idx, cell) in row.iter().enumerate() {
                let target_col = start_col as usize + col_idx;
                if target_col >= MAX_COLS {
                    break;
                }
                if total_cells >= MAX_CELLS {
                    debug!("import stopped at {} cells", MAX_CELLS);
                    break 'rows;
                }
                let value = convert(cell);
                if !value.is_blank() {
                    sheet.set(target_row, target_col, value);
                    total_cells += 1;
                }
            }
        }

        debug!(
            "decoded sheet '{}': {} filled cells",
            sheet.name,
            sheet.filled_count()
        );
        sheets.push(sheet);
    }

    Ok(Workbook::from_sheets(sheets))
}

fn convert(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::text(s.as_str()),
        Data::Float(n) => CellValue::Number(*n),
        Data::Int(n) => CellValue::Number(*n as f64),
        // Store as TRUE/FALSE text, matching the truthy-token comparison
        Data::Bool(b) => CellValue::text(if *b { "TRUE" } else { "FALSE" }),
        Data::Error(e) => CellValue::text(e.to_string()),
        // 1900 date system assumed; the serial is what the parsers expect
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::text(s.as_str()),
    }
}

/// Non-directory entries under `xl/media/`, sorted.
pub fn list_media(bytes: &[u8]) -> Result<Vec<String>, String> {
    let archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| format!("Failed to open workbook archive: {}", e))?;

    let mut media: Vec<String> = archive
        .file_names()
        .filter(|name| name.starts_with(MEDIA_PREFIX) && !name.ends_with('/'))
        .map(str::to_string)
        .collect();
    media.sort();
    Ok(media)
}
