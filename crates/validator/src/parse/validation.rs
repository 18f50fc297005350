use log::debug;
use modelcheck_engine::locate::{locate_header, ColumnRule};
use modelcheck_engine::text::normalize;
use modelcheck_engine::Sheet;

use super::{cell, minutes, table_rows};
use crate::config::ValidatorConfig;
use crate::error::ParseError;
use crate::model::{ValidationRecord, ValidationTable};

pub const HEADER_TOKENS: [&str; 3] = ["RUTA", "TEST IDA", "TEST RETORNO"];

/// True when `value` equals one of the accepted tokens after normalization.
pub fn is_truthy(value: &str, tokens: &[String]) -> bool {
    let value = normalize(value);
    !value.is_empty() && tokens.iter().any(|t| normalize(t) == value)
}

pub fn parse_validation(sheet: &Sheet, config: &ValidatorConfig) -> Result<ValidationTable, ParseError> {
    let matrix = sheet.matrix();
    let header = locate_header(&matrix, &HEADER_TOKENS, config.scan.header_scan_rows).ok_or_else(
        || ParseError::HeaderNotFound {
            sheet: sheet.name.clone(),
            expected: HEADER_TOKENS.iter().map(|s| s.to_string()).collect(),
        },
    )?;

    let col = |token: &str| header.column(ColumnRule::Contains(token));
    let route = col("RUTA");
    let departure_col = col("HORA DE SALIDA");
    let arrival_col = col("HORA DE LLEGAD");
    let outbound = col("TEST IDA");
    let inbound = col("TEST RETORNO");
    let tokens = &config.validation.truthy_tokens;

    let mut rows = Vec::new();
    for (i, row) in table_rows(&matrix, header.row + 1, config.scan.validation_max_rows, route) {
        let outbound_test = cell(row, outbound).normalized();
        let return_test = cell(row, inbound).normalized();
        let departure = minutes(row, departure_col);
        let arrival = minutes(row, arrival_col);

        let flags_ok = is_truthy(&outbound_test, tokens) && is_truthy(&return_test, tokens);
        let times_ok = matches!((departure, arrival), (Some(d), Some(a)) if d < a);

        rows.push(ValidationRecord {
            row_number: i + 1,
            route_id: cell(row, route).raw_display(),
            departure,
            arrival,
            outbound_test,
            return_test,
            flags_ok,
            times_ok,
        });
    }

    let not_truthy_count = rows.iter().filter(|r| !r.flags_ok).count();
    let time_bad_count = rows.iter().filter(|r| !r.times_ok).count();

    debug!(
        "VALIDATION '{}': header row {}, {} rows, {} not truthy, {} bad times",
        sheet.name,
        header.row + 1,
        rows.len(),
        not_truthy_count,
        time_bad_count
    );

    Ok(ValidationTable {
        header_row: header.row,
        rows,
        not_truthy_count,
        time_bad_count,
    })
}
