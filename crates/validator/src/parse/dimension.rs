use log::debug;
use modelcheck_engine::locate::{locate_header, ColumnRule};
use modelcheck_engine::Sheet;

use super::{cell, minutes, number, table_rows};
use crate::config::{ToleranceConfig, ValidatorConfig};
use crate::error::ParseError;
use crate::model::{DimensionIssue, DimensionIssueKind, DimensionRecord, DimensionTable};

pub const HEADER_TOKENS: [&str; 2] = ["RUTA", "PRESUPUESTO ANUAL"];

pub fn parse_dimension(sheet: &Sheet, config: &ValidatorConfig) -> Result<DimensionTable, ParseError> {
    let matrix = sheet.matrix();
    let header = locate_header(&matrix, &HEADER_TOKENS, config.scan.header_scan_rows).ok_or_else(
        || ParseError::HeaderNotFound {
            sheet: sheet.name.clone(),
            expected: HEADER_TOKENS.iter().map(|s| s.to_string()).collect(),
        },
    )?;

    let col = |token: &str| header.column(ColumnRule::Contains(token));
    let route = col("RUTA");
    let monthly = col("PRESUPUESTO MENSUAL");
    let annual = col("PRESUPUESTO ANUAL");
    let departure_1 = col("HORA DE SALIDA 1");
    let arrival_1 = col("HORA DE LLEGADA 1");
    let departure_2 = col("HORA DE SALIDA 2");
    let arrival_2 = col("HORA DE LLEGADA 2");
    let trip_start = col("TIEMPO INICIO");
    let trip_return = col("TIEMPO RETORNO");
    let optimization = col("OPTIMIZACI");
    let unit_cost = col("COSTO UNITARIO");
    let per_student = col("COSTO ESTUDIANT");

    let mut rows = Vec::new();
    for (i, row) in table_rows(&matrix, header.row + 1, config.scan.dimension_max_rows, route) {
        let id = cell(row, route);
        rows.push(DimensionRecord {
            row_number: i + 1,
            route_id: id.raw_display(),
            route_number: id.as_number(),
            monthly_budget: number(row, monthly),
            annual_budget: number(row, annual),
            departure_1: minutes(row, departure_1),
            arrival_1: minutes(row, arrival_1),
            departure_2: minutes(row, departure_2),
            arrival_2: minutes(row, arrival_2),
            trip_start: minutes(row, trip_start),
            trip_return: minutes(row, trip_return),
            optimization_pct: number(row, optimization),
            unit_cost: number(row, unit_cost),
            per_student_cost: number(row, per_student),
        });
    }

    let issues: Vec<DimensionIssue> = rows
        .iter()
        .filter(|r| r.route_number.is_some_and(|n| n != 0.0))
        .flat_map(|r| {
            row_issues(r, &config.tolerance)
                .into_iter()
                .map(move |kind| DimensionIssue {
                    row_number: r.row_number,
                    route_id: r.route_id.clone(),
                    kind,
                })
        })
        .collect();

    let annual_budget_total = rows.iter().filter_map(|r| r.annual_budget).sum();

    debug!(
        "DIMENSION '{}': header row {}, {} rows, {} issues",
        sheet.name,
        header.row + 1,
        rows.len(),
        issues.len()
    );

    Ok(DimensionTable {
        header_row: header.row,
        rows,
        issues,
        annual_budget_total,
    })
}

/// Every dimensioning invariant the row violates, in a fixed order.
pub fn row_issues(r: &DimensionRecord, tolerance: &ToleranceConfig) -> Vec<DimensionIssueKind> {
    let mut issues = Vec::new();

    match (r.departure_1, r.arrival_1, r.departure_2, r.arrival_2) {
        (Some(d1), Some(a1), Some(d2), Some(a2)) => {
            if !(d1 < a1 && a1 < d2 && d2 < a2) {
                issues.push(DimensionIssueKind::TimeOrder);
            }
        }
        _ => issues.push(DimensionIssueKind::MissingTimes),
    }

    let positive = |v: Option<f64>| v.is_some_and(|m| m > 0.0);
    if !(positive(r.trip_start) && positive(r.trip_return)) {
        issues.push(DimensionIssueKind::TripDuration);
    }

    match (r.monthly_budget, r.annual_budget) {
        (Some(monthly), Some(_)) if monthly == 0.0 => {
            issues.push(DimensionIssueKind::MonthlyBudgetZero);
        }
        (Some(monthly), Some(annual)) => {
            let ratio = annual / monthly;
            if !(tolerance.budget_ratio_min..=tolerance.budget_ratio_max).contains(&ratio) {
                issues.push(DimensionIssueKind::BudgetRatio {
                    ratio,
                    expected: tolerance.budget_ratio_expected,
                });
            }
        }
        _ => issues.push(DimensionIssueKind::BudgetMissing),
    }

    if let Some(value) = r.optimization_pct {
        if !(tolerance.optimization_min..=tolerance.optimization_max).contains(&value) {
            issues.push(DimensionIssueKind::OptimizationOutOfRange { value });
        }
    }

    if r.unit_cost.is_none() {
        issues.push(DimensionIssueKind::UnitCostMissing);
    }

    issues
}
