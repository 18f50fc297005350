use std::collections::{BTreeMap, BTreeSet};

use log::debug;
use modelcheck_engine::locate::{locate_header_by, ColumnRule, HeaderLocation};
use modelcheck_engine::text::normalize;
use modelcheck_engine::Sheet;

use super::{cell, number, table_rows};
use crate::config::ValidatorConfig;
use crate::error::ParseError;
use crate::model::HistoricalAggregate;

const AXIS: ColumnRule<'static> = ColumnRule::AllOf(&["AMIE", "EJE"]);
const DISTRICT: ColumnRule<'static> = ColumnRule::Contains("DISTRITO");
const BENEFICIARIES: ColumnRule<'static> = ColumnRule::Contains("BENEFICIARIO");

/// Prior-period totals keyed by (district, axis code), both normalized.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoricalTable {
    pub header_row: usize,
    pub entries: BTreeMap<(String, String), HistoricalAggregate>,
}

impl HistoricalTable {
    /// Exact (district, code) match, else the only entry for the code.
    pub fn lookup(&self, district: Option<&str>, axis_code: &str) -> Option<&HistoricalAggregate> {
        let code = normalize(axis_code);
        if let Some(district) = district {
            if let Some(hit) = self.entries.get(&(normalize(district), code.clone())) {
                return Some(hit);
            }
        }
        let mut by_code = self.entries.values().filter(|a| a.axis_code == code);
        match (by_code.next(), by_code.next()) {
            (Some(only), None) => Some(only),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Default)]
struct Accumulator {
    row_count: usize,
    routes: BTreeSet<String>,
    beneficiaries: Option<f64>,
    annual_budget: Option<f64>,
    affiliated: BTreeSet<String>,
    reference_year: Option<String>,
}

fn add(slot: &mut Option<f64>, value: Option<f64>) {
    if let Some(v) = value {
        *slot = Some(slot.unwrap_or(0.0) + v);
    }
}

fn is_header(labels: &[String]) -> bool {
    let any = |rule: ColumnRule<'_>| labels.iter().any(|l| rule.matches(l));
    any(AXIS) && (any(DISTRICT) || any(BENEFICIARIES))
}

fn year_column(header: &HeaderLocation) -> Option<usize> {
    header
        .column(ColumnRule::Contains("ANO LECTIVO"))
        .or_else(|| header.column(ColumnRule::Contains("PERIODO")))
        .or_else(|| header.column(ColumnRule::Exact(&["ANO", "YEAR"])))
}

/// Parse the first sheet of the historical workbook.
pub fn parse_historical(sheet: &Sheet, config: &ValidatorConfig) -> Result<HistoricalTable, ParseError> {
    let matrix = sheet.matrix();
    let header = locate_header_by(&matrix, config.scan.header_scan_rows, is_header).ok_or_else(
        || ParseError::HeaderNotFound {
            sheet: sheet.name.clone(),
            expected: vec!["AMIE EJE".into(), "DISTRITO | BENEFICIARIOS".into()],
        },
    )?;

    let axis = header.column(AXIS);
    let district = header.column(DISTRICT);
    let route = header.column(ColumnRule::Exact(&["RUTA", "RUTAS"]));
    let affiliated = header.column(ColumnRule::AllOf(&["AMIE", "AFC"]));
    let beneficiaries = header.column(BENEFICIARIES);
    let budget = header.column(ColumnRule::AllOf(&["PRESUPUESTO", "ANUAL"]));
    let year = year_column(&header);

    let mut acc: BTreeMap<(String, String), Accumulator> = BTreeMap::new();
    for (_, row) in table_rows(&matrix, header.row + 1, usize::MAX, axis) {
        let key = (cell(row, district).normalized(), cell(row, axis).normalized());
        let entry = acc.entry(key).or_default();

        entry.row_count += 1;
        let route_id = cell(row, route).normalized();
        if !route_id.is_empty() {
            entry.routes.insert(route_id);
        }
        let afc = cell(row, affiliated).normalized();
        if !afc.is_empty() {
            entry.affiliated.insert(afc);
        }
        add(&mut entry.beneficiaries, number(row, beneficiaries));
        add(&mut entry.annual_budget, number(row, budget));
        let label = cell(row, year).raw_display();
        if !label.is_empty() {
            entry.reference_year = Some(label);
        }
    }

    let entries: BTreeMap<_, _> = acc
        .into_iter()
        .map(|((district, axis_code), a)| {
            let route_count = if route.is_some() { a.routes.len() } else { a.row_count };
            let aggregate = HistoricalAggregate {
                district: district.clone(),
                axis_code: axis_code.clone(),
                row_count: a.row_count,
                route_count,
                beneficiaries: a.beneficiaries,
                annual_budget: a.annual_budget,
                affiliated_codes: a.affiliated.into_iter().collect(),
                reference_year: a.reference_year,
            };
            ((district, axis_code), aggregate)
        })
        .collect();

    debug!(
        "historical '{}': header row {}, {} keys",
        sheet.name,
        header.row + 1,
        entries.len()
    );

    Ok(HistoricalTable {
        header_row: header.row,
        entries,
    })
}
