use log::{debug, info, warn};
use modelcheck_engine::{Sheet, Workbook};

use crate::config::ValidatorConfig;
use crate::crosscheck::{check_range, compare_historical, CurrentPeriod};
use crate::error::{ParseError, ReadError};
use crate::format;
use crate::model::{
    CheckResult, CheckStatus, DimensionSummary, DimensionTable, HistoricalSummary, InputFile,
    InputMeta, ModelData, RangeVerdict, ReferenceSummary, ReportMeta, RouteIssueKind, RouteSummary,
    RouteTable, Stage, ValidationReport, ValidationRequest, ValidationSummary,
};
use crate::parse::dimension::parse_dimension;
use crate::parse::historical::parse_historical;
use crate::parse::informe::{self, parse_informe};
use crate::parse::reference::parse_reference;
use crate::parse::route::{self, parse_route};
use crate::parse::validation::parse_validation;
use crate::reader::WorkbookReader;
use crate::summary::{count_statuses, overall_status};

/// Run the full checklist over `request`.
///
/// Never fails: missing inputs, sheets and capabilities all become
/// checklist rows, and an early halt returns the rows collected so far
/// with `stage` recording where the run stopped. `reader` is the
/// spreadsheet backend; `None` halts with SYS-01.
pub fn run(
    config: &ValidatorConfig,
    request: &ValidationRequest,
    reader: Option<&dyn WorkbookReader>,
) -> ValidationReport {
    info!("validation run started ({} inputs)", request.supplied().len());

    let mut run = Run::default();
    let model_data = execute(config, request, reader, &mut run);
    if model_data.is_some() {
        run.stage = Stage::Done;
    }

    let overall = overall_status(&run.checks);
    info!(
        "validation run finished: {overall} at stage {} ({} checks)",
        run.stage,
        run.checks.len()
    );

    ValidationReport {
        meta: ReportMeta {
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            inputs: request
                .supplied()
                .into_iter()
                .map(|(role, f)| InputMeta {
                    role,
                    name: f.name.clone(),
                    size: f.bytes.len(),
                    sha256: f.fingerprint.clone(),
                })
                .collect(),
        },
        stage: run.stage,
        overall,
        counts: count_statuses(&run.checks),
        checks: run.checks,
        notes: run.notes,
        model_data,
    }
}

#[derive(Default)]
struct Run {
    checks: Vec<CheckResult>,
    notes: Vec<String>,
    stage: Stage,
}

impl Run {
    fn push(&mut self, check: CheckResult) {
        debug!("{} {} {}", check.status, check.code, check.detail);
        self.checks.push(check);
    }

    fn advance(&mut self, stage: Stage) {
        debug!("stage {} -> {}", self.stage, stage);
        self.stage = stage;
    }
}

struct Sheets<'a> {
    informe: &'a Sheet,
    route: &'a Sheet,
    dimension: &'a Sheet,
    validation: &'a Sheet,
}

fn execute(
    config: &ValidatorConfig,
    request: &ValidationRequest,
    reader: Option<&dyn WorkbookReader>,
    run: &mut Run,
) -> Option<ModelData> {
    let model = check_inputs(request, run)?;
    run.advance(Stage::InputsChecked);

    let Some(reader) = reader else {
        run.push(CheckResult::fail(
            "SYS-01",
            "Spreadsheet reading capability available",
            "No spreadsheet reader is available; remaining checks skipped.",
        ));
        return None;
    };

    let workbook = match reader.read(model) {
        Ok(wb) => wb,
        Err(e) => {
            run.push(CheckResult::fail(
                "XLS-02",
                "Core workbook can be read",
                format!("{}: {e}", model.name),
            ));
            return None;
        }
    };

    let sheets = locate_sheets(config, &workbook, run)?;
    run.advance(Stage::SheetsLocated);

    check_filled(config, &sheets, run);
    let informe_date = check_informe(&sheets, model, reader, run);

    let route = parse_route(sheets.route, config);
    check_route(&route, run);

    let dimension = match parse_dimension(sheets.dimension, config) {
        Ok(table) => {
            check_dimension(&table, run);
            Some(table)
        }
        Err(e) => {
            run.push(CheckResult::fail("DIM-00", "DIMENSION: table structure", e.to_string()));
            None
        }
    };

    let validation = match parse_validation(sheets.validation, config) {
        Ok(table) => {
            run.push(CheckResult::gate(
                "VAL-01",
                "VALIDACIÓN: outbound/return tests truthy",
                table.not_truthy_count == 0,
                CheckStatus::Fail,
                if table.not_truthy_count == 0 {
                    "All rows truthy.".to_string()
                } else {
                    format!("Rows not truthy: {}", table.not_truthy_count)
                },
            ));
            run.push(CheckResult::gate(
                "VAL-02",
                "VALIDACIÓN: departure before arrival",
                table.time_bad_count == 0,
                CheckStatus::Warn,
                if table.time_bad_count == 0 {
                    "All rows in order.".to_string()
                } else {
                    format!("Rows with invalid times: {}", table.time_bad_count)
                },
            ));
            Some(ValidationSummary {
                not_truthy_count: table.not_truthy_count,
                time_bad_count: table.time_bad_count,
            })
        }
        Err(e) => {
            run.push(CheckResult::fail("VAL-00", "VALIDACIÓN: table structure", e.to_string()));
            None
        }
    };
    run.advance(Stage::DataParsed);

    let current = CurrentPeriod {
        route_count: route.route_count(),
        beneficiaries: route.beneficiaries_total,
        annual_budget: dimension.as_ref().map(|d| d.annual_budget_total),
    };
    let axis_code = route.ids.axis_code.as_deref();

    let reference = request
        .reference
        .as_ref()
        .map(|input| check_reference(config, reader, input, axis_code, &current, run));

    let historical = request.historical.as_ref().and_then(|input| {
        check_historical(config, reader, input, &route, &current, run)
    });

    if let Some(d) = &dimension {
        dimension_notes(d, config.scan.note_issue_limit, run);
    }
    run.advance(Stage::CrossChecked);

    Some(ModelData {
        ids: route.ids.clone(),
        routes: RouteSummary {
            count: route.route_count(),
            beneficiaries_total: route.beneficiaries_total,
            affiliated_codes: route.affiliated_codes.clone(),
        },
        header_coordinates: route.header_coordinates,
        informe_date,
        dimension: dimension.as_ref().map(|d| DimensionSummary {
            annual_budget_total: d.annual_budget_total,
            issue_count: d.issues.len(),
        }),
        validation,
        reference: reference.flatten(),
        historical,
    })
}

// ---------------------------------------------------------------------------
// Inputs and sheets
// ---------------------------------------------------------------------------

fn presence(input: Option<&InputFile>) -> String {
    input.map(|f| f.name.clone()).unwrap_or_default()
}

/// Memo name plus whether any text came out of it for field suggestions.
fn memo_detail(memo: &InputFile, request: &ValidationRequest) -> String {
    match request.memo_text.as_deref().map(str::trim) {
        Some(text) if !text.is_empty() => format!(
            "{} (text extracted, {} characters)",
            memo.name,
            text.chars().count()
        ),
        _ => format!("{} (no text extracted)", memo.name),
    }
}

fn check_inputs<'a>(request: &'a ValidationRequest, run: &mut Run) -> Option<&'a InputFile> {
    run.push(match &request.memo {
        Some(f) => CheckResult::ok("PDF-01", "Memo document supplied", memo_detail(f, request)),
        None => CheckResult::warn("PDF-01", "Memo document supplied", "Not supplied (optional)."),
    });

    let Some(model) = request.model.as_ref() else {
        run.push(CheckResult::fail(
            "XLS-01",
            "Core workbook supplied",
            "No modelling workbook (.xlsx/.xlsm) supplied.",
        ));
        return None;
    };
    run.push(CheckResult::ok("XLS-01", "Core workbook supplied", model.name.clone()));

    let optional = [
        ("REF-01", "Reference ranges (DAEI) supplied", request.reference.as_ref(), "Not supplied (recommended)."),
        ("HIS-01", "Historical baseline supplied", request.historical.as_ref(), "Not supplied (optional)."),
        ("CQX-01", "Auxiliary tables supplied", request.aux.as_ref(), "Not supplied (optional)."),
    ];
    for (code, description, input, missing) in optional {
        run.push(match input {
            Some(_) => CheckResult::ok(code, description, presence(input)),
            None => CheckResult::warn(code, description, missing),
        });
    }

    Some(model)
}

fn locate_sheets<'a>(
    config: &ValidatorConfig,
    workbook: &'a Workbook,
    run: &mut Run,
) -> Option<Sheets<'a>> {
    let names = &config.sheets;
    let mut find = move |code: &str, candidates: &[String]| {
        let label = candidates.first().map(String::as_str).unwrap_or(code);
        let description = format!("Mandatory sheet: {label}");
        let found = workbook.find_sheet_any(candidates);
        run.push(match found {
            Some(s) => CheckResult::ok(code, &description, format!("Found: {}", s.name)),
            None => CheckResult::fail(code, &description, "Not found."),
        });
        found
    };

    let informe = find("SHT-INF", &names.informe);
    let route = find("SHT-RUT", &names.route);
    let dimension = find("SHT-DIM", &names.dimension);
    let validation = find("SHT-VAL", &names.validation);

    Some(Sheets {
        informe: informe?,
        route: route?,
        dimension: dimension?,
        validation: validation?,
    })
}

fn check_filled(config: &ValidatorConfig, sheets: &Sheets<'_>, run: &mut Run) {
    let t = &config.thresholds;
    let rows = [
        ("DAT-INF", "INFORME: sheet has data", sheets.informe, t.informe_min_filled),
        ("DAT-RUT", "RUTA: sheet has data", sheets.route, t.route_min_filled),
        ("DAT-DIM", "DIMENSION: sheet has data", sheets.dimension, t.dimension_min_filled),
        ("DAT-VAL", "VALIDACIÓN: sheet has data", sheets.validation, t.validation_min_filled),
    ];
    for (code, description, sheet, minimum) in rows {
        let filled = sheet.filled_count();
        run.push(CheckResult::gate(
            code,
            description,
            filled >= minimum,
            CheckStatus::Fail,
            format!("Filled cells: {filled} (minimum {minimum})"),
        ));
    }
}

// ---------------------------------------------------------------------------
// INFORME
// ---------------------------------------------------------------------------

fn signature(name: &Option<String>, role: &Option<String>, cells: String) -> (bool, String) {
    let complete = name.is_some() && role.is_some();
    let detail = match (name, complete) {
        (Some(n), true) => n.clone(),
        (Some(n), false) => format!("{n} (role missing, {cells})"),
        (None, _) => format!("Missing {cells}"),
    };
    (complete, detail)
}

fn check_informe(
    sheets: &Sheets<'_>,
    model: &InputFile,
    reader: &dyn WorkbookReader,
    run: &mut Run,
) -> Option<String> {
    let fields = parse_informe(sheets.informe);

    run.push(match &fields.date {
        Some(date) => CheckResult::ok("INF-01", "INFORME: date (C2)", date.clone()),
        None => CheckResult::fail(
            "INF-01",
            "INFORME: date (C2)",
            format!("Missing date in {}.", informe::DATE_CELL),
        ),
    });

    let (ok, detail) = signature(
        &fields.developer_name,
        &fields.developer_role,
        format!("{}/{}", informe::DEVELOPER_NAME_CELL, informe::DEVELOPER_ROLE_CELL),
    );
    run.push(CheckResult::gate(
        "INF-02",
        "INFORME: prepared by (name/role)",
        ok,
        CheckStatus::Fail,
        detail,
    ));

    let (ok, detail) = signature(
        &fields.reviewer_name,
        &fields.reviewer_role,
        format!("{}/{}", informe::REVIEWER_NAME_CELL, informe::REVIEWER_ROLE_CELL),
    );
    run.push(CheckResult::gate(
        "INF-03",
        "INFORME: reviewed by (name/role)",
        ok,
        CheckStatus::Fail,
        detail,
    ));

    run.push(CheckResult::gate(
        "INF-04",
        "INFORME: 'MAPEO DE RUTAS' section",
        fields.has_map_label,
        CheckStatus::Fail,
        if fields.has_map_label { "Label found." } else { "Label not found." },
    ));

    const MAP: &str = "INFORME: map image (xl/media)";
    run.push(match reader.list_media(model) {
        Ok(media) if media.is_empty() => {
            CheckResult::fail("INF-05", MAP, "No embedded images found (a route map is expected).")
        }
        Ok(media) => CheckResult::ok("INF-05", MAP, format!("Images found: {}", media.len())),
        Err(e) => {
            warn!("cannot list media of '{}': {e}", model.name);
            let why = match e {
                ReadError::Unsupported(_) => "archive reading is not available",
                ReadError::Decode(_) => "the workbook archive could not be read",
            };
            CheckResult::warn("INF-05", MAP, format!("Images could not be verified: {why}."))
        }
    });

    fields.date
}

// ---------------------------------------------------------------------------
// RUTA
// ---------------------------------------------------------------------------

fn or_empty(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("(empty)")
}

fn row_list(route: &RouteTable, pred: impl Fn(&RouteIssueKind) -> bool) -> (usize, String) {
    let rows: Vec<String> = route
        .issues
        .iter()
        .filter(|i| pred(&i.kind))
        .map(|i| i.row_number.to_string())
        .collect();
    let shown: Vec<&str> = rows.iter().take(10).map(String::as_str).collect();
    let suffix = if rows.len() > shown.len() { ", ..." } else { "" };
    (rows.len(), format!("rows {}{suffix}", shown.join(", ")))
}

fn check_route(route: &RouteTable, run: &mut Run) {
    let ids = &route.ids;
    run.push(CheckResult::gate(
        "RUT-01",
        "RUTA: district (B3) and axis school code (B4)",
        ids.district.is_some() && ids.axis_code.is_some(),
        CheckStatus::Fail,
        format!("District={} | AMIE={}", or_empty(&ids.district), or_empty(&ids.axis_code)),
    ));

    let coords = route.header_coordinates;
    run.push(match (coords.x, coords.y) {
        (Some(x), Some(y)) => CheckResult::ok(
            "RUT-02",
            "RUTA: header coordinates (H6/H7)",
            format!("X={} | Y={}", format::number(x), format::number(y)),
        ),
        _ => CheckResult::fail(
            "RUT-02",
            "RUTA: header coordinates (H6/H7)",
            format!(
                "{}/{} missing or not numeric.",
                route::COORD_X_CELL,
                route::COORD_Y_CELL
            ),
        ),
    });

    run.push(CheckResult::gate(
        "RUT-03",
        "RUTA: route count and beneficiaries",
        route.route_count() > 0,
        CheckStatus::Fail,
        format!(
            "Routes={} | Beneficiaries={}",
            route.route_count(),
            format::number(route.beneficiaries_total)
        ),
    ));

    let (n, rows) = row_list(route, |k| matches!(k, RouteIssueKind::BeneficiarySum { .. }));
    run.push(CheckResult::gate(
        "RUT-04",
        "RUTA: beneficiary total equals level breakdown",
        n == 0,
        CheckStatus::Warn,
        if n == 0 {
            "No inconsistencies.".to_string()
        } else {
            format!("Rows with inconsistency: {n} ({rows})")
        },
    ));

    const COORDS: &str = "RUTA: per-route coordinates (X/Y)";
    if route.has_coordinate_columns {
        let (n, rows) = row_list(route, |k| *k == RouteIssueKind::MissingCoordinates);
        run.push(CheckResult::gate(
            "RUT-05",
            COORDS,
            n == 0,
            CheckStatus::Fail,
            if n == 0 {
                "All routes have X/Y.".to_string()
            } else {
                format!("Routes with missing X/Y or #N/D: {n} ({rows})")
            },
        ));
    } else {
        run.push(CheckResult::warn("RUT-05", COORDS, "Coordinate columns not found."));
    }

    const DISTANCE: &str = "RUTA: numeric linear distance";
    if route.has_distance_column {
        let (n, rows) = row_list(route, |k| *k == RouteIssueKind::MissingDistance);
        run.push(CheckResult::gate(
            "RUT-06",
            DISTANCE,
            n == 0,
            CheckStatus::Warn,
            if n == 0 {
                "All routes have a distance.".to_string()
            } else {
                format!("Routes with invalid linear distance: {n} ({rows})")
            },
        ));
    } else {
        run.push(CheckResult::warn("RUT-06", DISTANCE, "Linear distance column not found."));
    }
}

// ---------------------------------------------------------------------------
// DIMENSION
// ---------------------------------------------------------------------------

fn check_dimension(table: &DimensionTable, run: &mut Run) {
    let n = table.issues.len();
    run.push(CheckResult::gate(
        "DIM-01",
        "DIMENSION: schedule, cost and budget consistency",
        n == 0,
        CheckStatus::Warn,
        if n == 0 {
            "No observations.".to_string()
        } else {
            format!("Observations: {n} (see technical notes)")
        },
    ));
    run.push(CheckResult::gate(
        "DIM-02",
        "DIMENSION: annual budget total",
        table.annual_budget_total > 0.0,
        CheckStatus::Warn,
        format!("Annual budget total: {}", format::amount(table.annual_budget_total)),
    ));
}

fn dimension_notes(table: &DimensionTable, limit: usize, run: &mut Run) {
    if table.issues.is_empty() {
        return;
    }
    run.notes.push("DIMENSION observations:".to_string());
    for issue in table.issues.iter().take(limit) {
        run.notes.push(issue.to_string());
    }
    if table.issues.len() > limit {
        run.notes.push(format!("(and {} more)", table.issues.len() - limit));
    }
}

// ---------------------------------------------------------------------------
// Cross-checks
// ---------------------------------------------------------------------------

/// Decode an auxiliary workbook and hand its first sheet to `parse`.
fn parse_first_sheet<T>(
    reader: &dyn WorkbookReader,
    input: &InputFile,
    parse: impl FnOnce(&Sheet) -> Result<T, ParseError>,
) -> Result<T, ParseError> {
    let workbook = reader.read(input).map_err(|e| ParseError::Decode {
        input: input.name.clone(),
        message: e.to_string(),
    })?;
    let sheet = workbook.first_sheet().ok_or_else(|| ParseError::EmptyWorkbook {
        input: input.name.clone(),
    })?;
    parse(sheet)
}

fn check_reference(
    config: &ValidatorConfig,
    reader: &dyn WorkbookReader,
    input: &InputFile,
    axis_code: Option<&str>,
    current: &CurrentPeriod,
    run: &mut Run,
) -> Option<ReferenceSummary> {
    let table = match parse_first_sheet(reader, input, |s| parse_reference(s, config)) {
        Ok(t) => t,
        Err(e) => {
            warn!("reference table unusable: {e}");
            run.push(CheckResult::warn("DAEI-00", "DAEI: reference table structure", e.to_string()));
            return None;
        }
    };

    const FOUND: &str = "DAEI: axis school code found";
    let Some(code) = axis_code else {
        run.push(CheckResult::warn("DAEI-01", FOUND, "Axis school code (B4) is empty."));
        return Some(ReferenceSummary {
            range: None,
            verdict: RangeVerdict::Unresolved,
        });
    };

    let range = table.lookup(code).copied();
    let verdict = check_range(current.beneficiaries, range.as_ref());
    let total = format::number(current.beneficiaries);

    const WITHIN: &str = "DAEI: beneficiaries within range";
    match (&verdict, &range) {
        (RangeVerdict::Unresolved, _) | (_, None) => run.push(CheckResult::warn(
            "DAEI-01",
            FOUND,
            format!("AMIE {code} not found in the reference table."),
        )),
        (RangeVerdict::Complies, Some(r)) => run.push(CheckResult::ok(
            "DAEI-02",
            WITHIN,
            format!("Total={total} | Range={}-{}", format::number(r.min), format::number(r.max)),
        )),
        (RangeVerdict::Exceeds { delta } | RangeVerdict::Below { delta }, Some(r)) => {
            run.push(CheckResult::warn(
                "DAEI-02",
                WITHIN,
                format!(
                    "Total={total} | Range={}-{} | {} by {}",
                    format::number(r.min),
                    format::number(r.max),
                    verdict,
                    format::signed(*delta)
                ),
            ))
        }
    }

    Some(ReferenceSummary { range, verdict })
}

fn check_historical(
    config: &ValidatorConfig,
    reader: &dyn WorkbookReader,
    input: &InputFile,
    route: &RouteTable,
    current: &CurrentPeriod,
    run: &mut Run,
) -> Option<HistoricalSummary> {
    let table = match parse_first_sheet(reader, input, |s| parse_historical(s, config)) {
        Ok(t) => t,
        Err(e) => {
            warn!("historical table unusable: {e}");
            run.push(CheckResult::warn("CMP-00", "Historical: table structure", e.to_string()));
            return None;
        }
    };

    const EXISTS: &str = "Historical: record for district and axis school code";
    let Some(code) = route.ids.axis_code.as_deref() else {
        run.push(CheckResult::warn("CMP-01", EXISTS, "Axis school code (B4) is empty."));
        return None;
    };
    let Some(aggregate) = table.lookup(route.ids.district.as_deref(), code) else {
        run.push(CheckResult::warn(
            "CMP-01",
            EXISTS,
            format!("No record for {} / {code}.", or_empty(&route.ids.district)),
        ));
        return None;
    };

    let year = aggregate
        .reference_year
        .as_ref()
        .map(|y| format!(", {y}"))
        .unwrap_or_default();
    run.push(CheckResult::ok(
        "CMP-01",
        EXISTS,
        format!("Matches: {} rows{year}", aggregate.row_count),
    ));

    let delta = compare_historical(current, aggregate);

    run.push(CheckResult::gate(
        "CMP-02",
        "Historical: route count vs prior period",
        delta.route_delta == 0,
        CheckStatus::Warn,
        format!(
            "Historical={} | Current={} | Δ={}",
            aggregate.route_count,
            current.route_count,
            format::signed(delta.route_delta as f64)
        ),
    ));
    if delta.route_delta != 0 {
        run.notes.push(format!(
            "Routes: historical {} vs current {} (Δ {}).",
            aggregate.route_count,
            current.route_count,
            format::signed(delta.route_delta as f64)
        ));
    }

    const BENEFICIARIES: &str = "Historical: beneficiaries vs prior period";
    match (aggregate.beneficiaries, delta.beneficiary_delta) {
        (Some(then), Some(d)) => {
            let line = format!(
                "Historical={} | Current={} | Δ={}",
                format::number(then),
                format::number(current.beneficiaries),
                format::signed(d)
            );
            run.push(CheckResult::ok("CMP-03", BENEFICIARIES, line));
            run.notes.push(format!(
                "Beneficiaries: historical {} vs current {} (Δ {}).",
                format::number(then),
                format::number(current.beneficiaries),
                format::signed(d)
            ));
        }
        _ => run.push(CheckResult::ok(
            "CMP-03",
            BENEFICIARIES,
            "No beneficiary figures in the historical record.",
        )),
    }

    const BUDGET: &str = "Historical: annual budget vs prior period";
    match (aggregate.annual_budget, current.annual_budget, delta.budget_delta) {
        (Some(then), Some(now), Some(d)) => {
            let pct = delta
                .budget_variation_pct
                .map(|p| format!("{p:+.2}%"))
                .unwrap_or_else(|| "n/a".to_string());
            run.push(CheckResult::ok(
                "CMP-04",
                BUDGET,
                format!(
                    "Historical={} | Current={} | Δ={} ({pct})",
                    format::amount(then),
                    format::amount(now),
                    format::signed(d)
                ),
            ));
            run.notes.push(format!(
                "Annual budget: historical {} vs current {} (Δ {}, {pct}).",
                format::amount(then),
                format::amount(now),
                format::signed(d)
            ));
        }
        _ => run.push(CheckResult::warn(
            "CMP-04",
            BUDGET,
            "Annual budget not available on both sides.",
        )),
    }

    Some(HistoricalSummary {
        aggregate: aggregate.clone(),
        delta,
    })
}
