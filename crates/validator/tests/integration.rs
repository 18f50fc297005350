use std::collections::HashMap;

use chrono::NaiveDate;
use modelcheck_engine::{CellValue, Sheet, Workbook};
use modelcheck_validator::model::{RangeVerdict, Stage};
use modelcheck_validator::{
    run, CheckStatus, InputFile, InputRole, MemoFields, ReadError, RunSession, ValidationReport,
    ValidationRequest, ValidatorConfig, ValidatorError, WorkbookReader,
};

// -------------------------------------------------------------------------
// Fake backend
// -------------------------------------------------------------------------

#[derive(Default)]
struct FakeReader {
    workbooks: HashMap<String, Workbook>,
    media: Option<Vec<String>>,
}

impl FakeReader {
    fn with(mut self, name: &str, workbook: Workbook) -> Self {
        self.workbooks.insert(name.to_string(), workbook);
        self
    }
}

impl WorkbookReader for FakeReader {
    fn read(&self, input: &InputFile) -> Result<Workbook, ReadError> {
        self.workbooks
            .get(&input.name)
            .cloned()
            .ok_or_else(|| ReadError::Decode(format!("not a workbook: {}", input.name)))
    }

    fn list_media(&self, _input: &InputFile) -> Result<Vec<String>, ReadError> {
        self.media
            .clone()
            .ok_or_else(|| ReadError::Unsupported("no archive access".into()))
    }
}

// -------------------------------------------------------------------------
// Fixtures
// -------------------------------------------------------------------------

fn fill(sheet: &mut Sheet, row: usize, cells: &[&str]) {
    for (c, v) in cells.iter().enumerate() {
        sheet.set_value(row, c, v);
    }
}

fn informe() -> Sheet {
    let mut s = Sheet::new("INFORME");
    s.set(1, 2, CellValue::Number(45658.0));
    for r in 4..36 {
        s.set_value(r, 1, &format!("Párrafo {r}"));
    }
    s.set_value(40, 0, "5. MAPEO DE RUTAS");
    fill(&mut s, 104, &["Ana Pérez", "", "Analista distrital"]);
    fill(&mut s, 107, &["Luis Mora", "", "Director distrital"]);
    s
}

/// `(total, [initial, basic, high_school])` per route.
fn ruta(routes: &[(u32, [u32; 3])]) -> Sheet {
    let mut s = Sheet::new("RUTA");
    for c in 0..9 {
        s.set_value(0, c, &format!("Campo {c}"));
    }
    s.set_value(2, 1, "D01");
    s.set_value(3, 1, "01H00001");
    s.set_value(5, 7, "712345");
    s.set_value(6, 7, "9876543");
    fill(
        &mut s,
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
            "DISTANCIA LINEAL",
        ],
    );
    for (i, (total, [a, b, c])) in routes.iter().enumerate() {
        let id = (i + 1).to_string();
        let afc = format!("01H0000{}", i % 2 + 2);
        fill(
            &mut s,
            9 + i,
            &[
                &id,
                &afc,
                &total.to_string(),
                &a.to_string(),
                &b.to_string(),
                &c.to_string(),
                "712000",
                "9870000",
                "4,2",
            ],
        );
    }
    s
}

fn default_routes() -> Vec<(u32, [u32; 3])> {
    vec![(30, [10, 10, 10]), (25, [5, 10, 10]), (20, [5, 5, 10])]
}

/// `(monthly, annual)` per route.
fn dimension(budgets: &[(&str, &str)]) -> Sheet {
    let mut s = Sheet::new("DIMENSION");
    fill(
        &mut s,
        4,
        &[
            "RUTA",
            "PRESUPUESTO MENSUAL",
            "PRESUPUESTO ANUAL",
            "HORA DE SALIDA 1",
            "HORA DE LLEGADA 1",
            "HORA DE SALIDA 2",
            "HORA DE LLEGADA 2",
            "TIEMPO INICIO",
            "TIEMPO RETORNO",
            "% OPTIMIZACIÓN",
            "COSTO UNITARIO",
        ],
    );
    for (i, (monthly, annual)) in budgets.iter().enumerate() {
        let id = (i + 1).to_string();
        fill(
            &mut s,
            5 + i,
            &[&id, monthly, annual, "06:00", "07:00", "13:00", "14:00", "0:30", "0:30", "85", "2,5"],
        );
    }
    s
}

fn default_budgets() -> Vec<(&'static str, &'static str)> {
    vec![("1000", "10000"), ("800", "8000"), ("500", "5000")]
}

fn validacion(flags: &[&str]) -> Sheet {
    let mut s = Sheet::new("VALIDACIÓN");
    fill(
        &mut s,
        1,
        &["RUTA", "HORA DE SALIDA", "HORA DE LLEGADA", "TEST IDA", "TEST RETORNO"],
    );
    for (i, flag) in flags.iter().enumerate() {
        let id = (i + 1).to_string();
        fill(&mut s, 2 + i, &[&id, "06:00", "07:00", "VERDADERO", flag]);
    }
    s
}

struct Model {
    informe: Sheet,
    ruta: Sheet,
    dimension: Option<Sheet>,
    validacion: Sheet,
}

impl Model {
    fn valid() -> Self {
        Self {
            informe: informe(),
            ruta: ruta(&default_routes()),
            dimension: Some(dimension(&default_budgets())),
            validacion: validacion(&["VERDADERO", "TRUE", "SI"]),
        }
    }

    fn workbook(self) -> Workbook {
        let mut wb = Workbook::new();
        wb.add_sheet(self.informe);
        wb.add_sheet(self.ruta);
        if let Some(d) = self.dimension {
            wb.add_sheet(d);
        }
        wb.add_sheet(self.validacion);
        wb
    }
}

fn single_sheet(name: &str, rows: &[&[&str]]) -> Workbook {
    let mut s = Sheet::new(name);
    for (r, row) in rows.iter().enumerate() {
        fill(&mut s, r, row);
    }
    Workbook::from_sheets(vec![s])
}

fn reference(code: &str, min: &str, max: &str) -> Workbook {
    single_sheet(
        "DAEI",
        &[
            &["BASE DE RANGOS"],
            &["AMIE", "NOMBRE", "Mínimo_F", "Máximo_F"],
            &[code, "UE Fiscal", min, max],
        ],
    )
}

fn historical() -> Workbook {
    single_sheet(
        "Base 2025",
        &[
            &["DISTRITO", "AMIE EJE", "RUTA", "AMIE AFC", "BENEFICIARIOS", "PRESUPUESTO ANUAL", "AÑO LECTIVO"],
            &["D01", "01H00001", "1", "01H00002", "40", "10000", "2024-2025"],
            &["D01", "01H00001", "2", "01H00003", "40", "10000", "2024-2025"],
        ],
    )
}

fn input(name: &str) -> Option<InputFile> {
    Some(InputFile::new(name, vec![0x50, 0x4b, 0x03, 0x04]))
}

fn reader_for(model: Model) -> FakeReader {
    FakeReader {
        media: Some(vec!["xl/media/image1.png".into()]),
        ..Default::default()
    }
    .with("model.xlsx", model.workbook())
}

fn model_only() -> ValidationRequest {
    ValidationRequest {
        model: input("model.xlsx"),
        ..Default::default()
    }
}

fn run_with(request: &ValidationRequest, reader: &FakeReader) -> ValidationReport {
    run(&ValidatorConfig::default(), request, Some(reader))
}

fn status(report: &ValidationReport, code: &str) -> CheckStatus {
    report
        .check(code)
        .unwrap_or_else(|| panic!("missing check {code}"))
        .status
}

fn codes(report: &ValidationReport) -> Vec<&str> {
    report.checks.iter().map(|c| c.code.as_str()).collect()
}

// -------------------------------------------------------------------------
// End-to-end scenarios
// -------------------------------------------------------------------------

#[test]
fn valid_model_without_optional_inputs_is_warn() {
    let report = run_with(&model_only(), &reader_for(Model::valid()));

    assert_eq!(report.stage, Stage::Done);
    assert_eq!(report.overall, CheckStatus::Warn);
    assert!(report.generation_permitted());

    let warned: Vec<&str> = report
        .checks
        .iter()
        .filter(|c| c.status != CheckStatus::Ok)
        .map(|c| c.code.as_str())
        .collect();
    assert_eq!(warned, vec!["PDF-01", "REF-01", "HIS-01", "CQX-01"]);

    let model = report.model_data.as_ref().unwrap();
    assert_eq!(model.ids.district.as_deref(), Some("D01"));
    assert_eq!(model.routes.count, 3);
    assert_eq!(model.routes.beneficiaries_total, 75.0);
    assert_eq!(model.dimension.as_ref().unwrap().annual_budget_total, 23_000.0);
    assert_eq!(model.informe_date.as_deref(), Some("2025-01-01"));
    assert!(model.reference.is_none());
    assert!(model.historical.is_none());
}

#[test]
fn checklist_order_is_fixed() {
    let request = ValidationRequest {
        memo: input("memo.pdf"),
        reference: input("ref.xlsx"),
        historical: input("hist.xlsx"),
        aux: input("aux.xlsx"),
        ..model_only()
    };
    let reader = reader_for(Model::valid())
        .with("ref.xlsx", reference("01H00001", "50", "100"))
        .with("hist.xlsx", historical());
    let report = run_with(&request, &reader);

    assert_eq!(
        codes(&report),
        vec![
            "PDF-01", "XLS-01", "REF-01", "HIS-01", "CQX-01", "SHT-INF", "SHT-RUT", "SHT-DIM",
            "SHT-VAL", "DAT-INF", "DAT-RUT", "DAT-DIM", "DAT-VAL", "INF-01", "INF-02", "INF-03",
            "INF-04", "INF-05", "RUT-01", "RUT-02", "RUT-03", "RUT-04", "RUT-05", "RUT-06",
            "DIM-01", "DIM-02", "VAL-01", "VAL-02", "DAEI-02", "CMP-01", "CMP-02", "CMP-03",
            "CMP-04",
        ]
    );
}

#[test]
fn missing_dimension_sheet_halts_without_dimension_results() {
    let model = Model {
        dimension: None,
        ..Model::valid()
    };
    let report = run_with(&model_only(), &reader_for(model));

    assert_eq!(status(&report, "SHT-DIM"), CheckStatus::Fail);
    assert_eq!(status(&report, "SHT-INF"), CheckStatus::Ok);
    assert_eq!(status(&report, "SHT-VAL"), CheckStatus::Ok);
    assert!(report.checks.iter().all(|c| !c.code.starts_with("DIM-")));
    assert!(report.checks.iter().all(|c| !c.code.starts_with("DAT-")));
    assert_eq!(report.checks.last().unwrap().code, "SHT-VAL");
    assert_eq!(report.stage, Stage::InputsChecked);
    assert!(report.halted());
    assert!(report.model_data.is_none());
    assert_eq!(report.overall, CheckStatus::Fail);
}

#[test]
fn missing_core_workbook_halts_immediately() {
    let report = run_with(&ValidationRequest::default(), &FakeReader::default());
    assert_eq!(codes(&report), vec!["PDF-01", "XLS-01"]);
    assert_eq!(status(&report, "XLS-01"), CheckStatus::Fail);
    assert_eq!(report.stage, Stage::Init);
}

#[test]
fn missing_reader_is_environment_failure() {
    let report = run(&ValidatorConfig::default(), &model_only(), None);
    assert_eq!(report.checks.last().unwrap().code, "SYS-01");
    assert_eq!(status(&report, "SYS-01"), CheckStatus::Fail);
    assert_eq!(report.stage, Stage::InputsChecked);
}

#[test]
fn undecodable_workbook_fails_with_detail() {
    let report = run_with(&model_only(), &FakeReader::default());
    let check = report.check("XLS-02").unwrap();
    assert_eq!(check.status, CheckStatus::Fail);
    assert!(check.detail.contains("model.xlsx"));
}

#[test]
fn rerun_is_deterministic() {
    let request = ValidationRequest {
        reference: input("ref.xlsx"),
        historical: input("hist.xlsx"),
        ..model_only()
    };
    let mut model = Model::valid();
    model.dimension = Some(dimension(&[("1000", "12000"), ("0", "100"), ("", "")]));
    let reader = reader_for(model)
        .with("ref.xlsx", reference("01H00001", "50", "60"))
        .with("hist.xlsx", historical());

    let a = run_with(&request, &reader);
    let b = run_with(&request, &reader);
    assert_eq!(a.checks, b.checks);
    assert_eq!(a.notes, b.notes);
    assert_eq!(a, b);
}

// -------------------------------------------------------------------------
// Tolerances and invariants
// -------------------------------------------------------------------------

#[test]
fn beneficiary_sum_tolerance() {
    let within = Model {
        ruta: ruta(&[(100, [40, 40, 20])]),
        ..Model::valid()
    };
    let report = run_with(&model_only(), &reader_for(within));
    assert_eq!(status(&report, "RUT-04"), CheckStatus::Ok);

    let off = Model {
        ruta: ruta(&[(100, [40, 40, 21])]),
        ..Model::valid()
    };
    let report = run_with(&model_only(), &reader_for(off));
    let check = report.check("RUT-04").unwrap();
    assert_eq!(check.status, CheckStatus::Warn);
    assert!(check.detail.contains("rows 10"));
}

#[test]
fn configured_tolerance_is_honored() {
    let off = Model {
        ruta: ruta(&[(100, [40, 40, 21])]),
        ..Model::valid()
    };
    let config = ValidatorConfig::from_toml("[tolerance]\nbeneficiary_sum = 1.0\n").unwrap();
    let reader = reader_for(off);
    let report = run(&config, &model_only(), Some(&reader));
    assert_eq!(status(&report, "RUT-04"), CheckStatus::Ok);
}

#[test]
fn budget_ratio_outside_band_is_reported_with_ratio() {
    let model = Model {
        dimension: Some(dimension(&[("100", "1200"), ("100", "1000")])),
        ..Model::valid()
    };
    let report = run_with(&model_only(), &reader_for(model));

    let check = report.check("DIM-01").unwrap();
    assert_eq!(check.status, CheckStatus::Warn);
    assert_eq!(check.detail, "Observations: 1 (see technical notes)");
    assert_eq!(report.notes[0], "DIMENSION observations:");
    assert!(report.notes[1].contains("Route 1"));
    assert!(report.notes[1].contains("ratio 12.00"));
    assert_eq!(report.overall, CheckStatus::Warn);
}

#[test]
fn dimension_notes_are_capped() {
    let budgets: Vec<(&str, &str)> = (0..15).map(|_| ("100", "5000")).collect();
    let model = Model {
        dimension: Some(dimension(&budgets)),
        ..Model::valid()
    };
    let report = run_with(&model_only(), &reader_for(model));
    assert_eq!(report.notes.len(), 1 + 12 + 1);
    assert_eq!(report.notes.last().unwrap(), "(and 3 more)");
}

#[test]
fn falsy_validation_flag_fails_and_blocks_generation() {
    let model = Model {
        validacion: validacion(&["VERDADERO", "FALSO", "VERDADERO"]),
        ..Model::valid()
    };
    let report = run_with(&model_only(), &reader_for(model));
    assert_eq!(status(&report, "VAL-01"), CheckStatus::Fail);
    assert_eq!(report.check("VAL-01").unwrap().detail, "Rows not truthy: 1");
    assert_eq!(report.overall, CheckStatus::Fail);
    assert!(!report.generation_permitted());
}

#[test]
fn missing_validation_header_is_structural_fail() {
    let mut broken = Sheet::new("VALIDACIÓN");
    for r in 0..25 {
        broken.set_value(r, 0, "sin tabla");
    }
    let model = Model {
        validacion: broken,
        ..Model::valid()
    };
    let report = run_with(&model_only(), &reader_for(model));
    assert_eq!(status(&report, "VAL-00"), CheckStatus::Fail);
    assert!(report.check("VAL-01").is_none());
    assert_eq!(report.stage, Stage::Done);
}

#[test]
fn unverifiable_media_is_warn() {
    let mut reader = reader_for(Model::valid());
    reader.media = None;
    let report = run_with(&model_only(), &reader);
    assert_eq!(status(&report, "INF-05"), CheckStatus::Warn);

    reader.media = Some(vec![]);
    let report = run_with(&model_only(), &reader);
    assert_eq!(status(&report, "INF-05"), CheckStatus::Fail);
}

// -------------------------------------------------------------------------
// Cross-checks
// -------------------------------------------------------------------------

fn with_reference(routes: &[(u32, [u32; 3])], code: &str) -> ValidationReport {
    let request = ValidationRequest {
        reference: input("ref.xlsx"),
        ..model_only()
    };
    let model = Model {
        ruta: ruta(routes),
        ..Model::valid()
    };
    let reader = reader_for(model).with("ref.xlsx", reference(code, "50", "100"));
    run_with(&request, &reader)
}

fn verdict(report: &ValidationReport) -> RangeVerdict {
    report
        .model_data
        .as_ref()
        .and_then(|m| m.reference.as_ref())
        .map(|r| r.verdict)
        .unwrap()
}

#[test]
fn reference_range_complies() {
    let report = with_reference(&[(75, [25, 25, 25])], "01H00001");
    assert_eq!(status(&report, "DAEI-02"), CheckStatus::Ok);
    assert_eq!(verdict(&report), RangeVerdict::Complies);
}

#[test]
fn reference_range_exceeded_reports_signed_delta() {
    let report = with_reference(&[(120, [40, 40, 40])], "01H00001");
    let check = report.check("DAEI-02").unwrap();
    assert_eq!(check.status, CheckStatus::Warn);
    assert!(check.detail.contains("+20"), "{}", check.detail);
    assert_eq!(verdict(&report), RangeVerdict::Exceeds { delta: 20.0 });
    assert_ne!(report.overall, CheckStatus::Fail);
}

#[test]
fn reference_range_below() {
    let report = with_reference(&[(10, [5, 5, 0])], "01H00001");
    assert_eq!(status(&report, "DAEI-02"), CheckStatus::Warn);
    assert_eq!(verdict(&report), RangeVerdict::Below { delta: -40.0 });
}

#[test]
fn unknown_code_is_unresolved_not_failed() {
    let report = with_reference(&[(75, [25, 25, 25])], "01H09999");
    assert_eq!(status(&report, "DAEI-01"), CheckStatus::Warn);
    assert!(report.check("DAEI-02").is_none());
    assert_eq!(verdict(&report), RangeVerdict::Unresolved);
}

#[test]
fn unreadable_reference_is_warn() {
    let request = ValidationRequest {
        reference: input("ref.xlsx"),
        ..model_only()
    };
    let reader = reader_for(Model::valid()).with("ref.xlsx", single_sheet("x", &[&["nada"]]));
    let report = run_with(&request, &reader);
    assert_eq!(status(&report, "DAEI-00"), CheckStatus::Warn);
    assert_eq!(report.stage, Stage::Done);
}

#[test]
fn historical_comparison() {
    let request = ValidationRequest {
        historical: input("hist.xlsx"),
        ..model_only()
    };
    let reader = reader_for(Model::valid()).with("hist.xlsx", historical());
    let report = run_with(&request, &reader);

    assert_eq!(status(&report, "CMP-01"), CheckStatus::Ok);
    let routes = report.check("CMP-02").unwrap();
    assert_eq!(routes.status, CheckStatus::Warn);
    assert_eq!(routes.detail, "Historical=2 | Current=3 | Δ=+1");
    assert_eq!(status(&report, "CMP-03"), CheckStatus::Ok);
    assert!(report.check("CMP-03").unwrap().detail.contains("Δ=-5"));
    let budget = report.check("CMP-04").unwrap();
    assert_eq!(budget.status, CheckStatus::Ok);
    assert!(budget.detail.contains("+15.00%"), "{}", budget.detail);

    let h = report.model_data.as_ref().unwrap().historical.as_ref().unwrap();
    assert_eq!(h.delta.route_delta, 1);
    assert_eq!(h.delta.budget_delta, Some(3000.0));
    assert!(report.notes.iter().any(|n| n.starts_with("Routes: historical 2 vs current 3")));
}

#[test]
fn historical_without_match_is_warn() {
    let request = ValidationRequest {
        historical: input("hist.xlsx"),
        ..model_only()
    };
    let mut model = Model::valid();
    model.ruta.set_value(3, 1, "01H05555");
    let reader = reader_for(model).with("hist.xlsx", historical());
    let report = run_with(&request, &reader);
    assert_eq!(status(&report, "CMP-01"), CheckStatus::Warn);
    assert!(report.check("CMP-02").is_none());
}

// -------------------------------------------------------------------------
// Session
// -------------------------------------------------------------------------

#[test]
fn session_validates_then_generates() {
    let reader = reader_for(Model::valid());
    let mut session = RunSession::new(ValidatorConfig::default());
    session.load(InputRole::Model, InputFile::new("model.xlsx", vec![1]));

    let overall = session.validate(Some(&reader)).overall;
    assert_eq!(overall, CheckStatus::Warn);
    assert!(session.can_generate());

    let mut fields = MemoFields::default();
    fields.assign("memo_nro=MINEDUC-CZ1-2026-00123-M").unwrap();
    let date = NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();
    let doc = session.generate(&fields, None, date).unwrap();
    assert_eq!(doc.verdict, "Generated with observations");
    assert_eq!(doc.slots.get("total_rutas"), Some("3"));
    assert_eq!(doc.slots.get("amie_eje"), Some("01H00001"));
    assert_eq!(doc.slots.get("presupuesto_anual"), Some("23,000.00"));
    assert!(doc.text.contains("Memo: MINEDUC-CZ1-2026-00123-M"));

    session.load(InputRole::Aux, InputFile::new("aux.xlsx", vec![2]));
    assert!(matches!(
        session.generate(&fields, None, date),
        Err(ValidatorError::NotValidated)
    ));
}

#[test]
fn report_json_shape() {
    let report = run_with(&model_only(), &reader_for(Model::valid()));
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["stage"], "done");
    assert_eq!(json["overall"], "WARN");
    assert_eq!(json["counts"]["warn"], 4);
    assert_eq!(json["checks"][0]["code"], "PDF-01");
    assert_eq!(json["checks"][0]["status"], "WARN");
    assert_eq!(json["meta"]["inputs"][0]["role"], "model");
    assert_eq!(json["model_data"]["routes"]["count"], 3);
}

#[test]
fn memo_detail_reports_text_extraction() {
    let mut request = ValidationRequest {
        memo: input("memo.pdf"),
        ..model_only()
    };
    let reader = reader_for(Model::valid());

    let report = run_with(&request, &reader);
    let pdf = report.check("PDF-01").unwrap();
    assert_eq!(pdf.status, CheckStatus::Ok);
    assert_eq!(pdf.detail, "memo.pdf (no text extracted)");

    request.memo_text = Some("  Memorando Nro. X-M  ".into());
    let report = run_with(&request, &reader);
    assert_eq!(report.check("PDF-01").unwrap().detail, "memo.pdf (text extracted, 18 characters)");
}

#[test]
fn memo_text_invalidates_session_report() {
    let mut session = RunSession::new(ValidatorConfig::default());
    session.load(InputRole::Model, input("model.xlsx").unwrap());
    session.load(InputRole::Memo, input("memo.pdf").unwrap());
    let reader = reader_for(Model::valid());
    session.validate(Some(&reader));
    assert!(session.can_generate());

    session.set_memo_text(Some("Asunto: remisión del modelo".into()));
    assert!(session.last_report().is_none());
    assert!(!session.can_generate());

    let report = session.validate(Some(&reader));
    assert!(report.check("PDF-01").unwrap().detail.contains("text extracted"));
}
