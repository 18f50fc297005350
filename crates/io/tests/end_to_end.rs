//! Real `.xlsx` bytes through calamine, the rule engine and the exporters.

use chrono::NaiveDate;
use modelcheck_io::report::{export_filled_aux, export_report};
use modelcheck_io::xlsx::decode;
use modelcheck_io::CalamineReader;
use modelcheck_validator::model::Stage;
use modelcheck_validator::{
    run, CheckStatus, InputFile, MemoFields, ValidationRequest, ValidatorConfig,
};
use rust_xlsxwriter::{Image, Workbook, Worksheet};
use tempfile::tempdir;

const PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52,
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F, 0x15, 0xC4,
    0x89, 0x00, 0x00, 0x00, 0x0A, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00, 0x01, 0x00, 0x00,
    0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE,
    0x42, 0x60, 0x82,
];

enum Value<'a> {
    S(&'a str),
    N(f64),
}
use Value::{N, S};

fn row(ws: &mut Worksheet, r: u32, values: &[Value<'_>]) {
    for (c, v) in values.iter().enumerate() {
        match v {
            S(s) => ws.write_string(r, c as u16, *s).unwrap(),
            N(n) => ws.write_number(r, c as u16, *n).unwrap(),
        };
    }
}

fn model_bytes(with_map: bool) -> Vec<u8> {
    let mut wb = Workbook::new();

    let ws = wb.add_worksheet();
    ws.set_name("INFORME").unwrap();
    ws.write_number(1, 2, 45658.0).unwrap();
    for r in 4..36 {
        ws.write_string(r, 1, format!("Texto del informe {r}")).unwrap();
    }
    ws.write_string(40, 0, "5. MAPEO DE RUTAS").unwrap();
    row(ws, 104, &[S("Ana Pérez"), S(""), S("Analista")]);
    row(ws, 107, &[S("Luis Mora"), S(""), S("Director")]);
    if with_map {
        ws.insert_image(42, 0, &Image::new_from_buffer(PNG).unwrap()).unwrap();
    }

    let ws = wb.add_worksheet();
    ws.set_name("RUTA").unwrap();
    ws.write_string(2, 1, "D01").unwrap();
    ws.write_string(3, 1, "01H00001").unwrap();
    ws.write_number(5, 7, 712345.0).unwrap();
    ws.write_number(6, 7, 9876543.0).unwrap();
    row(
        ws,
        8,
        &[
            S("RUTA"),
            S("AMIE IE FUSIONADA"),
            S("BENEFICIARIOS POR RUTA"),
            S("INICIAL"),
            S("EGB"),
            S("BACHILLERATO"),
            S("COORDENADA X"),
            S("COORDENADA Y"),
            S("DISTANCIA LINEAL"),
        ],
    );
    for i in 0..3u32 {
        row(
            ws,
            9 + i,
            &[
                N(f64::from(i + 1)),
                S("01H00002"),
                N(30.0),
                N(10.0),
                N(10.0),
                N(10.0),
                N(712000.0),
                N(9870000.0),
                S("4,5"),
            ],
        );
    }

    let ws = wb.add_worksheet();
    ws.set_name("DIMENSION").unwrap();
    row(
        ws,
        4,
        &[
            S("RUTA"),
            S("PRESUPUESTO MENSUAL"),
            S("PRESUPUESTO ANUAL"),
            S("HORA DE SALIDA 1"),
            S("HORA DE LLEGADA 1"),
            S("HORA DE SALIDA 2"),
            S("HORA DE LLEGADA 2"),
            S("TIEMPO INICIO"),
            S("TIEMPO RETORNO"),
            S("% OPTIMIZACIÓN"),
            S("COSTO UNITARIO"),
        ],
    );
    for i in 0..3u32 {
        // Times as day fractions, the way spreadsheets store them
        row(
            ws,
            5 + i,
            &[
                N(f64::from(i + 1)),
                N(1000.0),
                N(10000.0),
                N(0.25),
                N(7.0 / 24.0),
                N(13.0 / 24.0),
                N(14.0 / 24.0),
                N(0.5 / 24.0),
                N(0.5 / 24.0),
                N(85.0),
                N(2.5),
            ],
        );
    }

    let ws = wb.add_worksheet();
    ws.set_name("VALIDACIÓN").unwrap();
    row(
        ws,
        1,
        &[S("RUTA"), S("HORA DE SALIDA"), S("HORA DE LLEGADA"), S("TEST IDA"), S("TEST RETORNO")],
    );
    for i in 0..3u32 {
        ws.write_number(2 + i, 0, f64::from(i + 1)).unwrap();
        ws.write_number(2 + i, 1, 0.25).unwrap();
        ws.write_number(2 + i, 2, 7.0 / 24.0).unwrap();
        ws.write_boolean(2 + i, 3, true).unwrap();
        ws.write_string(2 + i, 4, "Verdadero").unwrap();
    }

    wb.save_to_buffer().unwrap()
}

fn reference_bytes() -> Vec<u8> {
    let mut wb = Workbook::new();
    let ws = wb.add_worksheet();
    ws.set_name("DAEI").unwrap();
    row(ws, 0, &[S("AMIE"), S("Mínimo_F"), S("Máximo_F")]);
    row(ws, 1, &[S("01H00001"), N(100.0), N(150.0)]);
    wb.save_to_buffer().unwrap()
}

fn aux_bytes() -> Vec<u8> {
    let mut wb = Workbook::new();
    let ws = wb.add_worksheet();
    ws.set_name("REVISION DOCUMENTACION").unwrap();
    ws.write_string(0, 0, "Revisión").unwrap();
    let ws = wb.add_worksheet();
    ws.set_name("VALIDACION CUMPLIMIENTO").unwrap();
    ws.write_string(0, 0, "Ítem").unwrap();
    wb.save_to_buffer().unwrap()
}

fn request(with_map: bool) -> ValidationRequest {
    ValidationRequest {
        model: Some(InputFile::new("modelo.xlsx", model_bytes(with_map))),
        reference: Some(InputFile::new("daei.xlsx", reference_bytes())),
        aux: Some(InputFile::new("aux.xlsx", aux_bytes())),
        ..Default::default()
    }
}

#[test]
fn decoded_workbook_runs_to_completion() {
    let report = run(&ValidatorConfig::default(), &request(true), Some(&CalamineReader));

    assert_eq!(report.stage, Stage::Done);
    let failing: Vec<_> = report
        .checks
        .iter()
        .filter(|c| c.status == CheckStatus::Fail)
        .map(|c| format!("{} {}", c.code, c.detail))
        .collect();
    assert!(failing.is_empty(), "{failing:?}");

    assert_eq!(report.check("INF-01").unwrap().detail, "2025-01-01");
    assert_eq!(report.check("INF-05").unwrap().status, CheckStatus::Ok);
    assert_eq!(report.check("DIM-01").unwrap().status, CheckStatus::Ok);
    assert_eq!(report.check("VAL-01").unwrap().status, CheckStatus::Ok);

    // 90 beneficiaries against [100, 150]
    let daei = report.check("DAEI-02").unwrap();
    assert_eq!(daei.status, CheckStatus::Warn);
    assert!(daei.detail.contains("BELOW by -10"), "{}", daei.detail);
}

#[test]
fn missing_map_image_fails() {
    let report = run(&ValidatorConfig::default(), &request(false), Some(&CalamineReader));
    assert_eq!(report.check("INF-05").unwrap().status, CheckStatus::Fail);
    assert_eq!(report.overall, CheckStatus::Fail);
    assert!(!report.generation_permitted());
}

#[test]
fn report_and_aux_outputs_round_trip() {
    let req = request(true);
    let report = run(&ValidatorConfig::default(), &req, Some(&CalamineReader));
    let date = NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();
    let doc = modelcheck_validator::document::generate(&report, &MemoFields::default(), None, date)
        .unwrap();

    let dir = tempdir().unwrap();
    let report_path = dir.path().join("informe_validacion.xlsx");
    export_report(&report.checks, &doc.slots, &report_path).unwrap();
    let written = decode(&std::fs::read(&report_path).unwrap()).unwrap();
    assert_eq!(written.sheet_names(), vec!["Resumen", "Checklist"]);
    assert_eq!(
        written.sheet("Checklist").unwrap().row_count(),
        report.checks.len() + 1
    );

    let aux = decode(&req.aux.as_ref().unwrap().bytes).unwrap();
    let aux_path = dir.path().join("aux_lleno.xlsx");
    let result = export_filled_aux(
        &aux,
        &report.checks,
        &doc.slots,
        &ValidatorConfig::default().sheets,
        &aux_path,
    )
    .unwrap();
    assert_eq!(result.checklist_sheet.as_deref(), Some("VALIDACION CUMPLIMIENTO"));
    assert_eq!(result.slots_sheet.as_deref(), Some("REVISION DOCUMENTACION"));
    assert_eq!(result.checklist_rows, report.checks.len());
}
