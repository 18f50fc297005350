//! Document slots and plain-text template rendering.
//!
//! A template is any text with `{{slot}}` placeholders. Known slots are
//! substituted; unknown ones stay in the output verbatim and are reported.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ValidatorError;
use crate::format;
use crate::model::ValidationReport;
use crate::summary::{observations, range_text, transcript, verdict_label};

/// Fields the user edits before generation, in display order.
pub const EDITABLE_FIELDS: [&str; 7] = [
    "memo_nro",
    "memo_fecha",
    "para",
    "de",
    "asunto",
    "anio_lectivo",
    "firma",
];

/// Every slot a template may reference, in output order.
pub const SLOT_NAMES: [&str; 17] = [
    "memo_nro",
    "memo_fecha",
    "para",
    "de",
    "asunto",
    "anio_lectivo",
    "firma",
    "distrito",
    "amie_eje",
    "total_rutas",
    "beneficiarios",
    "presupuesto_anual",
    "rango_daei",
    "veredicto",
    "resumen_validacion",
    "observaciones",
    "fecha_generacion",
];

pub const DEFAULT_TEMPLATE: &str = "\
ROUTE MODEL VALIDATION REPORT

Memo: {{memo_nro}}
Memo date: {{memo_fecha}}
To: {{para}}
From: {{de}}
Subject: {{asunto}}
School year: {{anio_lectivo}}

District: {{distrito}}
Axis school code (AMIE): {{amie_eje}}
Routes: {{total_rutas}}
Beneficiaries: {{beneficiarios}}
Annual budget: {{presupuesto_anual}}
DAEI range: {{rango_daei}}

Verdict: {{veredicto}}

Validation summary
{{resumen_validacion}}
Observations
{{observaciones}}

{{firma}}
Generated on {{fecha_generacion}}
";

// ---------------------------------------------------------------------------
// Editable fields
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoFields {
    pub memo_nro: String,
    pub memo_fecha: String,
    pub para: String,
    pub de: String,
    pub asunto: String,
    pub anio_lectivo: String,
    pub firma: String,
}

impl MemoFields {
    fn slot_mut(&mut self, key: &str) -> Option<&mut String> {
        Some(match key {
            "memo_nro" => &mut self.memo_nro,
            "memo_fecha" => &mut self.memo_fecha,
            "para" => &mut self.para,
            "de" => &mut self.de,
            "asunto" => &mut self.asunto,
            "anio_lectivo" => &mut self.anio_lectivo,
            "firma" => &mut self.firma,
            _ => return None,
        })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        Some(match key {
            "memo_nro" => &self.memo_nro,
            "memo_fecha" => &self.memo_fecha,
            "para" => &self.para,
            "de" => &self.de,
            "asunto" => &self.asunto,
            "anio_lectivo" => &self.anio_lectivo,
            "firma" => &self.firma,
            _ => return None,
        })
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) -> Result<(), ValidatorError> {
        let slot = self.slot_mut(key.trim()).ok_or_else(|| {
            ValidatorError::Template(format!(
                "unknown field '{key}' (expected one of: {})",
                EDITABLE_FIELDS.join(", ")
            ))
        })?;
        *slot = value.into();
        Ok(())
    }

    /// Apply a `key=value` assignment.
    pub fn assign(&mut self, assignment: &str) -> Result<(), ValidatorError> {
        let (key, value) = assignment.split_once('=').ok_or_else(|| {
            ValidatorError::Template(format!("expected key=value, got '{assignment}'"))
        })?;
        self.set(key, value.trim())
    }

    /// Fill empty fields from `suggestions`; values already set win.
    pub fn fill_missing(&mut self, suggestions: &MemoFields) {
        for key in EDITABLE_FIELDS {
            if let (Some(slot), Some(suggested)) = (self.slot_mut(key), suggestions.get(key)) {
                if slot.trim().is_empty() && !suggested.trim().is_empty() {
                    *slot = suggested.to_string();
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Slots
// ---------------------------------------------------------------------------

/// Named values substituted into the output document, in [`SLOT_NAMES`] order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentSlots {
    values: Vec<(String, String)>,
}

impl DocumentSlots {
    pub fn build(report: &ValidationReport, fields: &MemoFields, generated_on: NaiveDate) -> Self {
        let model = report.model_data.as_ref();
        let mut notes = observations(&report.checks);
        notes.extend(report.notes.iter().cloned());
        let observaciones = if notes.is_empty() {
            "No observations.".to_string()
        } else {
            notes.join("\n")
        };

        let value = |name: &str| -> String {
            if let Some(v) = fields.get(name) {
                return v.to_string();
            }
            match name {
                "distrito" => model.and_then(|m| m.ids.district.clone()).unwrap_or_default(),
                "amie_eje" => model.and_then(|m| m.ids.axis_code.clone()).unwrap_or_default(),
                "total_rutas" => model.map(|m| m.routes.count.to_string()).unwrap_or_default(),
                "beneficiarios" => model
                    .map(|m| format::number(m.routes.beneficiaries_total))
                    .unwrap_or_default(),
                "presupuesto_anual" => model
                    .and_then(|m| m.dimension.as_ref())
                    .map(|d| format::amount(d.annual_budget_total))
                    .unwrap_or_default(),
                "rango_daei" => model
                    .and_then(|m| m.reference.as_ref())
                    .map(|r| range_text(r.range.as_ref(), &r.verdict))
                    .unwrap_or_default(),
                "veredicto" => verdict_label(report.overall).to_string(),
                "resumen_validacion" => transcript(report),
                "observaciones" => observaciones.clone(),
                "fecha_generacion" => generated_on.format("%Y-%m-%d").to_string(),
                _ => String::new(),
            }
        };

        Self {
            values: SLOT_NAMES
                .iter()
                .map(|&name| (name.to_string(), value(name)))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedTemplate {
    pub text: String,
    /// Placeholders with no matching slot, first-seen order.
    pub unknown_placeholders: Vec<String>,
}

pub fn render_template(template: &str, slots: &DocumentSlots) -> RenderedTemplate {
    let mut text = String::with_capacity(template.len());
    let mut unknown: Vec<String> = Vec::new();
    let mut rest = template;

    while let Some(open) = rest.find("{{") {
        text.push_str(&rest[..open]);
        let after = &rest[open + 2..];
        let Some(close) = after.find("}}") else {
            text.push_str(&rest[open..]);
            rest = "";
            break;
        };
        let name = after[..close].trim();
        match slots.get(name) {
            Some(value) => text.push_str(value),
            None => {
                text.push_str(&rest[open..open + 2 + close + 2]);
                if !unknown.iter().any(|u| u == name) {
                    unknown.push(name.to_string());
                }
            }
        }
        rest = &after[close + 2..];
    }
    text.push_str(rest);

    RenderedTemplate {
        text,
        unknown_placeholders: unknown,
    }
}

/// Everything produced for one generation request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedDocument {
    pub verdict: String,
    pub slots: DocumentSlots,
    pub text: String,
    pub unknown_placeholders: Vec<String>,
}

/// Build slots and render `template` (or [`DEFAULT_TEMPLATE`]).
///
/// Refused when the report's overall status is FAIL.
pub fn generate(
    report: &ValidationReport,
    fields: &MemoFields,
    template: Option<&str>,
    generated_on: NaiveDate,
) -> Result<GeneratedDocument, ValidatorError> {
    if !report.generation_permitted() {
        return Err(ValidatorError::GenerationBlocked {
            status: report.overall,
        });
    }
    let slots = DocumentSlots::build(report, fields, generated_on);
    let rendered = render_template(template.unwrap_or(DEFAULT_TEMPLATE), &slots);
    if !rendered.unknown_placeholders.is_empty() {
        log::warn!(
            "template placeholders without a slot: {}",
            rendered.unknown_placeholders.join(", ")
        );
    }
    Ok(GeneratedDocument {
        verdict: verdict_label(report.overall).to_string(),
        slots,
        text: rendered.text,
        unknown_placeholders: rendered.unknown_placeholders,
    })
}
