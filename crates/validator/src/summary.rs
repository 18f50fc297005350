use std::fmt::Write as _;

use serde::Serialize;

use crate::format;
use crate::model::{CheckCounts, CheckResult, CheckStatus, ModelData, RangeVerdict, ValidationReport};

/// Compute status counts from a checklist.
pub fn count_statuses<'a>(checks: impl IntoIterator<Item = &'a CheckResult>) -> CheckCounts {
    let mut counts = CheckCounts::default();
    for c in checks {
        match c.status {
            CheckStatus::Ok => counts.ok += 1,
            CheckStatus::Warn => counts.warn += 1,
            CheckStatus::Fail => counts.fail += 1,
        }
    }
    counts
}

/// FAIL if any check failed, else WARN if any warned, else OK.
pub fn overall_status(checks: &[CheckResult]) -> CheckStatus {
    checks.iter().map(|c| c.status).max().unwrap_or(CheckStatus::Ok)
}

/// Verdict printed on generated documents.
pub fn verdict_label(status: CheckStatus) -> &'static str {
    match status {
        CheckStatus::Ok => "Approved",
        CheckStatus::Warn => "Generated with observations",
        CheckStatus::Fail => "With failures",
    }
}

// ---------------------------------------------------------------------------
// Groups
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckGroup {
    Inputs,
    Sheets,
    Data,
    Informe,
    Route,
    Dimension,
    Validation,
    Reference,
    Historical,
    Other,
}

impl CheckGroup {
    pub const ORDER: [CheckGroup; 10] = [
        CheckGroup::Inputs,
        CheckGroup::Sheets,
        CheckGroup::Data,
        CheckGroup::Informe,
        CheckGroup::Route,
        CheckGroup::Dimension,
        CheckGroup::Validation,
        CheckGroup::Reference,
        CheckGroup::Historical,
        CheckGroup::Other,
    ];

    /// Group for a check code, by its prefix before the first `-`.
    pub fn of(code: &str) -> Self {
        let prefix = code.split('-').next().unwrap_or("").to_ascii_uppercase();
        match prefix.as_str() {
            "PDF" | "XLS" | "REF" | "HIS" | "CQX" | "SYS" => Self::Inputs,
            "SHT" => Self::Sheets,
            "DAT" => Self::Data,
            "INF" => Self::Informe,
            "RUT" => Self::Route,
            "DIM" => Self::Dimension,
            "VAL" => Self::Validation,
            "DAEI" => Self::Reference,
            "CMP" => Self::Historical,
            _ => Self::Other,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Inputs => "INS",
            Self::Sheets => "SHT",
            Self::Data => "DAT",
            Self::Informe => "INF",
            Self::Route => "RUT",
            Self::Dimension => "DIM",
            Self::Validation => "VAL",
            Self::Reference => "DAEI",
            Self::Historical => "CMP",
            Self::Other => "OTH",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Inputs => "Inputs",
            Self::Sheets => "Mandatory sheets",
            Self::Data => "Sheet data",
            Self::Informe => "INFORME",
            Self::Route => "RUTA",
            Self::Dimension => "DIMENSION",
            Self::Validation => "VALIDACIÓN",
            Self::Reference => "DAEI ranges",
            Self::Historical => "Historical comparison",
            Self::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupSummary<'a> {
    pub group: CheckGroup,
    pub counts: CheckCounts,
    pub checks: Vec<&'a CheckResult>,
}

/// Non-empty groups in presentation order, checks in run order.
pub fn group_checks(checks: &[CheckResult]) -> Vec<GroupSummary<'_>> {
    CheckGroup::ORDER
        .iter()
        .filter_map(|&group| {
            let members: Vec<&CheckResult> =
                checks.iter().filter(|c| CheckGroup::of(&c.code) == group).collect();
            if members.is_empty() {
                return None;
            }
            Some(GroupSummary {
                group,
                counts: count_statuses(members.iter().copied()),
                checks: members,
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Text renderings
// ---------------------------------------------------------------------------

/// Key figures for a quick read of the run.
pub fn highlights(model: &ModelData) -> Vec<(String, String)> {
    let mut out = Vec::new();
    if let Some(d) = &model.ids.district {
        out.push(("District".to_string(), d.clone()));
    }
    if let Some(a) = &model.ids.axis_code {
        out.push(("Axis school code".to_string(), a.clone()));
    }
    out.push(("Routes".to_string(), model.routes.count.to_string()));
    out.push((
        "Beneficiaries".to_string(),
        format::number(model.routes.beneficiaries_total),
    ));
    if let Some(dim) = &model.dimension {
        out.push((
            "Annual budget (total)".to_string(),
            format::amount(dim.annual_budget_total),
        ));
    }
    if let Some(r) = &model.reference {
        out.push(("DAEI range".to_string(), range_text(r.range.as_ref(), &r.verdict)));
    }
    if let Some(h) = &model.historical {
        out.push((
            "Historical matches".to_string(),
            h.aggregate.row_count.to_string(),
        ));
    }
    out
}

/// `50-100 (COMPLIES)`, or the bare verdict when there is no range.
pub fn range_text(range: Option<&crate::model::ReferenceRange>, verdict: &RangeVerdict) -> String {
    match range {
        Some(r) => format!(
            "{}-{} ({})",
            format::number(r.min),
            format::number(r.max),
            verdict
        ),
        None => verdict.to_string(),
    }
}

/// `OK 25 | WARN 3 | FAIL 0`
pub fn counts_line(counts: &CheckCounts) -> String {
    format!("OK {} | WARN {} | FAIL {}", counts.ok, counts.warn, counts.fail)
}

/// One line per non-OK check.
pub fn observations(checks: &[CheckResult]) -> Vec<String> {
    checks
        .iter()
        .filter(|c| c.status != CheckStatus::Ok)
        .map(|c| format!("[{}] {} {}: {}", c.status, c.code, c.description, c.detail))
        .collect()
}

/// Plain-text checklist transcript: verdict, highlights, grouped checks and
/// technical notes.
pub fn transcript(report: &ValidationReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Overall: {} ({})",
        report.overall,
        verdict_label(report.overall)
    );
    let _ = writeln!(out, "{}", counts_line(&report.counts));
    if report.halted() {
        let _ = writeln!(out, "Run halted after stage: {}", report.stage);
    }

    if let Some(model) = &report.model_data {
        let _ = writeln!(out, "\nHighlights");
        for (k, v) in highlights(model) {
            let _ = writeln!(out, "  {k}: {v}");
        }
    }

    for g in group_checks(&report.checks) {
        let _ = writeln!(
            out,
            "\n[{}] {} ({})",
            g.group.code(),
            g.group.title(),
            counts_line(&g.counts)
        );
        for c in g.checks {
            let _ = write!(out, "  {:<4} {:<8} {}", c.status.to_string(), c.code, c.description);
            if !c.detail.is_empty() {
                let _ = write!(out, ": {}", c.detail);
            }
            out.push('\n');
        }
    }

    if !report.notes.is_empty() {
        let _ = writeln!(out, "\nTechnical notes");
        for n in &report.notes {
            let _ = writeln!(out, "  - {n}");
        }
    }

    out
}
