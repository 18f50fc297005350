use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Checklist
// ---------------------------------------------------------------------------

/// Severity of a single check. Ordered so that `max` yields the worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CheckStatus {
    Ok,
    Warn,
    Fail,
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => write!(f, "OK"),
            Self::Warn => write!(f, "WARN"),
            Self::Fail => write!(f, "FAIL"),
        }
    }
}

/// One row of the checklist. Immutable once pushed into a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    pub code: String,
    pub description: String,
    pub status: CheckStatus,
    pub detail: String,
}

impl CheckResult {
    pub fn new(
        code: impl Into<String>,
        description: impl Into<String>,
        status: CheckStatus,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            description: description.into(),
            status,
            detail: detail.into(),
        }
    }

    pub fn ok(code: &str, description: &str, detail: impl Into<String>) -> Self {
        Self::new(code, description, CheckStatus::Ok, detail)
    }

    pub fn warn(code: &str, description: &str, detail: impl Into<String>) -> Self {
        Self::new(code, description, CheckStatus::Warn, detail)
    }

    pub fn fail(code: &str, description: &str, detail: impl Into<String>) -> Self {
        Self::new(code, description, CheckStatus::Fail, detail)
    }

    /// OK when `passed`, otherwise the given failure status.
    pub fn gate(
        code: &str,
        description: &str,
        passed: bool,
        otherwise: CheckStatus,
        detail: impl Into<String>,
    ) -> Self {
        let status = if passed { CheckStatus::Ok } else { otherwise };
        Self::new(code, description, status, detail)
    }
}

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// An in-memory input blob as supplied by the caller.
#[derive(Clone, PartialEq)]
pub struct InputFile {
    pub name: String,
    pub bytes: Vec<u8>,
    /// Hex SHA-256 of `bytes`, when the loader computed one.
    pub fingerprint: Option<String>,
}

impl InputFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
            fingerprint: None,
        }
    }

    pub fn with_fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        self.fingerprint = Some(fingerprint.into());
        self
    }
}

impl fmt::Debug for InputFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputFile")
            .field("name", &self.name)
            .field("len", &self.bytes.len())
            .field("fingerprint", &self.fingerprint)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputRole {
    Memo,
    Model,
    Reference,
    Historical,
    Aux,
}

impl fmt::Display for InputRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memo => write!(f, "memo"),
            Self::Model => write!(f, "model"),
            Self::Reference => write!(f, "reference"),
            Self::Historical => write!(f, "historical"),
            Self::Aux => write!(f, "aux"),
        }
    }
}

/// Everything one validation run looks at. Only `model` is mandatory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationRequest {
    pub memo: Option<InputFile>,
    pub model: Option<InputFile>,
    pub reference: Option<InputFile>,
    pub historical: Option<InputFile>,
    pub aux: Option<InputFile>,
    /// Text already extracted from the memo; PDF-01 reports whether there was any.
    pub memo_text: Option<String>,
}

impl ValidationRequest {
    pub fn input(&self, role: InputRole) -> Option<&InputFile> {
        match role {
            InputRole::Memo => self.memo.as_ref(),
            InputRole::Model => self.model.as_ref(),
            InputRole::Reference => self.reference.as_ref(),
            InputRole::Historical => self.historical.as_ref(),
            InputRole::Aux => self.aux.as_ref(),
        }
    }

    pub fn slot_mut(&mut self, role: InputRole) -> &mut Option<InputFile> {
        match role {
            InputRole::Memo => &mut self.memo,
            InputRole::Model => &mut self.model,
            InputRole::Reference => &mut self.reference,
            InputRole::Historical => &mut self.historical,
            InputRole::Aux => &mut self.aux,
        }
    }

    /// Supplied inputs in a fixed role order.
    pub fn supplied(&self) -> Vec<(InputRole, &InputFile)> {
        [
            InputRole::Memo,
            InputRole::Model,
            InputRole::Reference,
            InputRole::Historical,
            InputRole::Aux,
        ]
        .into_iter()
        .filter_map(|role| self.input(role).map(|f| (role, f)))
        .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputMeta {
    pub role: InputRole,
    pub name: String,
    pub size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
}

// ---------------------------------------------------------------------------
// ROUTE
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteRecord {
    /// 1-based sheet row.
    pub row_number: usize,
    pub route_id: String,
    pub merged_school_code: Option<String>,
    pub total_beneficiaries: Option<f64>,
    pub initial_level: Option<f64>,
    pub basic_level: Option<f64>,
    pub high_school_level: Option<f64>,
    pub coordinate_x: Option<f64>,
    pub coordinate_y: Option<f64>,
    pub linear_distance: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RouteIssueKind {
    MissingCoordinates,
    MissingDistance,
    BeneficiarySum { total: f64, components: f64, diff: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteIssue {
    pub row_number: usize,
    pub route_id: String,
    #[serde(flatten)]
    pub kind: RouteIssueKind,
}

/// District and axis school code read from the ROUTE header cells.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Identifiers {
    pub district: Option<String>,
    pub axis_code: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub x: Option<f64>,
    pub y: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteTable {
    /// Detected header row, `None` when the fixed fallback layout was used.
    pub header_row: Option<usize>,
    pub ids: Identifiers,
    pub header_coordinates: Coordinates,
    pub rows: Vec<RouteRecord>,
    /// Distinct merged school codes in first-seen order.
    pub affiliated_codes: Vec<String>,
    pub beneficiaries_total: f64,
    pub issues: Vec<RouteIssue>,
    pub has_coordinate_columns: bool,
    pub has_distance_column: bool,
}

impl RouteTable {
    pub fn route_count(&self) -> usize {
        self.rows.len()
    }

    pub fn count_issues(&self, pred: impl Fn(&RouteIssueKind) -> bool) -> usize {
        self.issues.iter().filter(|i| pred(&i.kind)).count()
    }
}

// ---------------------------------------------------------------------------
// DIMENSION
// ---------------------------------------------------------------------------

/// Times are minutes since midnight.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DimensionRecord {
    pub row_number: usize,
    pub route_id: String,
    pub route_number: Option<f64>,
    pub monthly_budget: Option<f64>,
    pub annual_budget: Option<f64>,
    pub departure_1: Option<f64>,
    pub arrival_1: Option<f64>,
    pub departure_2: Option<f64>,
    pub arrival_2: Option<f64>,
    pub trip_start: Option<f64>,
    pub trip_return: Option<f64>,
    pub optimization_pct: Option<f64>,
    pub unit_cost: Option<f64>,
    pub per_student_cost: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DimensionIssueKind {
    MissingTimes,
    TimeOrder,
    TripDuration,
    BudgetMissing,
    MonthlyBudgetZero,
    BudgetRatio { ratio: f64, expected: f64 },
    OptimizationOutOfRange { value: f64 },
    UnitCostMissing,
}

impl fmt::Display for DimensionIssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingTimes => write!(f, "missing departure/arrival times (HS1/HL1/HS2/HL2)"),
            Self::TimeOrder => write!(f, "departure/arrival times out of order"),
            Self::TripDuration => write!(f, "trip start/return duration missing or not positive"),
            Self::BudgetMissing => write!(f, "monthly/annual budget missing"),
            Self::MonthlyBudgetZero => write!(f, "monthly budget is zero"),
            Self::BudgetRatio { ratio, expected } => write!(
                f,
                "annual budget inconsistent with monthly budget (ratio {ratio:.2}, expected {expected:.2})"
            ),
            Self::OptimizationOutOfRange { value } => {
                write!(f, "optimization percentage out of range: {value}")
            }
            Self::UnitCostMissing => write!(f, "unit cost missing or not numeric"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DimensionIssue {
    pub row_number: usize,
    pub route_id: String,
    #[serde(flatten)]
    pub kind: DimensionIssueKind,
}

impl fmt::Display for DimensionIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Route {} (row {}): {}", self.route_id, self.row_number, self.kind)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DimensionTable {
    pub header_row: usize,
    pub rows: Vec<DimensionRecord>,
    pub issues: Vec<DimensionIssue>,
    pub annual_budget_total: f64,
}

// ---------------------------------------------------------------------------
// VALIDATION
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationRecord {
    pub row_number: usize,
    pub route_id: String,
    pub departure: Option<f64>,
    pub arrival: Option<f64>,
    pub outbound_test: String,
    pub return_test: String,
    pub flags_ok: bool,
    pub times_ok: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationTable {
    pub header_row: usize,
    pub rows: Vec<ValidationRecord>,
    pub not_truthy_count: usize,
    pub time_bad_count: usize,
}

// ---------------------------------------------------------------------------
// Reference and historical
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferenceRange {
    pub min: f64,
    pub max: f64,
    pub estimate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoricalAggregate {
    pub district: String,
    pub axis_code: String,
    pub row_count: usize,
    pub route_count: usize,
    pub beneficiaries: Option<f64>,
    pub annual_budget: Option<f64>,
    pub affiliated_codes: Vec<String>,
    pub reference_year: Option<String>,
}

/// Signed delta of a total against a reference range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum RangeVerdict {
    Complies,
    Exceeds { delta: f64 },
    Below { delta: f64 },
    /// The identifier is not in the reference table; nothing was evaluated.
    Unresolved,
}

impl fmt::Display for RangeVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Complies => write!(f, "COMPLIES"),
            Self::Exceeds { .. } => write!(f, "EXCEEDS"),
            Self::Below { .. } => write!(f, "BELOW"),
            Self::Unresolved => write!(f, "UNRESOLVED"),
        }
    }
}

/// Current period minus historical period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistoricalDelta {
    pub route_delta: i64,
    pub beneficiary_delta: Option<f64>,
    pub budget_delta: Option<f64>,
    /// Omitted when the historical budget is zero or absent.
    pub budget_variation_pct: Option<f64>,
}

// ---------------------------------------------------------------------------
// Run output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteSummary {
    pub count: usize,
    pub beneficiaries_total: f64,
    pub affiliated_codes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DimensionSummary {
    pub annual_budget_total: f64,
    pub issue_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationSummary {
    pub not_truthy_count: usize,
    pub time_bad_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferenceSummary {
    pub range: Option<ReferenceRange>,
    pub verdict: RangeVerdict,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoricalSummary {
    pub aggregate: HistoricalAggregate,
    pub delta: HistoricalDelta,
}

/// Aggregate snapshot handed to document generation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelData {
    pub ids: Identifiers,
    pub routes: RouteSummary,
    pub header_coordinates: Coordinates,
    pub informe_date: Option<String>,
    pub dimension: Option<DimensionSummary>,
    pub validation: Option<ValidationSummary>,
    pub reference: Option<ReferenceSummary>,
    pub historical: Option<HistoricalSummary>,
}

/// Last stage the engine completed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    #[default]
    Init,
    InputsChecked,
    SheetsLocated,
    DataParsed,
    CrossChecked,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Init => "init",
            Self::InputsChecked => "inputs_checked",
            Self::SheetsLocated => "sheets_located",
            Self::DataParsed => "data_parsed",
            Self::CrossChecked => "cross_checked",
            Self::Done => "done",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CheckCounts {
    pub ok: usize,
    pub warn: usize,
    pub fail: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportMeta {
    pub engine_version: String,
    pub inputs: Vec<InputMeta>,
}

/// Result of one validation run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub meta: ReportMeta,
    /// `Done` for a complete run, otherwise the last stage reached before
    /// the run halted.
    pub stage: Stage,
    pub overall: CheckStatus,
    pub counts: CheckCounts,
    pub checks: Vec<CheckResult>,
    pub notes: Vec<String>,
    pub model_data: Option<ModelData>,
}

impl ValidationReport {
    pub fn halted(&self) -> bool {
        self.stage != Stage::Done
    }

    pub fn check(&self, code: &str) -> Option<&CheckResult> {
        self.checks.iter().find(|c| c.code == code)
    }

    /// Generation is refused only after a FAIL.
    pub fn generation_permitted(&self) -> bool {
        self.overall != CheckStatus::Fail
    }
}
