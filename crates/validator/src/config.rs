use serde::{Deserialize, Serialize};

use crate::error::ValidatorError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Tunable rule-set parameters. Every section falls back to the built-in
/// defaults when omitted from the TOML document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidatorConfig {
    #[serde(default)]
    pub tolerance: ToleranceConfig,
    #[serde(default)]
    pub validation: ValidationConfig,
    #[serde(default)]
    pub thresholds: ThresholdConfig,
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub sheets: SheetNames,
}

// ---------------------------------------------------------------------------
// Tolerances
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToleranceConfig {
    /// Absolute tolerance between a route's total and its level breakdown.
    pub beneficiary_sum: f64,
    /// Accepted band for annual / monthly budget, inclusive.
    pub budget_ratio_min: f64,
    pub budget_ratio_max: f64,
    /// Expected ratio, reported in issue text only.
    pub budget_ratio_expected: f64,
    /// Accepted optimization percentage range, inclusive.
    pub optimization_min: f64,
    pub optimization_max: f64,
}

impl Default for ToleranceConfig {
    fn default() -> Self {
        Self {
            beneficiary_sum: 0.5,
            budget_ratio_min: 9.5,
            budget_ratio_max: 10.5,
            budget_ratio_expected: 10.0,
            optimization_min: 0.0,
            optimization_max: 120.0,
        }
    }
}

// ---------------------------------------------------------------------------
// VALIDATION sheet flags
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Accepted values for the outbound/return test flags, compared after
    /// accent and case normalization.
    pub truthy_tokens: Vec<String>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            truthy_tokens: ["VERDADERO", "TRUE", "SI", "SÍ"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Filled-cell thresholds
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    pub informe_min_filled: usize,
    pub route_min_filled: usize,
    pub dimension_min_filled: usize,
    pub validation_min_filled: usize,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            informe_min_filled: 30,
            route_min_filled: 30,
            dimension_min_filled: 30,
            validation_min_filled: 20,
        }
    }
}

// ---------------------------------------------------------------------------
// Scan limits
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub header_scan_rows: usize,
    pub reference_scan_rows: usize,
    pub dimension_max_rows: usize,
    pub validation_max_rows: usize,
    pub route_max_rows: usize,
    /// Dimension issues listed in the technical notes before "and N more".
    pub note_issue_limit: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            header_scan_rows: 120,
            reference_scan_rows: 50,
            dimension_max_rows: 2000,
            validation_max_rows: 5000,
            route_max_rows: 5000,
            note_issue_limit: 12,
        }
    }
}

// ---------------------------------------------------------------------------
// Expected sheet names
// ---------------------------------------------------------------------------

/// Candidate names per sheet role, tried in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetNames {
    pub informe: Vec<String>,
    pub route: Vec<String>,
    pub dimension: Vec<String>,
    pub validation: Vec<String>,
    /// Auxiliary workbook sheet receiving the checklist.
    pub aux_compliance: Vec<String>,
    /// Auxiliary workbook sheet receiving the document slots.
    pub aux_revision: Vec<String>,
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl Default for SheetNames {
    fn default() -> Self {
        Self {
            informe: names(&["INFORME", "REPORT"]),
            route: names(&["RUTA", "ROUTE"]),
            dimension: names(&["DIMENSION"]),
            validation: names(&["VALIDACIÓN", "VALIDACION", "VALIDATION"]),
            aux_compliance: names(&["VALIDACION", "CUMPLIMIENTO"]),
            aux_revision: names(&["REVISION", "DOCUMENTACION"]),
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ValidatorConfig {
    pub fn from_toml(input: &str) -> Result<Self, ValidatorError> {
        let config: ValidatorConfig =
            toml::from_str(input).map_err(|e| ValidatorError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ValidatorError> {
        toml::to_string_pretty(self).map_err(|e| ValidatorError::ConfigParse(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ValidatorError> {
        let t = &self.tolerance;

        if !(t.beneficiary_sum.is_finite() && t.beneficiary_sum >= 0.0) {
            return Err(ValidatorError::ConfigValidation(format!(
                "tolerance.beneficiary_sum must be a non-negative number, got {}",
                t.beneficiary_sum
            )));
        }

        if !(t.budget_ratio_min > 0.0 && t.budget_ratio_min <= t.budget_ratio_max) {
            return Err(ValidatorError::ConfigValidation(format!(
                "budget ratio band must satisfy 0 < min <= max, got [{}, {}]",
                t.budget_ratio_min, t.budget_ratio_max
            )));
        }

        if t.optimization_min > t.optimization_max {
            return Err(ValidatorError::ConfigValidation(format!(
                "optimization range is inverted: [{}, {}]",
                t.optimization_min, t.optimization_max
            )));
        }

        if self.validation.truthy_tokens.iter().all(|s| s.trim().is_empty()) {
            return Err(ValidatorError::ConfigValidation(
                "validation.truthy_tokens must contain at least one token".into(),
            ));
        }

        if self.scan.header_scan_rows == 0 || self.scan.reference_scan_rows == 0 {
            return Err(ValidatorError::ConfigValidation(
                "scan windows must be at least one row".into(),
            ));
        }

        let s = &self.sheets;
        for (role, list) in [
            ("informe", &s.informe),
            ("route", &s.route),
            ("dimension", &s.dimension),
            ("validation", &s.validation),
        ] {
            if list.iter().all(|n| n.trim().is_empty()) {
                return Err(ValidatorError::ConfigValidation(format!(
                    "sheets.{role} must name at least one sheet"
                )));
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
