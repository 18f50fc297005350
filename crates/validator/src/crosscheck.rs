//! Advisory comparisons against external baselines. Nothing here fails:
//! every outcome is a verdict value the engine maps to a checklist row.

use serde::Serialize;

use crate::model::{HistoricalAggregate, HistoricalDelta, RangeVerdict, ReferenceRange};

/// Current-period totals taken from ROUTE and DIMENSION.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CurrentPeriod {
    pub route_count: usize,
    pub beneficiaries: f64,
    pub annual_budget: Option<f64>,
}

/// Place `total` against an inclusive `[min, max]` range.
///
/// The delta is signed: positive above `max`, negative below `min`.
pub fn check_range(total: f64, range: Option<&ReferenceRange>) -> RangeVerdict {
    let Some(range) = range else {
        return RangeVerdict::Unresolved;
    };
    if total > range.max {
        RangeVerdict::Exceeds {
            delta: total - range.max,
        }
    } else if total < range.min {
        RangeVerdict::Below {
            delta: total - range.min,
        }
    } else {
        RangeVerdict::Complies
    }
}

/// Current minus historical, per measure.
pub fn compare_historical(current: &CurrentPeriod, historical: &HistoricalAggregate) -> HistoricalDelta {
    let budget_delta = match (current.annual_budget, historical.annual_budget) {
        (Some(now), Some(then)) => Some(now - then),
        _ => None,
    };
    let budget_variation_pct = match (budget_delta, historical.annual_budget) {
        (Some(delta), Some(then)) if then != 0.0 => Some(delta / then * 100.0),
        _ => None,
    };

    HistoricalDelta {
        route_delta: current.route_count as i64 - historical.route_count as i64,
        beneficiary_delta: historical.beneficiaries.map(|then| current.beneficiaries - then),
        budget_delta,
        budget_variation_pct,
    }
}
