use serde::Serialize;

/// Read-only figures handed to views after every change.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BudgetSnapshot {
    pub limit: f64,
    pub total: f64,
    pub consumed: f64,
    pub burned: f64,
    pub remaining: f64,
    pub over_budget: bool,
    pub progress_percent: f64,
}

impl BudgetSnapshot {
    pub fn compute(limit: f64, total: f64, consumed: f64, burned: f64) -> Self {
        let remaining = limit - total;
        Self {
            limit,
            total,
            consumed,
            burned,
            remaining,
            over_budget: is_over_budget(limit, remaining),
            progress_percent: progress_percent(limit, total),
        }
    }
}

/// Share of the limit used so far, clamped to `0..=100`.
///
/// A limit of zero or below leaves no room at all, so progress reads as full.
pub fn progress_percent(limit: f64, total: f64) -> f64 {
    if limit <= 0.0 {
        return 100.0;
    }
    (total / limit * 100.0).clamp(0.0, 100.0)
}

/// A non-positive limit is always over budget; otherwise the budget is spent once nothing remains.
pub fn is_over_budget(limit: f64, remaining: f64) -> bool {
    limit <= 0.0 || remaining <= 0.0
}
