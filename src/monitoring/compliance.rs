//! Measuring a partner's income against the period's limit.

use crate::monitoring::{aggregate::PartnerPeriodAggregate, limit::ComplianceLimit};

/// How a partner's income compares to the limit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ComplianceStatus {
    /// There is no limit to measure against.
    LimitUnset,
    /// The partner's income is missing or malformed.
    Incomplete,
    Measured {
        /// Income as a percentage of the limit, may exceed 100.
        percent: f64,
        is_over_limit: bool,
    },
}

impl ComplianceStatus {
    pub fn is_over_limit(&self) -> bool {
        matches!(
            self,
            ComplianceStatus::Measured {
                is_over_limit: true,
                ..
            }
        )
    }

    /// The width of the progress bar in percent, always within 0 to 100.
    pub fn bar_width(&self) -> f64 {
        match self {
            ComplianceStatus::Measured { percent, .. } => percent.clamp(0.0, 100.0),
            _ => 0.0,
        }
    }

    /// The unclamped percentage with one decimal, e.g. "120.0%".
    pub fn percent_label(&self) -> Option<String> {
        match self {
            ComplianceStatus::Measured { percent, .. } => Some(format!("{percent:.1}%")),
            _ => None,
        }
    }
}

/// Measure `aggregate`'s income against `limit`.
pub fn compute(aggregate: &PartnerPeriodAggregate, limit: ComplianceLimit) -> ComplianceStatus {
    let ComplianceLimit::Ceiling(limit) = limit else {
        return ComplianceStatus::LimitUnset;
    };

    let Some(income) = aggregate.period_income else {
        return ComplianceStatus::Incomplete;
    };

    let percent = income * 100.0 / limit;
    if !percent.is_finite() {
        return ComplianceStatus::Incomplete;
    }

    ComplianceStatus::Measured {
        percent,
        is_over_limit: income > limit,
    }
}
