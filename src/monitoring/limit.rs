//! Resolving the single compliance limit that applies to a batch.

use crate::monitoring::aggregate::PartnerPeriodAggregate;

/// The ceiling a partner's income is measured against.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ComplianceLimit {
    /// No limit is configured for the period, or the batch is empty.
    #[default]
    Unset,
    /// A strictly positive, finite ceiling.
    Ceiling(f64),
}

impl ComplianceLimit {
    /// Interpret a raw limit amount, where zero, negative and non-finite values mean unset.
    pub fn from_amount(amount: f64) -> Self {
        if amount.is_finite() && amount > 0.0 {
            ComplianceLimit::Ceiling(amount)
        } else {
            ComplianceLimit::Unset
        }
    }

    pub fn amount(&self) -> Option<f64> {
        match self {
            ComplianceLimit::Unset => None,
            ComplianceLimit::Ceiling(amount) => Some(*amount),
        }
    }
}

/// Two records in one batch carried different limits.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("partner {partner} has limit {found} but the batch limit is {expected}")]
pub struct InconsistentLimitError {
    pub partner: String,
    pub expected: f64,
    pub found: f64,
}

/// Determine the limit for a batch from its records.
///
/// The backend repeats the period's limit on every record. The first record
/// that carries a limit decides it and every other record carrying one must
/// agree.
///
/// # Errors
/// Returns [InconsistentLimitError] for the first record whose limit differs.
pub fn resolve_limit(
    records: &[PartnerPeriodAggregate],
) -> Result<ComplianceLimit, InconsistentLimitError> {
    let mut limits = records
        .iter()
        .filter_map(|record| record.period_limit.map(|limit| (record, limit)));

    let Some((_, expected)) = limits.next() else {
        return Ok(ComplianceLimit::Unset);
    };

    if let Some((record, found)) = limits.find(|(_, limit)| *limit != expected) {
        tracing::error!(
            "inconsistent limit in batch: {} has {found}, expected {expected}",
            record.partner_id
        );
        return Err(InconsistentLimitError {
            partner: record.full_name.clone(),
            expected,
            found,
        });
    }

    Ok(ComplianceLimit::from_amount(expected))
}
