//! Amount gates: the legacy native-unit minimum and the USD threshold.

use crate::domain::{AlertPolicy, Decimal, SuppressionReason, UsdContext};

/// Outcome of the USD threshold stage.
///
/// On fail-open, `usd_amount` is forced to `None` and `usd_unavailable` to
/// true so the formatter can tell the user price data was missing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdOutcome {
    pub allowed: bool,
    pub usd_amount: Option<f64>,
    pub usd_unavailable: bool,
}

/// The threshold that must be met: the larger of the current and legacy fields.
pub fn effective_threshold(policy: &AlertPolicy) -> f64 {
    policy.threshold_usd().max(policy.min_amount_usd())
}

/// Apply the USD threshold with fail-open semantics on missing prices.
pub fn evaluate_usd_threshold(policy: &AlertPolicy, usd: &UsdContext) -> ThresholdOutcome {
    let threshold = effective_threshold(policy);

    if threshold <= 0.0 {
        return ThresholdOutcome {
            allowed: true,
            usd_amount: usd.finite_amount(),
            usd_unavailable: usd.usd_unavailable,
        };
    }

    let amount = match usd.finite_amount() {
        Some(amount) if !usd.usd_unavailable => amount,
        _ => {
            return ThresholdOutcome {
                allowed: true,
                usd_amount: None,
                usd_unavailable: true,
            }
        }
    };

    ThresholdOutcome {
        allowed: amount >= threshold,
        usd_amount: Some(amount),
        usd_unavailable: false,
    }
}

/// Legacy native-unit minimum on `value_formatted`.
///
/// A non-positive minimum disables the check. When enabled, an absent or
/// unparseable value is suppressed.
pub fn check_legacy_min_amount(
    min_amount: Decimal,
    value_formatted: Option<&str>,
) -> Option<SuppressionReason> {
    if !min_amount.is_positive() {
        return None;
    }

    match value_formatted.map(Decimal::from_str_canonical) {
        Some(Ok(value)) if value >= min_amount => None,
        _ => Some(SuppressionReason::LegacyMinAmount),
    }
}
