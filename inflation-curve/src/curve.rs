//! The utilization → inflation curve.
//!
//! ```text
//! C(x)         = -x · ln(x) · e          (entropy weight, peaks at x = 1/e)
//! inflation(u) = (1 - u) / (1 - u - C(u) · VT) - 1
//! ```
//!
//! `VT` (value-transfer constant) sets the height of the curve: an idle
//! network mints nothing, and a saturated one approaches
//! `1 / (1 - e · VT) - 1` per year.

use std::f32::consts::E;

/// Epochs (days) per year used to de-annualize the inflation rate.
pub const EPOCHS_PER_YEAR: f64 = 365.0;

/// Curve constants.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CurveParams {
    /// Value-transfer constant `VT` of the inflation curve.
    pub value_transfer: f32,

    /// Weight `MP` of the entropy curve in the operator pool model.
    pub operator_share: f32,
}

impl Default for CurveParams {
    fn default() -> Self {
        Self {
            value_transfer: 0.0185,
            operator_share: 0.2947,
        }
    }
}

/// `-x · ln(x) · e`.
///
/// Defined on `(0, 1)`. Callers must not pass `0`, where `ln` diverges.
pub fn entropy_weight(x: f32) -> f32 {
    debug_assert!(x > 0.0, "entropy weight is undefined at {x}");
    -x * x.ln() * E
}

/// Annual inflation rate for a combined EMA utilization.
///
/// Outside `(0, 1)` the curve takes its limits: zero for an idle network and
/// `1 / (1 - e · VT) - 1` for a saturated one.
pub fn inflation_rate(total_ema: f32, params: &CurveParams) -> f32 {
    if total_ema.is_nan() || total_ema <= 0.0 {
        return 0.0;
    }
    if total_ema >= 1.0 {
        return saturated_rate(params);
    }

    let idle = 1.0 - total_ema;
    idle / (idle - entropy_weight(total_ema) * params.value_transfer) - 1.0
}

/// Limit of [`inflation_rate`] as utilization approaches 1.
pub fn saturated_rate(params: &CurveParams) -> f32 {
    1.0 / (1.0 - E * params.value_transfer) - 1.0
}

/// Fraction of supply minted per epoch for an annual rate: `(1 + i)^(1/365) - 1`.
pub fn daily_fraction(inflation: f32) -> f64 {
    (1.0 + inflation as f64).powf(1.0 / EPOCHS_PER_YEAR) - 1.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entropy_weight_peak() {
        // Maximum of -x ln x is at 1/e, where C = 1
        let peak = entropy_weight(1.0 / E);
        assert!((peak - 1.0).abs() < 1e-6);
        assert!(entropy_weight(0.2) < peak);
        assert!(entropy_weight(0.6) < peak);
    }

    #[test]
    fn test_entropy_weight_vanishes_at_one() {
        assert_eq!(entropy_weight(1.0), 0.0);
    }

    #[test]
    fn test_inflation_rate_reference_points() {
        let params = CurveParams::default();
        let cases = [(0.02f32, 0.004_03f32), (0.1, 0.013_03), (0.3, 0.026_64), (0.5, 0.036_12)];
        for (utilization, expected) in cases {
            let rate = inflation_rate(utilization, &params);
            assert!(
                (rate - expected).abs() < 1e-4,
                "inflation({utilization}) = {rate}, expected {expected}"
            );
        }
    }

    #[test]
    fn test_inflation_rate_is_monotonic() {
        let params = CurveParams::default();
        let mut previous = 0.0;
        for step in 1..100 {
            let rate = inflation_rate(step as f32 / 100.0, &params);
            assert!(rate > previous, "rate must increase with utilization at step {step}");
            previous = rate;
        }
    }

    #[test]
    fn test_inflation_rate_edges() {
        let params = CurveParams::default();
        assert_eq!(inflation_rate(0.0, &params), 0.0);
        assert_eq!(inflation_rate(-0.5, &params), 0.0);
        assert_eq!(inflation_rate(f32::NAN, &params), 0.0);

        let saturated = inflation_rate(1.0, &params);
        assert_eq!(saturated, inflation_rate(1.7, &params));
        assert!((saturated - 0.052_95).abs() < 1e-4);
        // Continuous at the top edge
        assert!((inflation_rate(0.9999, &params) - saturated).abs() < 1e-3);
    }

    #[test]
    fn test_daily_fraction_compounds_to_annual() {
        let daily = daily_fraction(0.05);
        let annual = (1.0 + daily).powf(EPOCHS_PER_YEAR) - 1.0;
        assert!((annual - 0.05).abs() < 1e-7);
        assert_eq!(daily_fraction(0.0), 0.0);
    }
}
