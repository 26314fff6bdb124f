//! Three-way split of an epoch's inflation into pools.
//!
//! ## Order
//!
//! The waterfall fills pools in a fixed order, each capped by what is left of
//! the inflation attributable to idle capacity, `inflation × (1 - u)`:
//!
//! 1. **Operator pool**: `min(i - ((1 + i)^(1 - MP·C(u)) - 1), i·(1 - u))`
//! 2. **Reserve pool**: the locking yield on the locked share of supply,
//!    capped by the idle share remaining after the operator pool
//! 3. **Rebate pool**: everything else, paid out to participants pro rata to
//!    their reported usage
//!
//! All three are annual fractions of supply; [`Waterfall::daily`] rescales
//! them so they sum to the epoch's daily fraction.

use crate::curve::{daily_fraction, entropy_weight, inflation_rate, CurveParams};

/// Annual inflation split into pools. Fractions of circulating supply.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Waterfall {
    /// Total annual inflation rate.
    pub inflation: f32,

    /// Network operator pool.
    pub operator: f32,

    /// Base reserve pool.
    pub reserve: f32,

    /// Per-participant rebate pool.
    pub rebate: f32,
}

/// One epoch's share of a [`Waterfall`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DailyEmission {
    /// `(1 + inflation)^(1/365) - 1`.
    pub inflation: f64,

    /// Operator pool fraction for the epoch.
    pub operator: f32,

    /// Reserve pool fraction for the epoch.
    pub reserve: f32,

    /// Rebate pool fraction for the epoch.
    pub rebate: f32,
}

/// Minted amounts in minor units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PoolAmounts {
    pub operator: u64,
    pub reserve: u64,
    pub rebate: u64,
}

impl PoolAmounts {
    /// Amount to mint for the epoch.
    pub fn total(&self) -> u64 {
        self.operator
            .saturating_add(self.reserve)
            .saturating_add(self.rebate)
    }
}

/// Split `inflation` into operator, reserve and rebate pools.
///
/// # Arguments
///
/// * `inflation` - Annual rate from [`inflation_rate`]
/// * `total_ema` - Combined EMA utilization `u`
/// * `locked_ratio` - Locked supply over circulating supply
/// * `params` - Curve constants
pub fn waterfall_split(
    inflation: f32,
    total_ema: f32,
    locked_ratio: f32,
    params: &CurveParams,
) -> Waterfall {
    if inflation <= 0.0 || inflation.is_nan() {
        return Waterfall::default();
    }

    let idle_share = inflation * (1.0 - total_ema);

    let operator = operator_model(inflation, total_ema, params)
        .min(idle_share)
        .max(0.0);

    let reserve = reserve_model(total_ema, locked_ratio, params)
        .min(idle_share - operator)
        .max(0.0);

    let rebate = (inflation - operator - reserve).max(0.0);

    Waterfall {
        inflation,
        operator,
        reserve,
        rebate,
    }
}

/// Uncapped operator pool: the part of `i` not needed to compound the
/// utility yield over `1 - MP·C(u)`.
fn operator_model(inflation: f32, total_ema: f32, params: &CurveParams) -> f32 {
    let weight = if total_ema > 0.0 && total_ema < 1.0 {
        params.operator_share * entropy_weight(total_ema)
    } else {
        0.0
    };
    let gross = compound(inflation, 1.0 - weight);
    inflation - gross
}

/// Uncapped reserve pool: yield paid on locked supply.
///
/// Locked supply only counts against idle capacity (`L' = (1 - u)·L`). The
/// yield is the utility yield at `u + L'` compounded over a weight that
/// favours moderate utilization and high locking.
fn reserve_model(total_ema: f32, locked_ratio: f32, params: &CurveParams) -> f32 {
    if !(total_ema > 0.0 && total_ema < 1.0) || !(locked_ratio > 0.0) {
        return 0.0;
    }

    let idle = 1.0 - total_ema;
    let locked_idle = idle * locked_ratio.min(1.0);
    let combined = total_ema + locked_idle;
    if combined >= 1.0 {
        return 0.0;
    }

    let x = idle * (1.0 - locked_idle) / (locked_idle + idle * (1.0 - locked_idle));
    let y = 1.0 / (1.0 - total_ema.ln());
    let z = 2f32.powf(-(total_ema - 0.5).abs());

    let combined_rate = inflation_rate(combined, params);
    let combined_weight = entropy_weight(combined) * params.operator_share;
    let utility_yield = compound(combined_rate, 1.0 - combined_weight) / combined;

    let locking_yield = compound(utility_yield, x * y * z);
    locking_yield * locked_idle
}

/// `(1 + rate)^exponent - 1`, evaluated in double precision.
fn compound(rate: f32, exponent: f32) -> f32 {
    ((1.0 + rate as f64).powf(exponent as f64) - 1.0) as f32
}

impl Waterfall {
    /// Rescale the pools to one epoch.
    ///
    /// Each pool keeps its share of the annual rate, applied to the daily
    /// fraction `(1 + i)^(1/365) - 1`.
    pub fn daily(&self) -> DailyEmission {
        if self.inflation <= 0.0 {
            return DailyEmission::default();
        }

        let daily = daily_fraction(self.inflation);
        let scale = |pool: f32| ((pool / self.inflation) as f64 * daily) as f32;

        DailyEmission {
            inflation: daily,
            operator: scale(self.operator),
            reserve: scale(self.reserve),
            rebate: scale(self.rebate),
        }
    }
}

impl DailyEmission {
    /// Convert fractions to minor units of `circulating_supply`, truncating
    /// toward zero.
    pub fn amounts(&self, circulating_supply: u64) -> PoolAmounts {
        let supply = circulating_supply as f64;
        let amount = |fraction: f32| (fraction as f64 * supply) as u64;

        PoolAmounts {
            operator: amount(self.operator),
            reserve: amount(self.reserve),
            rebate: amount(self.rebate),
        }
    }

    /// Sum of the pool fractions.
    pub fn total(&self) -> f64 {
        self.operator as f64 + self.reserve as f64 + self.rebate as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split(utilization: f32, locked_ratio: f32) -> Waterfall {
        let params = CurveParams::default();
        let inflation = inflation_rate(utilization, &params);
        waterfall_split(inflation, utilization, locked_ratio, &params)
    }

    fn assert_close(actual: f32, expected: f32) {
        assert!(
            (actual - expected).abs() < 2e-6,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_idle_network_mints_nothing() {
        assert_eq!(split(0.0, 0.4), Waterfall::default());
        assert_eq!(Waterfall::default().daily(), DailyEmission::default());
    }

    #[test]
    fn test_pools_sum_to_inflation() {
        for (u, l) in [(0.02, 0.0), (0.1, 0.3), (0.5, 0.3), (0.95, 0.5), (0.02, 0.5)] {
            let waterfall = split(u, l);
            let sum = waterfall.operator + waterfall.reserve + waterfall.rebate;
            assert_close(sum, waterfall.inflation);
        }
    }

    #[test]
    fn test_operator_pool_low_utilization() {
        let waterfall = split(0.02, 0.0);
        assert_close(waterfall.inflation, 0.004_031);
        assert_close(waterfall.operator, 0.000_253_1);
        assert_eq!(waterfall.reserve, 0.0);
        assert_close(waterfall.rebate, 0.003_777_9);
    }

    #[test]
    fn test_reserve_pool_from_locking() {
        let waterfall = split(0.1, 0.3);
        assert_close(waterfall.operator, 0.002_416_8);
        assert_close(waterfall.reserve, 0.002_462_7);
        assert_close(waterfall.rebate, 0.008_154_1);
    }

    #[test]
    fn test_reserve_capped_by_idle_share() {
        let waterfall = split(0.95, 0.5);
        let idle_share = waterfall.inflation * 0.05;
        assert!(waterfall.operator <= idle_share);
        assert_close(waterfall.operator + waterfall.reserve, idle_share);
    }

    #[test]
    fn test_saturated_network_pays_only_rebates() {
        let waterfall = split(1.0, 0.5);
        assert!(waterfall.inflation > 0.05);
        assert_eq!(waterfall.operator, 0.0);
        assert_eq!(waterfall.reserve, 0.0);
        assert_eq!(waterfall.rebate, waterfall.inflation);
    }

    #[test]
    fn test_daily_fractions_sum_to_daily_inflation() {
        let daily = split(0.1, 0.3).daily();
        assert!((daily.total() - daily.inflation).abs() < 1e-9);
        assert!(daily.inflation > 0.0);
    }

    #[test]
    fn test_amounts_truncate() {
        let daily = DailyEmission {
            inflation: 0.0,
            operator: 0.25,
            reserve: 0.333,
            rebate: 0.000_001,
        };
        let amounts = daily.amounts(10);
        assert_eq!(amounts.operator, 2);
        assert_eq!(amounts.reserve, 3);
        assert_eq!(amounts.rebate, 0);
        assert_eq!(amounts.total(), 5);
    }

    #[test]
    fn test_amounts_track_supply() {
        let supply = 10_000_000_000_000u64;
        let daily = split(0.02, 0.0).daily();
        let amounts = daily.amounts(supply);
        let expected = daily.inflation * supply as f64;
        let minted = amounts.total() as f64;
        assert!((expected - minted).abs() / expected < 1e-6);
    }
}
