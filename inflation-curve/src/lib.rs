//! Utilization-driven inflation for a permissioned resource network.
//!
//! Once per epoch the network's aggregate resource usage is turned into a
//! minted amount of the native currency:
//!
//! 1. **Ratios**: raw processing and bandwidth totals are divided by the
//!    epoch's capacity ([`Capacity`]).
//! 2. **Smoothing**: each ratio is averaged over a trailing window of
//!    `drag_limit` epochs (simple moving average), then exponentially smoothed
//!    once enough history exists ([`smooth`]).
//! 3. **Curve**: the combined EMA utilization `u` maps to an annual inflation
//!    rate through the entropy curve ([`inflation_rate`]).
//! 4. **Waterfall**: the rate is split into operator, reserve and rebate pools
//!    ([`waterfall_split`]), scaled to one day and multiplied by circulating
//!    supply ([`DailyEmission::amounts`]).
//!
//! ## Curve
//!
//! ```text
//! C(x)          = -x · ln(x) · e
//! inflation(u)  = (1 - u) / (1 - u - C(u) · VT) - 1
//! daily(i)      = (1 + i)^(1/365) - 1
//! ```
//!
//! | Utilization | Annual inflation |
//! |-------------|-----------------:|
//! | 0%          | 0.00%            |
//! | 2%          | 0.40%            |
//! | 10%         | 1.30%            |
//! | 30%         | 2.66%            |
//! | 50%         | 3.61%            |
//! | 100%        | 5.30% (limit)    |
//!
//! ## Precision
//!
//! Ratios, averages and the curve run in `f32` so that recomputed snapshots
//! match recorded history bit for bit. Only the daily scaling runs in `f64`.

pub mod average;
pub mod capacity;
pub mod curve;
pub mod waterfall;

pub use average::{
    averaging_period, exponential_moving_average, simple_moving_average, smooth, Smoothed,
};
pub use capacity::{Capacity, BANDWIDTH_WORD_BYTES, SECONDS_PER_EPOCH};
pub use curve::{
    daily_fraction, entropy_weight, inflation_rate, saturated_rate, CurveParams, EPOCHS_PER_YEAR,
};
pub use waterfall::{waterfall_split, DailyEmission, PoolAmounts, Waterfall};
