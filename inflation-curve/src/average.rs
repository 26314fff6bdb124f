//! Moving averages over the trailing drag-limit window.
//!
//! ## Bootstrap
//!
//! While fewer than `drag_limit` epochs have been recorded, the averaging
//! window grows by one each epoch and the EMA is defined to equal the simple
//! moving average. From then on the window is fixed and the EMA uses the
//! standard `2 / (period + 1)` multiplier, seeded from the previous EMA so the
//! two regimes join without a jump.

/// Moving averages of one usage ratio for a single epoch.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Smoothed {
    /// Simple moving average over the trailing window.
    pub average: f32,

    /// Exponential moving average.
    pub ema: f32,
}

/// Number of samples in the simple moving average for an epoch.
///
/// Grows with `epoch_count` until it reaches `drag_limit`.
pub fn averaging_period(epoch_count: u32, drag_limit: u32) -> u32 {
    epoch_count.saturating_add(1).min(drag_limit).max(1)
}

/// `(history_sum + new_value) / period`.
pub fn simple_moving_average(history_sum: f32, period: u32, new_value: f32) -> f32 {
    (history_sum + new_value) / period.max(1) as f32
}

/// `previous_ema + (new_value - previous_ema) × 2 / (period + 1)`.
///
/// The multiplier and the blend are evaluated in double precision and the
/// result narrowed back to `f32`.
pub fn exponential_moving_average(previous_ema: f32, period: u32, new_value: f32) -> f32 {
    let multiplier = 2.0 / (period as f64 + 1.0);
    ((new_value - previous_ema) as f64 * multiplier + previous_ema as f64) as f32
}

/// Smooth one ratio for a new epoch.
///
/// # Arguments
///
/// * `window_sum` - Sum of this ratio over the last `drag_limit - 1` recorded epochs
/// * `previous_ema` - EMA stored on the most recent recorded epoch
/// * `new_value` - Ratio for the epoch being recorded
/// * `epoch_count` - Day counter of the epoch being recorded
/// * `sequence` - Sequence number the new epoch will be stored under
/// * `drag_limit` - Configured window length
pub fn smooth(
    window_sum: f32,
    previous_ema: f32,
    new_value: f32,
    epoch_count: u32,
    sequence: u64,
    drag_limit: u32,
) -> Smoothed {
    let period = averaging_period(epoch_count, drag_limit);
    let average = simple_moving_average(window_sum, period, new_value);

    let ema = if sequence >= drag_limit as u64 {
        exponential_moving_average(previous_ema, drag_limit, new_value)
    } else {
        average
    };

    Smoothed { average, ema }
}
