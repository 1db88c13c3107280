//! Single-precision float emulation for trade-up wear blending.
//!
//! The game client evaluates the output float in 32-bit arithmetic. Every
//! intermediate that the client rounds is rounded here too, in the same order,
//! so boundary cases land in the same wear tier the client reports.

use super::entities::WearTier;

/// Rounds `value` to the nearest representable `f32`, widened back to `f64`.
pub fn round32(value: f64) -> f64 {
    value as f32 as f64
}

/// Position of `real` inside `[min, max]`, in `[0, 1]` for in-range floats.
/// A degenerate range yields `0.0`.
pub fn trade_float(real: f64, min: f64, max: f64) -> f64 {
    let range = max - min;
    if range == 0.0 {
        return 0.0;
    }
    (real - min) / range
}

/// Inverse of [`trade_float`]. No rounding: used for algebraic back-solving.
pub fn real_float(trade: f64, min: f64, max: f64) -> f64 {
    trade * (max - min) + min
}

/// Output float of a trade-up for an outcome with caps `[out_min, out_max]`.
pub fn blend_output(avg_trade: f64, out_min: f64, out_max: f64) -> f64 {
    let avg = round32(avg_trade);
    let range = round32(out_max - out_min);
    let scaled = round32(avg * range);
    round32(scaled + out_min)
}

/// Average trade float of ten inputs as the client computes it:
/// `main_count` copies at `main_trade`, the rest at `filler_trade`.
/// Counts above ten are treated as ten.
pub fn average_trade_float(main_trade: f64, main_count: u8, filler_trade: f64) -> f64 {
    let main_count = main_count.min(10);
    let filler_count = 10 - main_count;
    let sum = main_trade * f64::from(main_count) + filler_trade * f64::from(filler_count);
    round32(sum / 10.0)
}

/// Exterior an output float lands in.
pub fn wear_tier_of(float: f64) -> WearTier {
    WearTier::from_float(float)
}
