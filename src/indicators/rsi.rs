// =============================================================================
// Relative Strength Index (RSI) — Wilder's Smoothing
// =============================================================================
//
// RSI measures the speed and magnitude of recent price changes to evaluate
// whether an asset is overbought or oversold.
//
// Step 1 — Compute price changes (deltas) from consecutive closes.
// Step 2 — Split deltas into gains (positive part) and losses (negated
//          negative part).
// Step 3 — Smooth both sequences exponentially with alpha = 1 / period
//          (Wilder's factor).  The average is bias-corrected over the samples
//          seen so far:
//            avg_t = sum_i (1 - alpha)^i * x_{t-i}  /  sum_i (1 - alpha)^i
//          which needs no separate seeding window.
// Step 4 — RS  = avg_gain / avg_loss
//          RSI = 100 - 100 / (1 + RS),  RSI = 100 when avg_loss == 0.
//
// Only the latest value is reported, rounded to 2 decimals.
// =============================================================================

use super::round_to;

pub const DEFAULT_RSI_PERIOD: usize = 14;

/// Decimal places kept on the reported RSI.
const RSI_PRECISION: u32 = 2;

/// Latest RSI of `closes` for `period`.
///
/// Returns `None` ("unavailable") when:
/// - `period == 0`
/// - `closes.len() < period`
/// - there is no price delta at all (fewer than two closes)
/// - the result is non-finite (e.g. NaN in the input)
pub fn calculate_rsi(closes: &[f64], period: usize) -> Option<f64> {
    if period == 0 || closes.len() < period || closes.len() < 2 {
        return None;
    }

    // A NaN delta fails both the gain and the loss comparison and would be
    // silently counted as zero movement.
    if closes.iter().any(|c| !c.is_finite()) {
        return None;
    }

    let alpha = 1.0 / period as f64;
    let decay = 1.0 - alpha;

    let mut gain_num = 0.0_f64;
    let mut loss_num = 0.0_f64;
    let mut weight = 0.0_f64;

    for w in closes.windows(2) {
        let delta = w[1] - w[0];
        let gain = if delta > 0.0 { delta } else { 0.0 };
        let loss = if delta < 0.0 { -delta } else { 0.0 };

        gain_num = gain_num * decay + gain;
        loss_num = loss_num * decay + loss;
        weight = weight * decay + 1.0;
    }

    let avg_gain = gain_num / weight;
    let avg_loss = loss_num / weight;

    rsi_from_averages(avg_gain, avg_loss).map(|rsi| round_to(rsi, RSI_PRECISION))
}

// =============================================================================
// Internal helpers
// =============================================================================

/// Convert average gain / average loss into an RSI value in [0, 100].
///
/// Zero average loss yields 100.0, including the no-movement case.
fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> Option<f64> {
    let rsi = if avg_loss == 0.0 {
        100.0
    } else {
        let rs = avg_gain / avg_loss;
        100.0 - 100.0 / (1.0 + rs)
    };

    if rsi.is_finite() {
        Some(rsi.clamp(0.0, 100.0))
    } else {
        None
    }
}
