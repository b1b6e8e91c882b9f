// =============================================================================
// Moving Average Convergence Divergence (MACD)
// =============================================================================
//
//   macd_line   = EMA(close, fast) - EMA(close, slow)
//   signal_line = EMA(macd_line, signal)
//   histogram   = macd_line - signal_line
//
// The histogram trend compares the last two histogram samples.  All numeric
// outputs are rounded to 6 decimals; the trend is classified on the raw
// values.
// =============================================================================

use serde::{Deserialize, Serialize};

use super::ema::calculate_ema;
use super::round_to;
use crate::types::HistogramTrend;

pub const DEFAULT_MACD_FAST: usize = 12;
pub const DEFAULT_MACD_SLOW: usize = 26;
pub const DEFAULT_MACD_SIGNAL: usize = 9;

const MACD_PRECISION: u32 = 6;

/// Latest MACD reading for one series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacdResult {
    pub macd_line: f64,
    pub signal_line: f64,
    pub histogram: f64,
    pub histogram_trend: HistogramTrend,
}

/// Compute the latest MACD triple of `closes`.
///
/// Returns `None` when any period is zero, when `closes.len() < slow`, or when
/// any of the three latest values is not finite.
pub fn calculate_macd(
    closes: &[f64],
    fast: usize,
    slow: usize,
    signal: usize,
) -> Option<MacdResult> {
    if fast == 0 || slow == 0 || signal == 0 || closes.len() < slow {
        return None;
    }

    let ema_fast = calculate_ema(closes, fast);
    let ema_slow = calculate_ema(closes, slow);

    let macd_series: Vec<f64> = ema_fast
        .iter()
        .zip(ema_slow.iter())
        .map(|(f, s)| f - s)
        .collect();
    let signal_series = calculate_ema(&macd_series, signal);
    let histogram_series: Vec<f64> = macd_series
        .iter()
        .zip(signal_series.iter())
        .map(|(m, s)| m - s)
        .collect();

    let macd_line = *macd_series.last()?;
    let signal_line = *signal_series.last()?;
    let histogram = *histogram_series.last()?;

    if !(macd_line.is_finite() && signal_line.is_finite() && histogram.is_finite()) {
        return None;
    }

    let histogram_trend = match histogram_series.len() {
        n if n >= 2 => classify_trend(histogram_series[n - 2], histogram_series[n - 1]),
        _ => HistogramTrend::Unavailable,
    };

    Some(MacdResult {
        macd_line: round_to(macd_line, MACD_PRECISION),
        signal_line: round_to(signal_line, MACD_PRECISION),
        histogram: round_to(histogram, MACD_PRECISION),
        histogram_trend,
    })
}

/// Classify the move from `previous` to `latest`.
///
/// Any non-finite operand yields `Unavailable`; otherwise the comparison is
/// strict.
pub fn classify_trend(previous: f64, latest: f64) -> HistogramTrend {
    if !previous.is_finite() || !latest.is_finite() {
        return HistogramTrend::Unavailable;
    }
    if latest > previous {
        HistogramTrend::Increasing
    } else if latest < previous {
        HistogramTrend::Decreasing
    } else {
        HistogramTrend::Flat
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    fn ascending(n: usize) -> Vec<f64> {
        (1..=n).map(|i| i as f64).collect()
    }

    #[test]
    fn macd_insufficient_data() {
        assert!(calculate_macd(&ascending(25), 12, 26, 9).is_none());
    }

    #[test]
    fn macd_zero_period() {
        assert!(calculate_macd(&ascending(40), 0, 26, 9).is_none());
        assert!(calculate_macd(&ascending(40), 12, 26, 0).is_none());
    }

    #[test]
    fn macd_exactly_slow_length_is_available() {
        assert!(calculate_macd(&ascending(26), 12, 26, 9).is_some());
    }

    #[test]
    fn macd_flat_series() {
        let result = calculate_macd(&[50.0; 30], 12, 26, 9).unwrap();
        assert_eq!(result.macd_line, 0.0);
        assert_eq!(result.signal_line, 0.0);
        assert_eq!(result.histogram, 0.0);
        assert_eq!(result.histogram_trend, HistogramTrend::Flat);
    }

    #[test]
    fn macd_rising_series_is_positive() {
        let result = calculate_macd(&ascending(60), 12, 26, 9).unwrap();
        assert!(result.macd_line > 0.0);
        assert!(result.signal_line > 0.0);
        assert!(result.histogram.is_finite());
        assert_ne!(result.histogram_trend, HistogramTrend::Unavailable);
    }

    #[test]
    fn macd_falling_series_is_negative() {
        let closes: Vec<f64> = (1..=60).rev().map(|x| x as f64).collect();
        let result = calculate_macd(&closes, 12, 26, 9).unwrap();
        assert!(result.macd_line < 0.0);
    }

    #[test]
    fn macd_rounded_to_six_decimals() {
        let result = calculate_macd(&ascending(45), 12, 26, 9).unwrap();
        let scaled = result.macd_line * 1e6;
        assert!((scaled - scaled.round()).abs() < 1e-3);
    }

    #[test]
    fn macd_nan_tail_is_unavailable() {
        let mut closes = ascending(40);
        closes[39] = f64::NAN;
        assert!(calculate_macd(&closes, 12, 26, 9).is_none());
    }

    #[test]
    fn macd_single_sample_has_no_trend() {
        let result = calculate_macd(&[10.0], 1, 1, 1).unwrap();
        assert_eq!(result.histogram_trend, HistogramTrend::Unavailable);
    }

    // ---- classify_trend --------------------------------------------------

    #[test]
    fn macd_jump_up_after_flat_is_increasing() {
        let mut closes = vec![10.0; 29];
        closes.push(20.0);
        let result = calculate_macd(&closes, 12, 26, 9).unwrap();
        assert!(result.histogram > 0.0);
        assert_eq!(result.histogram_trend, HistogramTrend::Increasing);
    }

    #[test]
    fn macd_drop_after_flat_is_decreasing() {
        let mut closes = vec![10.0; 29];
        closes.push(0.0);
        let result = calculate_macd(&closes, 12, 26, 9).unwrap();
        assert!(result.histogram < 0.0);
        assert_eq!(result.histogram_trend, HistogramTrend::Decreasing);
    }

    #[test]
    fn trend_increasing() {
        assert_eq!(classify_trend(0.5, 0.8), HistogramTrend::Increasing);
    }

    #[test]
    fn trend_decreasing_and_flat() {
        assert_eq!(classify_trend(0.8, 0.5), HistogramTrend::Decreasing);
        assert_eq!(classify_trend(0.3, 0.3), HistogramTrend::Flat);
    }

    #[test]
    fn trend_nan_operand() {
        assert_eq!(classify_trend(f64::NAN, 0.8), HistogramTrend::Unavailable);
        assert_eq!(classify_trend(0.5, f64::NAN), HistogramTrend::Unavailable);
    }
}
