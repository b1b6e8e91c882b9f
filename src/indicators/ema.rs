// =============================================================================
// Exponential Moving Average (EMA)
// =============================================================================
//
// EMA gives more weight to recent prices, making it more responsive to new
// information than the Simple Moving Average (SMA).
//
// Formula:
//   multiplier = 2 / (period + 1)
//   EMA_0      = value_0
//   EMA_t      = value_t * multiplier + EMA_{t-1} * (1 - multiplier)
//
// The recursion starts at the first sample so the output is aligned 1:1 with
// the input.  Non-finite inputs are NOT skipped: a NaN poisons every later
// value, and callers check finiteness of the samples they consume.
// =============================================================================

/// Compute the EMA series for `values` with look-back `period`.
///
/// The output has the same length as the input.
///
/// # Edge cases
/// - `period == 0` => empty vec
/// - empty input   => empty vec
pub fn calculate_ema(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || values.is_empty() {
        return Vec::new();
    }

    let multiplier = 2.0 / (period + 1) as f64;

    let mut result = Vec::with_capacity(values.len());
    let mut prev_ema = values[0];
    result.push(prev_ema);

    for &value in &values[1..] {
        let ema = value * multiplier + prev_ema * (1.0 - multiplier);
        result.push(ema);
        prev_ema = ema;
    }

    result
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ema_empty_input() {
        assert!(calculate_ema(&[], 5).is_empty());
    }

    #[test]
    fn ema_period_zero() {
        assert!(calculate_ema(&[1.0, 2.0, 3.0], 0).is_empty());
    }

    #[test]
    fn ema_same_length_as_input() {
        let values: Vec<f64> = (1..=10).map(|x| x as f64).collect();
        assert_eq!(calculate_ema(&values, 3).len(), 10);
    }

    #[test]
    fn ema_known_values() {
        // 3-period EMA, multiplier = 0.5, seeded with the first value.
        let ema = calculate_ema(&[2.0, 4.0, 6.0, 8.0], 3);
        let expected = [2.0, 3.0, 4.5, 6.25];
        for (a, b) in ema.iter().zip(expected.iter()) {
            assert!((a - b).abs() < 1e-10, "got {a}, expected {b}");
        }
    }

    #[test]
    fn ema_constant_series_stays_constant() {
        let ema = calculate_ema(&[7.0; 20], 12);
        for &v in &ema {
            assert!((v - 7.0).abs() < 1e-10);
        }
    }

    #[test]
    fn ema_nan_poisons_tail() {
        let ema = calculate_ema(&[1.0, 2.0, f64::NAN, 4.0], 3);
        assert_eq!(ema.len(), 4);
        assert!(ema[1].is_finite());
        assert!(ema[2].is_nan());
        assert!(ema[3].is_nan());
    }
}
