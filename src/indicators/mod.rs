// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free implementations of the momentum indicators used by
// the screener.  Every calculator returns `Option<T>` so callers are forced to
// handle insufficient-data and numerical-edge-case scenarios; the table
// builder below lifts those options into `IndicatorValue`s per symbol and
// interval.

pub mod ema;
pub mod macd;
pub mod rsi;

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Result, ScreenerError};
use crate::market_data::{closes, validate_series, Candle, CandleKey};
use crate::types::IndicatorValue;

pub use macd::{calculate_macd, classify_trend, MacdResult};
pub use rsi::calculate_rsi;

/// Look-back periods for one calculator run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorParams {
    pub rsi_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            rsi_period: rsi::DEFAULT_RSI_PERIOD,
            macd_fast: macd::DEFAULT_MACD_FAST,
            macd_slow: macd::DEFAULT_MACD_SLOW,
            macd_signal: macd::DEFAULT_MACD_SIGNAL,
        }
    }
}

/// RSI and MACD for one symbol on one interval.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct IndicatorSet {
    pub rsi: IndicatorValue<f64>,
    pub macd: IndicatorValue<MacdResult>,
}

impl IndicatorSet {
    /// Marker for an interval that was never handed to the calculator.
    pub fn not_computed() -> Self {
        Self::default()
    }
}

/// All indicator sets of one symbol, keyed by interval label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolIndicators {
    pub symbol: String,
    pub by_interval: BTreeMap<String, IndicatorSet>,
}

impl SymbolIndicators {
    pub fn get(&self, interval: &str) -> IndicatorSet {
        self.by_interval
            .get(interval)
            .copied()
            .unwrap_or_else(IndicatorSet::not_computed)
    }
}

/// Run both calculators over one closing-price series.
///
/// The two indicators are independent: a series long enough for RSI but not
/// for MACD yields a value for the former and `Unavailable` for the latter.
pub fn compute_indicator_set(closes: &[f64], params: &IndicatorParams) -> IndicatorSet {
    IndicatorSet {
        rsi: calculate_rsi(closes, params.rsi_period).into(),
        macd: calculate_macd(
            closes,
            params.macd_fast,
            params.macd_slow,
            params.macd_signal,
        )
        .into(),
    }
}

/// Build the per-symbol indicator table from prepared series.
///
/// Each series is checked for strictly ascending timestamps first.  Output
/// follows first-seen symbol order; every label in `intervals` is present for
/// every symbol, as `NotComputed` when no series was supplied for it.  Two
/// series for the same symbol and interval are rejected with `DuplicateSeries`.
pub fn compute_indicators(
    series: &[(CandleKey, Vec<Candle>)],
    intervals: &[String],
    params: &IndicatorParams,
) -> Result<Vec<SymbolIndicators>> {
    let mut table: Vec<SymbolIndicators> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for (key, candles) in series {
        validate_series(key, candles)?;

        let set = compute_indicator_set(&closes(candles), params);
        debug!(
            key = %key,
            candles = candles.len(),
            rsi = ?set.rsi.value(),
            macd_available = set.macd.is_available(),
            "indicators computed"
        );

        let slot = *index.entry(key.symbol.clone()).or_insert_with(|| {
            table.push(SymbolIndicators {
                symbol: key.symbol.clone(),
                by_interval: BTreeMap::new(),
            });
            table.len() - 1
        });
        if table[slot]
            .by_interval
            .insert(key.interval.clone(), set)
            .is_some()
        {
            return Err(ScreenerError::DuplicateSeries {
                key: key.to_string(),
            });
        }
    }

    for entry in &mut table {
        for interval in intervals {
            entry
                .by_interval
                .entry(interval.clone())
                .or_insert_with(IndicatorSet::not_computed);
        }
    }

    info!(series = series.len(), symbols = table.len(), "indicator table built");
    Ok(table)
}

/// Round `value` to `decimals` places.
pub(crate) fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10_f64.powi(decimals as i32);
    (value * factor).round() / factor
}
