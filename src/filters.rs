// =============================================================================
// Filter & Ranker — candidate selection and RSI screens
// =============================================================================
//
// Two distinct inclusion rules, used by different pipelines:
//
//   - Mention filter:  social_mentions > threshold, ranked by mentions
//                      descending (stable on ties), capped at max_count.
//   - RSI screen:      both the short- and long-interval RSI must be
//                      computed AND beyond their thresholds (above for the
//                      overbought screen, below for the oversold screen).
//                      A missing RSI on either interval disqualifies.
// =============================================================================

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::fusion::AssetRecord;
use crate::indicators::SymbolIndicators;
use crate::types::IndicatorValue;

pub const DEFAULT_MENTION_THRESHOLD: u64 = 10;
pub const DEFAULT_MAX_CANDIDATES: usize = 10;

/// Keep records with more than `mention_threshold` mentions, most-mentioned
/// first, at most `max_count` of them.
///
/// The sort is stable: records with equal counts keep their input order.
pub fn select_candidates(
    records: Vec<AssetRecord>,
    mention_threshold: u64,
    max_count: usize,
) -> Vec<AssetRecord> {
    let total = records.len();

    let mut survivors: Vec<AssetRecord> = records
        .into_iter()
        .filter(|r| r.social_mentions > mention_threshold)
        .collect();
    let passed = survivors.len();

    survivors.sort_by(|a, b| b.social_mentions.cmp(&a.social_mentions));
    survivors.truncate(max_count);

    info!(
        total,
        passed,
        selected = survivors.len(),
        mention_threshold,
        max_count,
        "candidates selected"
    );
    survivors
}

// =============================================================================
// RSI screens
// =============================================================================

/// Anything that can report per-interval RSI for a symbol.
pub trait RsiSource {
    fn symbol(&self) -> &str;
    fn rsi(&self, interval: &str) -> IndicatorValue<f64>;
}

impl RsiSource for AssetRecord {
    fn symbol(&self) -> &str {
        &self.symbol
    }

    fn rsi(&self, interval: &str) -> IndicatorValue<f64> {
        AssetRecord::rsi(self, interval)
    }
}

impl RsiSource for SymbolIndicators {
    fn symbol(&self) -> &str {
        &self.symbol
    }

    fn rsi(&self, interval: &str) -> IndicatorValue<f64> {
        self.get(interval).rsi
    }
}

/// Which side of the thresholds a screen looks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RsiSignal {
    /// Both RSIs strictly above their thresholds (sell alert).
    Overbought,
    /// Both RSIs strictly below their thresholds (buy signal).
    Oversold,
}

/// Two-sided RSI threshold predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RsiScreen {
    pub short_interval: String,
    pub long_interval: String,
    pub short_threshold: f64,
    pub long_threshold: f64,
    pub signal: RsiSignal,
}

/// A symbol that passed an RSI screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RsiAlert {
    pub symbol: String,
    pub rsi_short: f64,
    pub rsi_long: f64,
}

impl RsiScreen {
    /// Evaluate one source.  Returns `None` if either RSI is missing or does
    /// not clear its threshold.
    pub fn evaluate<S: RsiSource + ?Sized>(&self, source: &S) -> Option<RsiAlert> {
        let short = source.rsi(&self.short_interval);
        let long = source.rsi(&self.long_interval);

        let (rsi_short, rsi_long) = match (short.value(), long.value()) {
            (Some(&s), Some(&l)) => (s, l),
            _ => {
                debug!(symbol = source.symbol(), "RSI screen: missing RSI, excluded");
                return None;
            }
        };

        let pass = match self.signal {
            RsiSignal::Overbought => {
                rsi_short > self.short_threshold && rsi_long > self.long_threshold
            }
            RsiSignal::Oversold => {
                rsi_short < self.short_threshold && rsi_long < self.long_threshold
            }
        };

        pass.then(|| RsiAlert {
            symbol: source.symbol().to_string(),
            rsi_short,
            rsi_long,
        })
    }
}

/// Apply `screen` to every source, preserving input order.
pub fn screen_rsi<S: RsiSource>(sources: &[S], screen: &RsiScreen) -> Vec<RsiAlert> {
    let alerts: Vec<RsiAlert> = sources.iter().filter_map(|s| screen.evaluate(s)).collect();
    info!(
        screened = sources.len(),
        passed = alerts.len(),
        signal = ?screen.signal,
        "RSI screen applied"
    );
    alerts
}
