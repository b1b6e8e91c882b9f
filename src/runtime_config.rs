// =============================================================================
// Runtime Configuration — screener settings with env overrides
// =============================================================================
//
// Every tunable parameter of the screener lives here.  All fields carry a
// serde default so that a partial (or empty) JSON file still loads, and a
// handful of thresholds can be overridden from the environment.
//
// =============================================================================

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::ScreenerError;
use crate::filters::{RsiScreen, RsiSignal, DEFAULT_MAX_CANDIDATES, DEFAULT_MENTION_THRESHOLD};
use crate::indicators::macd::{DEFAULT_MACD_FAST, DEFAULT_MACD_SIGNAL, DEFAULT_MACD_SLOW};
use crate::indicators::rsi::DEFAULT_RSI_PERIOD;
use crate::indicators::IndicatorParams;
use crate::normalizer::NumericField;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_rsi_period() -> usize {
    DEFAULT_RSI_PERIOD
}

fn default_macd_fast() -> usize {
    DEFAULT_MACD_FAST
}

fn default_macd_slow() -> usize {
    DEFAULT_MACD_SLOW
}

fn default_macd_signal() -> usize {
    DEFAULT_MACD_SIGNAL
}

fn default_intervals() -> Vec<IntervalSpec> {
    vec![
        IntervalSpec::new("1d", "1day"),
        IntervalSpec::new("7d", "1week"),
    ]
}

fn default_short_interval() -> String {
    "1d".to_string()
}

fn default_long_interval() -> String {
    "7d".to_string()
}

fn default_candle_limit() -> usize {
    30
}

fn default_mention_threshold() -> u64 {
    DEFAULT_MENTION_THRESHOLD
}

fn default_max_candidates() -> usize {
    DEFAULT_MAX_CANDIDATES
}

fn default_normalize_fields() -> Vec<NumericField> {
    vec![NumericField::SocialMentions]
}

fn default_rsi_sell_short() -> f64 {
    80.0
}

fn default_rsi_sell_long() -> f64 {
    70.0
}

fn default_rsi_buy() -> f64 {
    50.0
}

// =============================================================================
// IntervalSpec
// =============================================================================

/// One sampling interval: the label used in indicator columns and the
/// exchange's code for the candle interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalSpec {
    pub label: String,
    pub source: String,
}

impl IntervalSpec {
    pub fn new(label: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            source: source.into(),
        }
    }
}

// =============================================================================
// ScreenerConfig
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenerConfig {
    // --- Indicator periods ---------------------------------------------------
    #[serde(default = "default_rsi_period")]
    pub rsi_period: usize,

    #[serde(default = "default_macd_fast")]
    pub macd_fast: usize,

    #[serde(default = "default_macd_slow")]
    pub macd_slow: usize,

    #[serde(default = "default_macd_signal")]
    pub macd_signal: usize,

    // --- Intervals -----------------------------------------------------------

    /// Intervals indicators are computed for.
    #[serde(default = "default_intervals")]
    pub intervals: Vec<IntervalSpec>,

    /// Label of the interval used as the short side of RSI screens.
    #[serde(default = "default_short_interval")]
    pub short_interval: String,

    /// Label of the interval used as the long side of RSI screens.
    #[serde(default = "default_long_interval")]
    pub long_interval: String,

    /// Kline window kept per series, on top of the RSI warm-up.
    #[serde(default = "default_candle_limit")]
    pub candle_limit: usize,

    // --- Candidate selection -------------------------------------------------
    #[serde(default = "default_mention_threshold")]
    pub mention_threshold: u64,

    #[serde(default = "default_max_candidates")]
    pub max_candidates: usize,

    #[serde(default = "default_normalize_fields")]
    pub normalize_fields: Vec<NumericField>,

    // --- RSI screens ---------------------------------------------------------
    #[serde(default = "default_rsi_sell_short")]
    pub rsi_sell_short_threshold: f64,

    #[serde(default = "default_rsi_sell_long")]
    pub rsi_sell_long_threshold: f64,

    #[serde(default = "default_rsi_buy")]
    pub rsi_buy_short_threshold: f64,

    #[serde(default = "default_rsi_buy")]
    pub rsi_buy_long_threshold: f64,
}

impl Default for ScreenerConfig {
    fn default() -> Self {
        Self {
            rsi_period: default_rsi_period(),
            macd_fast: default_macd_fast(),
            macd_slow: default_macd_slow(),
            macd_signal: default_macd_signal(),
            intervals: default_intervals(),
            short_interval: default_short_interval(),
            long_interval: default_long_interval(),
            candle_limit: default_candle_limit(),
            mention_threshold: default_mention_threshold(),
            max_candidates: default_max_candidates(),
            normalize_fields: default_normalize_fields(),
            rsi_sell_short_threshold: default_rsi_sell_short(),
            rsi_sell_long_threshold: default_rsi_sell_long(),
            rsi_buy_short_threshold: default_rsi_buy(),
            rsi_buy_long_threshold: default_rsi_buy(),
        }
    }
}

impl ScreenerConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read screener config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse screener config from {}", path.display()))?;

        info!(
            path = %path.display(),
            intervals = config.intervals.len(),
            mention_threshold = config.mention_threshold,
            max_candidates = config.max_candidates,
            "screener config loaded"
        );

        Ok(config)
    }

    /// Override thresholds from environment variables when present.
    ///
    /// Unparseable values are ignored with a warning.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        fn parse<T: std::str::FromStr>(
            lookup: &impl Fn(&str) -> Option<String>,
            name: &str,
        ) -> Option<T> {
            let raw = lookup(name)?;
            match raw.trim().parse::<T>() {
                Ok(v) => Some(v),
                Err(_) => {
                    warn!(var = name, value = %raw, "ignoring unparseable override");
                    None
                }
            }
        }

        if let Some(v) = parse(&lookup, "RSI_SELL_1D_THRESHOLD") {
            self.rsi_sell_short_threshold = v;
        }
        if let Some(v) = parse(&lookup, "RSI_SELL_7D_THRESHOLD") {
            self.rsi_sell_long_threshold = v;
        }
        if let Some(v) = parse(&lookup, "RSI_BUY_1D_THRESHOLD") {
            self.rsi_buy_short_threshold = v;
        }
        if let Some(v) = parse(&lookup, "RSI_BUY_7D_THRESHOLD") {
            self.rsi_buy_long_threshold = v;
        }
        if let Some(v) = parse(&lookup, "MENTION_THRESHOLD") {
            self.mention_threshold = v;
        }
        if let Some(v) = parse(&lookup, "MAX_COINS") {
            self.max_candidates = v;
        }
    }

    /// Reject settings the core cannot run with.
    pub fn validate(&self) -> std::result::Result<(), ScreenerError> {
        let invalid = |msg: String| Err(ScreenerError::InvalidConfig(msg));

        if self.rsi_period == 0 || self.macd_fast == 0 || self.macd_slow == 0 || self.macd_signal == 0
        {
            return invalid("indicator periods must be positive".into());
        }
        if self.macd_fast >= self.macd_slow {
            return invalid(format!(
                "macd_fast ({}) must be below macd_slow ({})",
                self.macd_fast, self.macd_slow
            ));
        }
        if self.max_candidates == 0 {
            return invalid("max_candidates must be positive".into());
        }
        if self.intervals.is_empty() {
            return invalid("at least one interval is required".into());
        }
        for side in [&self.short_interval, &self.long_interval] {
            if !self.intervals.iter().any(|i| &i.label == side) {
                return invalid(format!("screen interval {side} is not configured"));
            }
        }
        Ok(())
    }

    pub fn indicator_params(&self) -> IndicatorParams {
        IndicatorParams {
            rsi_period: self.rsi_period,
            macd_fast: self.macd_fast,
            macd_slow: self.macd_slow,
            macd_signal: self.macd_signal,
        }
    }

    /// Interval labels in configuration order.
    pub fn interval_labels(&self) -> Vec<String> {
        self.intervals.iter().map(|i| i.label.clone()).collect()
    }

    /// Rows kept per series by the preparer: the window plus RSI warm-up.
    pub fn series_keep(&self) -> usize {
        self.candle_limit + self.rsi_period
    }

    /// Overbought screen built from the sell thresholds.
    pub fn sell_screen(&self) -> RsiScreen {
        RsiScreen {
            short_interval: self.short_interval.clone(),
            long_interval: self.long_interval.clone(),
            short_threshold: self.rsi_sell_short_threshold,
            long_threshold: self.rsi_sell_long_threshold,
            signal: RsiSignal::Overbought,
        }
    }

    /// Oversold screen built from the buy thresholds.
    pub fn buy_screen(&self) -> RsiScreen {
        RsiScreen {
            short_interval: self.short_interval.clone(),
            long_interval: self.long_interval.clone(),
            short_threshold: self.rsi_buy_short_threshold,
            long_threshold: self.rsi_buy_long_threshold,
            signal: RsiSignal::Oversold,
        }
    }
}
