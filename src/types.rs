// =============================================================================
// Shared types used across the screener core
// =============================================================================

use serde::{Deserialize, Serialize};

/// Outcome of an indicator lookup for one symbol and interval.
///
/// `Unavailable` means the calculator ran and could not produce a value
/// (short history, non-finite result).  `NotComputed` means the symbol never
/// reached the calculator for that interval at all.  Predicates treat both
/// the same way; the distinction is kept for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum IndicatorValue<T> {
    NotComputed,
    Unavailable,
    Value(T),
}

impl<T> IndicatorValue<T> {
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Value(_))
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Value(v) => Some(v),
            _ => None,
        }
    }
}

impl<T> From<Option<T>> for IndicatorValue<T> {
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(v) => Self::Value(v),
            None => Self::Unavailable,
        }
    }
}

impl<T> Default for IndicatorValue<T> {
    fn default() -> Self {
        Self::NotComputed
    }
}

/// Direction of the MACD histogram between the last two samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistogramTrend {
    Increasing,
    Decreasing,
    Flat,
    Unavailable,
}

impl std::fmt::Display for HistogramTrend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Increasing => write!(f, "increasing"),
            Self::Decreasing => write!(f, "decreasing"),
            Self::Flat => write!(f, "flat"),
            Self::Unavailable => write!(f, "unavailable"),
        }
    }
}

/// Canonical form of a coin symbol: trimmed and upper-cased.
pub fn canonical_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}
