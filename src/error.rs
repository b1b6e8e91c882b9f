// =============================================================================
// Boundary errors
// =============================================================================
//
// Indicator math, fusion, normalisation and filtering are total: they never
// fail for well-typed input.  The only hard failures are precondition
// violations caught when inputs enter the core.

use thiserror::Error as ThisError;

#[derive(ThisError, Debug, Clone, PartialEq)]
pub enum ScreenerError {
    #[error("duplicate symbol in market snapshots: {symbol}")]
    DuplicateSymbol { symbol: String },

    #[error("candle series {key} is not strictly ascending at index {index}")]
    NonAscendingTimestamps { key: String, index: usize },

    #[error("more than one candle series supplied for {key}")]
    DuplicateSeries { key: String },

    #[error("malformed kline for {key}: {reason}")]
    MalformedKline { key: String, reason: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, ScreenerError>;
