pub mod series;

// Re-export the candle types for convenient access (e.g. `use crate::market_data::Candle`).
pub use series::{closes, prepare_series, validate_series, Candle, CandleKey, RawKline};
