// =============================================================================
// Breakout Scout — crypto screener core
// =============================================================================
//
// Stages, leaf first:
//
//   market_data  raw exchange klines => ascending candle series
//   indicators   RSI / MACD per (symbol, interval)
//   social       post titles => mention counts
//   fusion       snapshots + mentions + indicators => Asset Records
//   normalizer   min/max rescaling across the asset set
//   filters      mention filter & ranking, two-sided RSI screens
//   report       flat rows, ranking prompt, alert text
//   pipeline     the breakout, buy and alert runs wired end to end
// =============================================================================

pub mod error;
pub mod filters;
pub mod fusion;
pub mod indicators;
pub mod market_data;
pub mod normalizer;
pub mod pipeline;
pub mod report;
pub mod runtime_config;
pub mod social;
pub mod types;

pub use error::{Result, ScreenerError};
pub use pipeline::{CandidateReport, CollectedInputs, Screener};
pub use runtime_config::ScreenerConfig;
