// =============================================================================
// Series Preparer — raw exchange klines => ascending candle series
// =============================================================================
//
// Exchange kline rows arrive newest-first as JSON arrays whose cells are
// either strings or numbers:
//
//   [ time, open, close, high, low, volume, amount ]
//
// (close precedes high/low in this layout).  The preparer coerces every cell
// to a number, orders the rows oldest-first, rejects duplicate timestamps and
// keeps only the newest `keep` rows.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, ScreenerError};
use crate::types::canonical_symbol;

/// Number of cells the preparer reads from each raw row.
const KLINE_FIELDS: usize = 6;

/// One raw exchange row, cells as delivered.
pub type RawKline = Vec<serde_json::Value>;

/// A single OHLCV candle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Start of the sampling interval, unix seconds.
    pub open_time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    pub fn new(open_time: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            open_time,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// `open_time` as a UTC timestamp, `None` when out of chrono's range.
    pub fn opened_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.open_time, 0).single()
    }
}

/// Composite key that identifies a unique candle series.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct CandleKey {
    pub symbol: String,
    pub interval: String,
}

impl CandleKey {
    pub fn new(symbol: &str, interval: impl Into<String>) -> Self {
        Self {
            symbol: canonical_symbol(symbol),
            interval: interval.into(),
        }
    }
}

impl std::fmt::Display for CandleKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.symbol, self.interval)
    }
}

/// Shape raw rows into an ascending series holding at most `keep` candles.
///
/// Fails with `MalformedKline` for short rows or cells that are not finite
/// numbers, and with `NonAscendingTimestamps` when two rows share a
/// timestamp.
pub fn prepare_series(key: &CandleKey, rows: &[RawKline], keep: usize) -> Result<Vec<Candle>> {
    let mut candles = rows
        .iter()
        .enumerate()
        .map(|(i, row)| parse_row(key, i, row))
        .collect::<Result<Vec<_>>>()?;

    candles.sort_by_key(|c| c.open_time);
    validate_series(key, &candles)?;

    let start = candles.len().saturating_sub(keep);
    let kept = candles.split_off(start);

    debug!(key = %key, raw = rows.len(), kept = kept.len(), "series prepared");
    Ok(kept)
}

/// Check that `candles` is strictly ascending by `open_time`.
pub fn validate_series(key: &CandleKey, candles: &[Candle]) -> Result<()> {
    match candles
        .windows(2)
        .position(|w| w[1].open_time <= w[0].open_time)
    {
        Some(i) => Err(ScreenerError::NonAscendingTimestamps {
            key: key.to_string(),
            index: i + 1,
        }),
        None => Ok(()),
    }
}

/// Closing prices of a series, oldest first.
pub fn closes(candles: &[Candle]) -> Vec<f64> {
    candles.iter().map(|c| c.close).collect()
}

// =============================================================================
// Internal helpers
// =============================================================================

fn parse_row(key: &CandleKey, index: usize, row: &RawKline) -> Result<Candle> {
    if row.len() < KLINE_FIELDS {
        return Err(ScreenerError::MalformedKline {
            key: key.to_string(),
            reason: format!("row {index} has {} fields, expected {KLINE_FIELDS}", row.len()),
        });
    }

    let field = |pos: usize, name: &str| -> Result<f64> {
        parse_cell(&row[pos]).ok_or_else(|| ScreenerError::MalformedKline {
            key: key.to_string(),
            reason: format!("row {index}: {name} is not a finite number: {}", row[pos]),
        })
    };

    let time = field(0, "time")?;
    let open = field(1, "open")?;
    let close = field(2, "close")?;
    let high = field(3, "high")?;
    let low = field(4, "low")?;
    let volume = field(5, "volume")?;

    Ok(Candle::new(time as i64, open, high, low, close, volume))
}

/// Exchanges send numbers either as JSON numbers or as decimal strings.
fn parse_cell(val: &serde_json::Value) -> Option<f64> {
    let n = match val {
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok()?,
        serde_json::Value::Number(n) => n.as_f64()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}
