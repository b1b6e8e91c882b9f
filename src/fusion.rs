// =============================================================================
// Fusion Engine — market snapshots + mentions + indicators => Asset Records
// =============================================================================
//
// Market snapshots are the join anchor: every snapshot yields exactly one
// record, and symbols that only appear in the mention counts or the indicator
// table are dropped.  Lookups go through symbol-keyed maps so the merge is
// linear in the number of snapshots.
//
// Missing signals resolve to fixed defaults:
//   - no mention entry   => social_mentions = 0
//   - no indicator entry => IndicatorSet::not_computed() for every interval
// =============================================================================

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, info};

use crate::error::{Result, ScreenerError};
use crate::indicators::{IndicatorSet, MacdResult, SymbolIndicators};
use crate::types::{canonical_symbol, IndicatorValue};

/// Market data for one coin as delivered by the market-data collector.
///
/// Field aliases accept the collector's native column names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    #[serde(default)]
    pub id: String,
    pub symbol: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, alias = "current_price", deserialize_with = "null_as_zero")]
    pub price: f64,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub market_cap: f64,
    #[serde(default)]
    pub market_cap_rank: Option<u32>,
    #[serde(default, alias = "total_volume", deserialize_with = "null_as_zero")]
    pub volume_24h: f64,
    #[serde(
        default,
        alias = "price_change_percentage_24h",
        deserialize_with = "null_as_zero"
    )]
    pub price_change_24h: f64,
    #[serde(
        default,
        alias = "price_change_percentage_7d_in_currency",
        deserialize_with = "null_as_zero"
    )]
    pub price_change_7d: f64,
    #[serde(default)]
    pub is_trending: bool,
}

/// The unified per-symbol record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetRecord {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub price: f64,
    pub market_cap: f64,
    pub market_cap_rank: Option<u32>,
    pub volume_24h: f64,
    pub price_change_24h: f64,
    pub price_change_7d: f64,
    pub is_trending: bool,
    pub social_mentions: u64,
    /// Indicator results keyed by interval label.
    pub indicators: BTreeMap<String, IndicatorSet>,
    /// `<field>_normalized` values added by the normalizer.
    #[serde(default)]
    pub normalized: BTreeMap<String, f64>,
}

impl AssetRecord {
    pub fn indicator(&self, interval: &str) -> IndicatorSet {
        self.indicators
            .get(interval)
            .copied()
            .unwrap_or_else(IndicatorSet::not_computed)
    }

    pub fn rsi(&self, interval: &str) -> IndicatorValue<f64> {
        self.indicator(interval).rsi
    }

    /// Flatten into a single-level map for tabular export or templating.
    ///
    /// Indicator columns are always present; anything short of a computed
    /// value is written as `null`.
    pub fn to_flat_row(&self) -> serde_json::Map<String, serde_json::Value> {
        use serde_json::{json, Value};

        let mut row = serde_json::Map::new();
        row.insert("id".into(), json!(self.id));
        row.insert("symbol".into(), json!(self.symbol));
        row.insert("name".into(), json!(self.name));
        row.insert("price".into(), json!(self.price));
        row.insert("market_cap".into(), json!(self.market_cap));
        row.insert("market_cap_rank".into(), json!(self.market_cap_rank));
        row.insert("volume_24h".into(), json!(self.volume_24h));
        row.insert("price_change_24h".into(), json!(self.price_change_24h));
        row.insert("price_change_7d".into(), json!(self.price_change_7d));
        row.insert("is_trending".into(), json!(self.is_trending));
        row.insert("social_mentions".into(), json!(self.social_mentions));

        for (label, set) in &self.indicators {
            row.insert(format!("rsi_{label}"), json!(set.rsi.value()));
            let macd: Option<&MacdResult> = set.macd.value();
            row.insert(format!("macd_{label}"), json!(macd.map(|m| m.macd_line)));
            row.insert(
                format!("macd_signal_{label}"),
                json!(macd.map(|m| m.signal_line)),
            );
            row.insert(
                format!("macd_histogram_{label}"),
                json!(macd.map(|m| m.histogram)),
            );
            row.insert(
                format!("macd_trend_{label}"),
                macd.map_or(Value::Null, |m| json!(m.histogram_trend.to_string())),
            );
        }

        for (field, value) in &self.normalized {
            row.insert(format!("{field}_normalized"), json!(value));
        }

        row
    }
}

/// Reject snapshot lists that contain the same canonical symbol twice.
pub fn validate_snapshots(snapshots: &[MarketSnapshot]) -> Result<()> {
    let mut seen = HashSet::with_capacity(snapshots.len());
    for snap in snapshots {
        let symbol = canonical_symbol(&snap.symbol);
        if !seen.insert(symbol.clone()) {
            return Err(ScreenerError::DuplicateSymbol { symbol });
        }
    }
    Ok(())
}

/// Merge all sources into one record per market snapshot, in snapshot order.
///
/// `intervals` lists the interval labels every record must carry.
pub fn fuse(
    snapshots: &[MarketSnapshot],
    mentions: &HashMap<String, u64>,
    indicators: &[SymbolIndicators],
    intervals: &[String],
) -> Result<Vec<AssetRecord>> {
    validate_snapshots(snapshots)?;

    let mut mention_index: HashMap<String, u64> = HashMap::with_capacity(mentions.len());
    for (symbol, count) in mentions {
        let total = mention_index.entry(canonical_symbol(symbol)).or_insert(0);
        *total = total.saturating_add(*count);
    }

    let indicator_index: HashMap<String, &SymbolIndicators> = indicators
        .iter()
        .map(|entry| (canonical_symbol(&entry.symbol), entry))
        .collect();

    let records: Vec<AssetRecord> = snapshots
        .iter()
        .map(|snap| {
            let symbol = canonical_symbol(&snap.symbol);
            let social_mentions = mention_index.get(&symbol).copied().unwrap_or(0);

            let mut by_interval: BTreeMap<String, IndicatorSet> = intervals
                .iter()
                .map(|label| (label.clone(), IndicatorSet::not_computed()))
                .collect();
            if let Some(entry) = indicator_index.get(&symbol) {
                for (label, set) in &entry.by_interval {
                    by_interval.insert(label.clone(), *set);
                }
            }

            AssetRecord {
                id: snap.id.clone(),
                symbol,
                name: snap.name.clone(),
                price: snap.price,
                market_cap: snap.market_cap,
                market_cap_rank: snap.market_cap_rank,
                volume_24h: snap.volume_24h,
                price_change_24h: snap.price_change_24h,
                price_change_7d: snap.price_change_7d,
                is_trending: snap.is_trending,
                social_mentions,
                indicators: by_interval,
                normalized: BTreeMap::new(),
            }
        })
        .collect();

    let anchored: HashSet<&str> = records.iter().map(|r| r.symbol.as_str()).collect();
    let dropped = mention_index
        .keys()
        .chain(indicator_index.keys())
        .filter(|s| !anchored.contains(s.as_str()))
        .collect::<HashSet<_>>()
        .len();
    if dropped > 0 {
        debug!(dropped, "symbols without market data dropped from fusion");
    }

    info!(records = records.len(), "fusion complete");
    Ok(records)
}

/// Flag snapshots whose coin id appears in the trending list.
pub fn mark_trending(snapshots: &mut [MarketSnapshot], trending_ids: &[String]) {
    let trending: HashSet<&str> = trending_ids.iter().map(String::as_str).collect();
    for snap in snapshots.iter_mut() {
        snap.is_trending = trending.contains(snap.id.as_str());
    }
}

fn null_as_zero<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0))
}
