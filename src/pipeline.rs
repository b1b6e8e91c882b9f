// =============================================================================
// Screener pipelines
// =============================================================================
//
// Three instantiations of the same stages:
//
//   breakout:  prepare => indicators => fuse => normalize => select
//   buy:       prepare => indicators => oversold screen => (restrict market)
//              => fuse => normalize => select
//   alerts:    prepare => indicators => overbought screen
//
// A `Screener` only borrows its configuration; every run builds fresh
// records, so repeated runs over the same inputs give identical output.
// =============================================================================

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::filters::{screen_rsi, select_candidates, RsiAlert};
use crate::fusion::{fuse, mark_trending, AssetRecord, MarketSnapshot};
use crate::indicators::{compute_indicators, IndicatorSet, SymbolIndicators};
use crate::market_data::{prepare_series, Candle, CandleKey, RawKline};
use crate::normalizer::normalize;
use crate::report::render_prompt;
use crate::runtime_config::ScreenerConfig;
use crate::social::count_mentions;
use crate::types::canonical_symbol;

/// Raw klines keyed by symbol, then by interval label (or exchange code).
pub type KlineTable = BTreeMap<String, BTreeMap<String, Vec<RawKline>>>;

/// Everything the collectors gathered for one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollectedInputs {
    #[serde(default)]
    pub market: Vec<MarketSnapshot>,
    /// Coin ids currently trending; when non-empty it overrides the
    /// snapshots' own `is_trending` flags.
    #[serde(default)]
    pub trending_ids: Vec<String>,
    /// Pre-counted mentions.  When absent they are counted from
    /// `post_titles`.
    #[serde(default)]
    pub mentions: Option<HashMap<String, u64>>,
    #[serde(default)]
    pub post_titles: Vec<String>,
    #[serde(default)]
    pub klines: KlineTable,
    /// Symbols screened by the alert run.
    #[serde(default)]
    pub watchlist: Vec<String>,
}

/// Output of the breakout and buy pipelines.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateReport {
    pub candidates: Vec<AssetRecord>,
    /// Candidates flattened for tabular export.
    pub rows: Vec<serde_json::Map<String, serde_json::Value>>,
    /// Ranking request for the scoring collaborator.
    pub prompt: String,
    /// Symbols that passed the oversold screen (buy pipeline only).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub buy_signals: Vec<RsiAlert>,
}

pub struct Screener<'a> {
    config: &'a ScreenerConfig,
}

impl<'a> Screener<'a> {
    /// Validate `config` and build a screener around it.
    pub fn new(config: &'a ScreenerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Shape every raw kline list into an ascending series.
    ///
    /// Interval keys may be either the configured label or the exchange
    /// code; unknown intervals are skipped.  Supplying both for one symbol
    /// fails with `DuplicateSeries` when the table is built.
    pub fn prepare(&self, klines: &KlineTable) -> Result<Vec<(CandleKey, Vec<Candle>)>> {
        let keep = self.config.series_keep();
        let mut prepared = Vec::new();

        for (symbol, by_interval) in klines {
            for (interval, rows) in by_interval {
                let Some(label) = self.resolve_interval(interval) else {
                    warn!(symbol = %symbol, interval = %interval, "unknown interval, skipped");
                    continue;
                };
                let key = CandleKey::new(symbol, label);
                let series = prepare_series(&key, rows, keep)?;
                prepared.push((key, series));
            }
        }

        debug!(series = prepared.len(), "klines prepared");
        Ok(prepared)
    }

    /// Prepared series => per-symbol indicator table.
    pub fn indicator_table(&self, klines: &KlineTable) -> Result<Vec<SymbolIndicators>> {
        let series = self.prepare(klines)?;
        compute_indicators(
            &series,
            &self.config.interval_labels(),
            &self.config.indicator_params(),
        )
    }

    /// Fuse, normalize and rank the full market.
    pub fn run_breakout(&self, inputs: &CollectedInputs) -> Result<CandidateReport> {
        info!(market = inputs.market.len(), "breakout run started");
        let table = self.indicator_table(&inputs.klines)?;
        let market = self.market_with_trending(inputs, None);
        self.rank(inputs, market, &table, Vec::new())
    }

    /// Keep only coins whose RSIs are all below the buy thresholds, then rank
    /// them like the breakout run.
    pub fn run_buy(&self, inputs: &CollectedInputs) -> Result<CandidateReport> {
        info!(market = inputs.market.len(), "buy run started");
        let table = self.indicator_table(&inputs.klines)?;

        let buy_signals = screen_rsi(&table, &self.config.buy_screen());
        let allowed: HashSet<String> = buy_signals.iter().map(|a| a.symbol.clone()).collect();

        let market = self.market_with_trending(inputs, Some(&allowed));
        info!(
            market = inputs.market.len(),
            remaining = market.len(),
            "market restricted by buy screen"
        );
        self.rank(inputs, market, &table, buy_signals)
    }

    /// Overbought screen over a plain watchlist.
    ///
    /// Watchlist symbols without klines are reported as excluded, never as
    /// errors.  Output follows watchlist order.
    pub fn run_alerts(&self, watchlist: &[String], klines: &KlineTable) -> Result<Vec<RsiAlert>> {
        info!(watchlist = watchlist.len(), "alert run started");
        let table = self.indicator_table(klines)?;
        let by_symbol: HashMap<&str, &SymbolIndicators> =
            table.iter().map(|e| (e.symbol.as_str(), e)).collect();

        let labels = self.config.interval_labels();
        let mut seen = HashSet::new();
        let ordered: Vec<SymbolIndicators> = watchlist
            .iter()
            .map(|s| canonical_symbol(s))
            .filter(|s| !s.is_empty() && seen.insert(s.clone()))
            .map(|symbol| match by_symbol.get(symbol.as_str()) {
                Some(entry) => (*entry).clone(),
                None => SymbolIndicators {
                    by_interval: labels
                        .iter()
                        .map(|l| (l.clone(), IndicatorSet::not_computed()))
                        .collect(),
                    symbol,
                },
            })
            .collect();

        Ok(screen_rsi(&ordered, &self.config.sell_screen()))
    }

    // -------------------------------------------------------------------------
    // Internal helpers
    // -------------------------------------------------------------------------

    fn rank(
        &self,
        inputs: &CollectedInputs,
        market: Vec<MarketSnapshot>,
        table: &[SymbolIndicators],
        buy_signals: Vec<RsiAlert>,
    ) -> Result<CandidateReport> {
        let mentions = match &inputs.mentions {
            Some(counts) => counts.clone(),
            None => {
                let symbols: Vec<String> = market.iter().map(|m| m.symbol.clone()).collect();
                count_mentions(&inputs.post_titles, &symbols)
            }
        };

        let records = fuse(&market, &mentions, table, &self.config.interval_labels())?;
        let records = normalize(records, &self.config.normalize_fields);
        let candidates = select_candidates(
            records,
            self.config.mention_threshold,
            self.config.max_candidates,
        );

        let rows = candidates.iter().map(AssetRecord::to_flat_row).collect();
        let prompt = render_prompt(&candidates);

        Ok(CandidateReport {
            candidates,
            rows,
            prompt,
            buy_signals,
        })
    }

    fn market_with_trending(
        &self,
        inputs: &CollectedInputs,
        allowed: Option<&HashSet<String>>,
    ) -> Vec<MarketSnapshot> {
        let mut market: Vec<MarketSnapshot> = inputs
            .market
            .iter()
            .filter(|m| allowed.map_or(true, |set| set.contains(&canonical_symbol(&m.symbol))))
            .cloned()
            .collect();
        if !inputs.trending_ids.is_empty() {
            mark_trending(&mut market, &inputs.trending_ids);
        }
        market
    }

    fn resolve_interval(&self, interval: &str) -> Option<&str> {
        self.config
            .intervals
            .iter()
            .find(|i| i.label == interval || i.source == interval)
            .map(|i| i.label.as_str())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScreenerError;
    use crate::types::IndicatorValue;
    use serde_json::json;

    fn snapshot(id: &str, symbol: &str) -> MarketSnapshot {
        MarketSnapshot {
            id: id.to_string(),
            symbol: symbol.to_string(),
            name: symbol.to_string(),
            price: 1.0,
            market_cap: 10.0,
            market_cap_rank: None,
            volume_24h: 5.0,
            price_change_24h: 0.0,
            price_change_7d: 0.0,
            is_trending: false,
        }
    }

    /// Newest-first raw rows for the given closes (oldest first).
    fn raw_rows(closes: &[f64]) -> Vec<RawKline> {
        closes
            .iter()
            .enumerate()
            .rev()
            .map(|(i, c)| {
                vec![
                    json!((i as i64 * 86_400).to_string()),
                    json!(c.to_string()),
                    json!(c.to_string()),
                    json!(c.to_string()),
                    json!(c.to_string()),
                    json!("1"),
                    json!("1"),
                ]
            })
            .collect()
    }

    fn klines(entries: &[(&str, &str, Vec<f64>)]) -> KlineTable {
        let mut table = KlineTable::new();
        for (symbol, interval, closes) in entries {
            table
                .entry(symbol.to_string())
                .or_default()
                .insert(interval.to_string(), raw_rows(closes));
        }
        table
    }

    fn rising(n: usize) -> Vec<f64> {
        (1..=n).map(|x| x as f64).collect()
    }

    fn falling(n: usize) -> Vec<f64> {
        (1..=n).rev().map(|x| x as f64).collect()
    }

    fn mentions(pairs: &[(&str, u64)]) -> Option<HashMap<String, u64>> {
        Some(pairs.iter().map(|(s, c)| (s.to_string(), *c)).collect())
    }

    #[test]
    fn breakout_ranks_by_mentions() {
        let config = ScreenerConfig::default();
        let screener = Screener::new(&config).unwrap();
        let inputs = CollectedInputs {
            market: vec![
                snapshot("a", "A"),
                snapshot("b", "B"),
                snapshot("c", "C"),
                snapshot("d", "D"),
            ],
            mentions: mentions(&[("A", 15), ("B", 10), ("C", 20), ("D", 5)]),
            ..Default::default()
        };

        let report = screener.run_breakout(&inputs).unwrap();
        let order: Vec<&str> = report.candidates.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(order, vec!["C", "A"]);
        assert_eq!(report.rows.len(), 2);
        assert!(report.rows[0].contains_key("rsi_1d"));
        assert!(report.rows[0].contains_key("social_mentions_normalized"));
        assert!(report.prompt.contains("--- C (C) ---"));
        assert!(report.buy_signals.is_empty());
    }

    #[test]
    fn breakout_counts_mentions_from_titles() {
        let config = ScreenerConfig {
            mention_threshold: 1,
            ..Default::default()
        };
        let screener = Screener::new(&config).unwrap();
        let inputs = CollectedInputs {
            market: vec![snapshot("bitcoin", "btc"), snapshot("ethereum", "eth")],
            post_titles: vec![
                "BTC breaks out".into(),
                "is $btc done?".into(),
                "ETH gas fees".into(),
            ],
            trending_ids: vec!["ethereum".into()],
            ..Default::default()
        };

        let report = screener.run_breakout(&inputs).unwrap();
        assert_eq!(report.candidates.len(), 1);
        assert_eq!(report.candidates[0].symbol, "BTC");
        assert_eq!(report.candidates[0].social_mentions, 2);
        assert!(!report.candidates[0].is_trending);
    }

    #[test]
    fn breakout_carries_indicators() {
        let config = ScreenerConfig {
            mention_threshold: 0,
            ..Default::default()
        };
        let screener = Screener::new(&config).unwrap();
        let inputs = CollectedInputs {
            market: vec![snapshot("bitcoin", "BTC")],
            mentions: mentions(&[("BTC", 1)]),
            klines: klines(&[("btc", "1day", rising(40))]),
            ..Default::default()
        };

        let report = screener.run_breakout(&inputs).unwrap();
        let btc = &report.candidates[0];
        assert_eq!(btc.rsi("1d"), IndicatorValue::Value(100.0));
        assert!(btc.indicator("1d").macd.is_available());
        assert_eq!(btc.rsi("7d"), IndicatorValue::NotComputed);
    }

    #[test]
    fn breakout_is_repeatable() {
        let config = ScreenerConfig {
            mention_threshold: 0,
            ..Default::default()
        };
        let screener = Screener::new(&config).unwrap();
        let inputs = CollectedInputs {
            market: vec![snapshot("a", "A"), snapshot("b", "B")],
            mentions: mentions(&[("A", 4), ("B", 4)]),
            klines: klines(&[("A", "1d", rising(30)), ("B", "7d", falling(30))]),
            ..Default::default()
        };
        let a = screener.run_breakout(&inputs).unwrap();
        let b = screener.run_breakout(&inputs).unwrap();
        assert_eq!(a.candidates, b.candidates);
        assert_eq!(a.prompt, b.prompt);
    }

    #[test]
    fn buy_keeps_only_oversold_coins() {
        let config = ScreenerConfig {
            mention_threshold: 0,
            ..Default::default()
        };
        let screener = Screener::new(&config).unwrap();
        let inputs = CollectedInputs {
            market: vec![
                snapshot("down", "DOWN"),
                snapshot("up", "UP"),
                snapshot("half", "HALF"),
            ],
            mentions: mentions(&[("DOWN", 3), ("UP", 9), ("HALF", 9)]),
            klines: klines(&[
                ("DOWN", "1d", falling(30)),
                ("DOWN", "7d", falling(30)),
                ("UP", "1d", rising(30)),
                ("UP", "7d", rising(30)),
                ("HALF", "1d", falling(30)),
            ]),
            ..Default::default()
        };

        let report = screener.run_buy(&inputs).unwrap();
        let symbols: Vec<&str> = report.candidates.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["DOWN"]);
        assert_eq!(report.buy_signals.len(), 1);
        assert_eq!(report.buy_signals[0].symbol, "DOWN");
    }

    #[test]
    fn alerts_follow_watchlist_order() {
        let config = ScreenerConfig::default();
        let screener = Screener::new(&config).unwrap();
        let table = klines(&[
            ("ETH", "1d", rising(30)),
            ("ETH", "7d", rising(30)),
            ("BTC", "1d", rising(30)),
            ("BTC", "7d", rising(30)),
            ("SOL", "1d", rising(30)),
        ]);
        let watchlist: Vec<String> = vec!["eth".into(), "sol".into(), "btc".into(), "xrp".into()];

        let alerts = screener.run_alerts(&watchlist, &table).unwrap();
        let symbols: Vec<&str> = alerts.iter().map(|a| a.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["ETH", "BTC"]);
        assert_eq!(alerts[0].rsi_short, 100.0);
    }

    #[test]
    fn unknown_interval_is_skipped() {
        let config = ScreenerConfig::default();
        let screener = Screener::new(&config).unwrap();
        let prepared = screener
            .prepare(&klines(&[("BTC", "1min", rising(5)), ("BTC", "1week", rising(5))]))
            .unwrap();
        assert_eq!(prepared.len(), 1);
        assert_eq!(prepared[0].0.to_string(), "BTC@7d");
    }

    #[test]
    fn label_and_exchange_code_for_same_interval_rejected() {
        let config = ScreenerConfig::default();
        let screener = Screener::new(&config).unwrap();
        let table = klines(&[("BTC", "1d", rising(30)), ("BTC", "1day", falling(30))]);
        let err = screener.indicator_table(&table).unwrap_err();
        assert_eq!(
            err,
            ScreenerError::DuplicateSeries {
                key: "BTC@1d".into()
            }
        );
    }

    #[test]
    fn symbol_case_variants_for_same_interval_rejected() {
        let config = ScreenerConfig::default();
        let screener = Screener::new(&config).unwrap();
        let table = klines(&[("btc", "7d", rising(30)), ("BTC", "7d", falling(30))]);
        assert!(matches!(
            screener.indicator_table(&table),
            Err(ScreenerError::DuplicateSeries { .. })
        ));
    }

    #[test]
    fn malformed_klines_surface_as_errors() {
        let config = ScreenerConfig::default();
        let screener = Screener::new(&config).unwrap();
        let mut table = KlineTable::new();
        table
            .entry("BTC".into())
            .or_default()
            .insert("1d".into(), vec![vec![json!("1"), json!("x")]]);
        let err = screener.indicator_table(&table).unwrap_err();
        assert!(matches!(err, ScreenerError::MalformedKline { .. }));
    }

    #[test]
    fn duplicate_market_symbols_rejected() {
        let config = ScreenerConfig::default();
        let screener = Screener::new(&config).unwrap();
        let inputs = CollectedInputs {
            market: vec![snapshot("a", "DUP"), snapshot("b", "dup")],
            ..Default::default()
        };
        assert!(matches!(
            screener.run_breakout(&inputs),
            Err(ScreenerError::DuplicateSymbol { .. })
        ));
    }

    #[test]
    fn invalid_config_rejected() {
        let config = ScreenerConfig {
            max_candidates: 0,
            ..Default::default()
        };
        assert!(Screener::new(&config).is_err());
    }

    #[test]
    fn inputs_deserialize_from_bundle() {
        let json = r#"{
            "market": [{"id": "bitcoin", "symbol": "btc", "current_price": 1.0}],
            "post_titles": ["btc"],
            "klines": {"BTC": {"1day": [["60", "1", "1", "1", "1", "1", "1"]]}}
        }"#;
        let inputs: CollectedInputs = serde_json::from_str(json).unwrap();
        assert_eq!(inputs.market.len(), 1);
        assert!(inputs.mentions.is_none());
        assert_eq!(inputs.klines["BTC"]["1day"].len(), 1);
    }
}
