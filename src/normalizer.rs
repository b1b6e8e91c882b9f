// =============================================================================
// Normalizer — min/max rescaling across the current asset set
// =============================================================================
//
//   normalized = (v - min) / (max - min)
//
// When every value of a field is identical (including a single record) the
// range is degenerate and each record gets the neutral midpoint 0.5.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::fusion::AssetRecord;

/// Value assigned when a field has no spread.
pub const DEGENERATE_VALUE: f64 = 0.5;

/// Numeric Asset Record fields that can be normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericField {
    Price,
    MarketCap,
    #[serde(rename = "volume_24h")]
    Volume24h,
    #[serde(rename = "price_change_24h")]
    PriceChange24h,
    #[serde(rename = "price_change_7d")]
    PriceChange7d,
    SocialMentions,
}

impl NumericField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Price => "price",
            Self::MarketCap => "market_cap",
            Self::Volume24h => "volume_24h",
            Self::PriceChange24h => "price_change_24h",
            Self::PriceChange7d => "price_change_7d",
            Self::SocialMentions => "social_mentions",
        }
    }

    pub fn read(&self, record: &AssetRecord) -> f64 {
        match self {
            Self::Price => record.price,
            Self::MarketCap => record.market_cap,
            Self::Volume24h => record.volume_24h,
            Self::PriceChange24h => record.price_change_24h,
            Self::PriceChange7d => record.price_change_7d,
            Self::SocialMentions => record.social_mentions as f64,
        }
    }
}

impl std::fmt::Display for NumericField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Add a normalized value for each of `fields` to every record.
///
/// An empty record set is returned unchanged.
pub fn normalize(mut records: Vec<AssetRecord>, fields: &[NumericField]) -> Vec<AssetRecord> {
    if records.is_empty() {
        return records;
    }

    for field in fields {
        let (min, max) = records
            .iter()
            .map(|r| field.read(r))
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            });
        let range = max - min;

        for record in records.iter_mut() {
            let scaled = if range > 0.0 {
                ((field.read(record) - min) / range).clamp(0.0, 1.0)
            } else {
                DEGENERATE_VALUE
            };
            record.normalized.insert(field.as_str().to_string(), scaled);
        }

        debug!(field = %field, min, max, "field normalized");
    }

    records
}
