// =============================================================================
// Social mention counting
// =============================================================================
//
// Counts, per tracked symbol, how many post titles mention it.  A mention is a
// standalone token equal to the symbol (case-insensitive), optionally written
// with a leading `$` ("$SOL").  Each post counts at most once per symbol.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::types::canonical_symbol;

/// Number of top-mentioned symbols echoed to the debug log.
const LOG_TOP_N: usize = 10;

/// Count posts mentioning each symbol.  Every tracked symbol is present in
/// the result, with 0 when never mentioned.
pub fn count_mentions(titles: &[String], symbols: &[String]) -> HashMap<String, u64> {
    let mut counts: HashMap<String, u64> = symbols
        .iter()
        .map(|s| (canonical_symbol(s), 0))
        .collect();

    for title in titles {
        let tokens = tokenize(title);
        for (symbol, count) in counts.iter_mut() {
            if tokens.contains(symbol.as_str()) {
                *count += 1;
            }
        }
    }

    let mut mentioned: Vec<(&String, &u64)> = counts.iter().filter(|&(_, &c)| c > 0).collect();
    mentioned.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    for (symbol, count) in mentioned.iter().take(LOG_TOP_N) {
        debug!(symbol = %symbol, mentions = **count, "top mentioned");
    }
    debug!(
        posts = titles.len(),
        mentioned = mentioned.len(),
        tracked = counts.len(),
        "mention extraction complete"
    );

    counts
}

/// Upper-cased word tokens of `text`, with a leading `$` stripped.
fn tokenize(text: &str) -> HashSet<String> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '$'))
        .map(|t| t.trim_start_matches('$'))
        .filter(|t| !t.is_empty())
        .map(str::to_uppercase)
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn every_symbol_present() {
        let counts = count_mentions(&[], &strings(&["btc", "ETH"]));
        assert_eq!(counts.len(), 2);
        assert_eq!(counts["BTC"], 0);
        assert_eq!(counts["ETH"], 0);
    }

    #[test]
    fn counts_posts_not_occurrences() {
        let titles = strings(&["BTC to the moon, btc forever", "Why I sold $BTC"]);
        let counts = count_mentions(&titles, &strings(&["BTC"]));
        assert_eq!(counts["BTC"], 2);
    }

    #[test]
    fn substrings_do_not_match() {
        let titles = strings(&["A new method for staking", "Ethereum merge recap"]);
        let counts = count_mentions(&titles, &strings(&["ETH"]));
        assert_eq!(counts["ETH"], 0);
    }

    #[test]
    fn dollar_prefix_and_punctuation() {
        let titles = strings(&["($SOL) rally?", "sol/usdt breakout"]);
        let counts = count_mentions(&titles, &strings(&["sol"]));
        assert_eq!(counts["SOL"], 2);
    }
}
