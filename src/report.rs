// =============================================================================
// Report rendering — text handed to the scoring and messaging collaborators
// =============================================================================

use chrono::NaiveDate;

use crate::filters::RsiAlert;
use crate::fusion::AssetRecord;

/// Returned instead of a prompt when there is nothing to rank.
pub const EMPTY_PROMPT: &str = "No data available for analysis.";

const PROMPT_HEADER: &str = "Based on the data below, rank coins by breakout potential. \
Justify each score.\n\nCOIN DATA:\n";

const PROMPT_FOOTER: &str = "
Output JSON with:
- coin_symbol: Symbol of the cryptocurrency
- breakout_score: Score from 0-10 based on breakout potential
- reason: Brief explanation for the score
- timestamp: Current analysis timestamp

IMPORTANT: Provide a rating for ALL coins listed above, even if they have low breakout potential.
For coins with low potential, you may assign a low score (0-3), but still include them in the results.

Format the output as a valid JSON array.
";

/// Build the ranking request for the candidate list.
pub fn render_prompt(candidates: &[AssetRecord]) -> String {
    if candidates.is_empty() {
        return EMPTY_PROMPT.to_string();
    }

    let mut prompt = String::from(PROMPT_HEADER);
    for coin in candidates {
        prompt.push_str(&coin_block(coin));
    }
    prompt.push_str(PROMPT_FOOTER);
    prompt
}

fn coin_block(coin: &AssetRecord) -> String {
    let mut lines = vec![
        String::new(),
        format!("--- {} ({}) ---", coin.name, coin.symbol),
        format!("• Price: ${:.4}", coin.price),
        format!("• Market Cap: ${}", thousands(coin.market_cap)),
        format!("• 24h Volume: ${}", thousands(coin.volume_24h)),
        format!("• 24h Price Change: {:.2}%", coin.price_change_24h),
        format!("• 7d Price Change: {:.2}%", coin.price_change_7d),
        format!("• Reddit Mentions: {}", coin.social_mentions),
    ];

    for (label, set) in &coin.indicators {
        lines.push(match set.rsi.value() {
            Some(rsi) => format!("• RSI ({label}): {rsi:.2}"),
            None => format!("• RSI ({label}): n/a"),
        });
        if let Some(macd) = set.macd.value() {
            lines.push(format!(
                "• MACD ({label}): {:.6} / signal {:.6} (histogram {})",
                macd.macd_line, macd.signal_line, macd.histogram_trend
            ));
        }
    }

    if coin.is_trending {
        lines.push("• TRENDING ON COINGECKO".to_string());
    }

    let mut block = lines.join("\n");
    block.push('\n');
    block
}

/// Markdown alert for symbols that passed the overbought screen.
///
/// Returns `None` when there is nothing to report.
pub fn render_alert_message(alerts: &[RsiAlert], date: NaiveDate) -> Option<String> {
    if alerts.is_empty() {
        return None;
    }

    let mut message = format!("*RSI Alert: Overbought Signals {}*\n\n", date.format("%Y-%m-%d"));
    for alert in alerts {
        message.push_str(&format!(
            "*{}* - RSI short: {}, RSI long: {}\n",
            alert.symbol, alert.rsi_short, alert.rsi_long
        ));
    }
    message.push_str("\n_This is an automated alert and not financial advice._");
    Some(message)
}

/// `,`-grouped integer part; a non-zero fractional part is kept as is.
fn thousands(value: f64) -> String {
    let text = value.abs().to_string();
    let (digits, fraction) = match text.split_once('.') {
        Some((int, frac)) => (int, Some(frac)),
        None => (text.as_str(), None),
    };

    let mut grouped = String::with_capacity(text.len() + digits.len() / 3 + 1);
    if value < 0.0 {
        grouped.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if let Some(frac) = fraction {
        grouped.push('.');
        grouped.push_str(frac);
    }
    grouped
}
