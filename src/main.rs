// =============================================================================
// Breakout Scout — Main Entry Point
// =============================================================================
//
//   breakout-scout [breakout|buy|alerts] <input.json>
//
// Reads one collected input bundle, runs the selected pipeline and prints the
// result as pretty JSON followed by the prompt or alert text.
// =============================================================================

use anyhow::{bail, Context};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use breakout_scout::report::render_alert_message;
use breakout_scout::{CollectedInputs, Screener, ScreenerConfig};

const CONFIG_PATH: &str = "screener_config.json";
const USAGE: &str = "usage: breakout-scout [breakout|buy|alerts] <input.json>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Breakout,
    Buy,
    Alerts,
}

impl std::str::FromStr for Mode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "breakout" => Ok(Self::Breakout),
            "buy" => Ok(Self::Buy),
            "alerts" => Ok(Self::Alerts),
            other => bail!("unknown mode {other:?}\n{USAGE}"),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let (mode, input_path) = match (args.next(), args.next()) {
        (Some(mode), Some(path)) => (mode.parse::<Mode>()?, path),
        _ => bail!(USAGE),
    };

    let mut config = ScreenerConfig::load(CONFIG_PATH).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        ScreenerConfig::default()
    });
    config.apply_env_overrides();
    let screener = Screener::new(&config).context("invalid screener config")?;

    // ── 2. Collected inputs ──────────────────────────────────────────────
    let raw = tokio::fs::read_to_string(&input_path)
        .await
        .with_context(|| format!("failed to read input bundle {input_path}"))?;
    let inputs: CollectedInputs = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse input bundle {input_path}"))?;

    info!(
        mode = ?mode,
        market = inputs.market.len(),
        posts = inputs.post_titles.len(),
        kline_symbols = inputs.klines.len(),
        "input bundle loaded"
    );

    // ── 3. Run ───────────────────────────────────────────────────────────
    match mode {
        Mode::Breakout | Mode::Buy => {
            let report = if mode == Mode::Buy {
                screener.run_buy(&inputs)?
            } else {
                screener.run_breakout(&inputs)?
            };
            println!("{}", serde_json::to_string_pretty(&report.rows)?);
            println!();
            println!("{}", report.prompt);
            info!(candidates = report.candidates.len(), "run complete");
        }
        Mode::Alerts => {
            let watchlist: Vec<String> = if inputs.watchlist.is_empty() {
                inputs.klines.keys().cloned().collect()
            } else {
                inputs.watchlist.clone()
            };
            let alerts = screener.run_alerts(&watchlist, &inputs.klines)?;
            println!("{}", serde_json::to_string_pretty(&alerts)?);

            let today = chrono::Utc::now().date_naive();
            match render_alert_message(&alerts, today) {
                Some(message) => {
                    println!();
                    println!("{message}");
                }
                None => info!("no overbought signals"),
            }
            info!(alerts = alerts.len(), "run complete");
        }
    }

    Ok(())
}
