//! Signal arbitration trading bot - entry point.

use anyhow::Result;
use arb_bot::app::{FeatureSource, MarketSnapshot};
use arb_bot::{AppConfig, Application, NullModelScorer};
use arb_core::{FeatureVector, Price};
use arb_exchange::BoxFuture;
use clap::Parser;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Signal arbitration trading bot
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via ARB_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,
}

/// Stand-in until the indicator pipeline is wired up.
///
/// Produces empty feature snapshots, so every decision is HOLD and the
/// bot is effectively a dry loop.
// TODO: replace with a kline-backed feature source computing the
// momentum/RSI/cross indicator set.
struct EmptyFeatureSource;

impl FeatureSource for EmptyFeatureSource {
    fn snapshot(&self, _symbol: &str) -> BoxFuture<'_, anyhow::Result<MarketSnapshot>> {
        Box::pin(async {
            Ok(MarketSnapshot {
                features: FeatureVector::empty(),
                last_price: Price::ZERO,
            })
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    arb_bot::init_logging();

    info!("starting arb-bot v{}", env!("CARGO_PKG_VERSION"));

    let config = match args.config {
        Some(path) => AppConfig::from_file(&path)?,
        None => AppConfig::load()?,
    };
    info!(mode = ?config.mode, symbols = config.symbols.len(), "configuration loaded");

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            signal_cancel.cancel();
        }
    });

    let app = Application::new(
        config,
        Arc::new(EmptyFeatureSource),
        Arc::new(NullModelScorer),
        cancel,
    )?;
    app.run().await?;

    Ok(())
}
