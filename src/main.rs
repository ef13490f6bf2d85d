//! SignalOne testing-log runner
//!
//! Reads a batch of creatives (a plain JSON array or a Meta Graph insights
//! response already fetched by the dashboard), runs one comparison cycle
//! against the configured ledger store and prints the merged ledger as JSON.
//!
//! ## Usage
//!
//! ```text
//! signalone <creatives.json | ->
//! ```
//!
//! Storage is chosen with `LEDGER_BACKEND` (`json`, `sqlite`, `memory`),
//! `LEDGER_PATH` and `LEDGER_KEY`. Exit status is 2 when the ledger was
//! computed but could not be saved.

use anyhow::{Context, Result, bail};
use tokio::io::AsyncReadExt;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

use signalone::config::{LedgerConfig, LOG_FILE_NAME};
use signalone::source::parse_creatives_str;
use signalone::storage::open_store;
use signalone::{PersistStatus, TestingLogService};

async fn read_input(arg: &str) -> Result<String> {
    if arg == "-" {
        let mut buf = String::new();
        tokio::io::stdin()
            .read_to_string(&mut buf)
            .await
            .context("Failed to read creatives from stdin")?;
        Ok(buf)
    } else {
        tokio::fs::read_to_string(arg)
            .await
            .with_context(|| format!("Failed to read creatives from {}", arg))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr and a file; stdout carries the ledger JSON
    let file_appender = tracing_appender::rolling::never(".", LOG_FILE_NAME);
    let (non_blocking, log_guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive("signalone=info".parse()?);

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr);

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    dotenvy::dotenv().ok();

    let Some(input) = std::env::args().nth(1) else {
        bail!("usage: signalone <creatives.json | ->");
    };

    let config = LedgerConfig::from_env();
    info!("📒 SignalOne testing log");
    info!("   Backend: {} ({})", config.backend, config.path.display());
    info!("   Ledger key: {}", config.key);
    info!("   Metric enrichment: {}", if config.enrich { "on" } else { "off" });

    let raw = read_input(&input).await?;
    let records = parse_creatives_str(&raw).context("Creative batch rejected")?;
    info!("[SOURCE] Loaded {} creatives from {}", records.len(), input);

    // Stores do blocking file/SQLite I/O
    let outcome = tokio::task::spawn_blocking(move || {
        let store = open_store(&config)?;
        TestingLogService::new(store)
            .with_enrichment(config.enrich)
            .run_comparison_cycle(&records)
    })
    .await
    .context("Comparison cycle task failed")??;

    info!("📊 Cycle complete:");
    info!("   - New comparisons: {}", outcome.added);
    info!("   - Already logged: {}", outcome.skipped);
    info!("   - Ledger size: {}", outcome.ledger.len());
    for entry in outcome.ledger.latest(outcome.added) {
        info!(
            "   {} vs {} -> {}",
            entry.creative_a().name,
            entry.creative_b().name,
            entry.winner()
        );
    }

    println!("{}", serde_json::to_string_pretty(&outcome.ledger)?);

    match outcome.persisted {
        PersistStatus::Saved => Ok(()),
        PersistStatus::Failed(reason) => {
            error!("❌ Ledger was not persisted: {}", reason);
            warn!("   Output above reflects the computed ledger only");
            drop(log_guard);
            std::process::exit(2);
        }
    }
}
