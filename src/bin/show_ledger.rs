//! Print the stored testing log as a table.
//!
//! Usage: cargo run --bin show_ledger [-- <latest-n>]

use anyhow::{Context, Result};
use signalone::config::LedgerConfig;
use signalone::storage::open_store;
use signalone::{ComparisonEntry, LedgerStore, MetricSnapshot};

fn fmt_roas(m: &MetricSnapshot) -> String {
    m.roas
        .map(|r| format!("{:.2}x", r))
        .unwrap_or_else(|| "-".to_string())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}

fn print_entry(entry: &ComparisonEntry) {
    let when = entry
        .created_at_utc()
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| entry.created_at().to_string());

    println!(
        "{:<16}  {:<24} {:>8}  {:<24} {:>8}  {:>4}",
        when,
        truncate(&entry.creative_a().name, 24),
        fmt_roas(entry.metrics_a()),
        truncate(&entry.creative_b().name, 24),
        fmt_roas(entry.metrics_b()),
        entry.winner()
    );
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
    dotenvy::dotenv().ok();

    let latest: Option<usize> = match std::env::args().nth(1) {
        Some(n) => Some(n.parse().context("latest-n must be a number")?),
        None => None,
    };

    let config = LedgerConfig::from_env();
    let store = open_store(&config)?;
    let ledger = store.load();

    if ledger.is_empty() {
        println!("No comparisons logged in {} ({})", config.path.display(), config.backend);
        return Ok(());
    }

    let entries = match latest {
        Some(n) => ledger.latest(n),
        None => ledger.entries(),
    };

    println!(
        "{:<16}  {:<24} {:>8}  {:<24} {:>8}  {:>4}",
        "created", "creative A", "roas", "creative B", "roas", "win"
    );
    println!("{}", "-".repeat(92));
    for entry in entries {
        print_entry(entry);
    }

    let ties = ledger.iter().filter(|e| e.winning_creative_id().is_none()).count();
    println!();
    println!(
        "{} comparisons ({} shown), {} ties",
        ledger.len(),
        entries.len(),
        ties
    );

    Ok(())
}
