use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::api::{self, ClientError, Fetched, JsonSource};
use crate::config::SettingsConfig;
use crate::engine::{self, PatternPolicy};
use crate::types::{Market, Position, Report, ReportSummary, Trade};

/// Everything fetched for one run.
#[derive(Debug)]
pub struct Snapshot {
    pub markets: Vec<Market>,
    pub positions: Fetched<Position>,
    pub trades: Fetched<Trade>,
}

/// Fetch markets, positions and trades concurrently and wait for all three.
///
/// Only a market fetch failure is an error; wallet fetches degrade.
pub async fn fetch_snapshot(
    src: &impl JsonSource,
    wallet: Option<&str>,
    settings: &SettingsConfig,
) -> Result<Snapshot, ClientError> {
    let (markets, positions, trades) = tokio::join!(
        api::fetch_markets(src, settings.market_limit),
        api::fetch_positions(src, wallet),
        api::fetch_trades(src, wallet, settings.trade_limit),
    );
    let markets = markets?;
    if positions.is_degraded() || trades.is_degraded() {
        warn!("Wallet data incomplete, the report will only reflect what was fetched");
    }

    // Trades are collected for the dashboard's future use; nothing consumes
    // them yet beyond this count.
    info!(
        "Markets: {}, Positions: {}, Trades: {}",
        markets.len(),
        positions.items().len(),
        trades.items().len()
    );

    Ok(Snapshot {
        markets,
        positions,
        trades,
    })
}

/// Assemble the report from fetched data.
///
/// `summary.total_positions` counts positions that resolved to a known market,
/// so it always equals `stats.positions.len()` when stats are present.
pub fn build_report(
    markets: &[Market],
    positions: &[Position],
    policy: &PatternPolicy,
    recent_limit: usize,
    now: DateTime<Utc>,
) -> Report {
    let analyzed = engine::analyze_positions(positions, markets, now);
    let patterns = engine::patterns_from_analyzed(&analyzed, markets, policy);

    let summary = ReportSummary {
        total_positions: analyzed.len(),
        total_markets: markets.len(),
        patterns_found: patterns.len(),
    };

    Report {
        generated_at: now,
        summary,
        stats: engine::stats_from_analyzed(analyzed),
        patterns,
        recent_markets: engine::recent_markets(markets, policy, recent_limit),
    }
}

/// Serialize the report as pretty JSON, replacing any existing file.
pub fn write_report(report: &Report, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("failed to serialize report")?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

pub fn read_report(path: &Path) -> Result<Report> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("failed to parse {}", path.display()))
}
