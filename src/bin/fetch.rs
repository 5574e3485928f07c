use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use tracing::{error, info, warn};

use polymarket_analytics::api::ClobClient;
use polymarket_analytics::auth::{Credentials, CredentialsError};
use polymarket_analytics::config::{AppConfig, CONFIG_PATH, PolicyPreset};
use polymarket_analytics::types::Report;
use polymarket_analytics::{WALLET_VAR, demo, init_tracing, reporter};

#[derive(Parser)]
#[command(name = "fetch", about = "Fetch CLOB market and wallet data and write the analytics report")]
struct Args {
    /// Config file; defaults apply when it does not exist
    #[arg(long, default_value = CONFIG_PATH)]
    config: PathBuf,

    /// Pattern threshold preset (overrides [policy] in the config file)
    #[arg(long, value_enum)]
    policy: Option<PolicyPreset>,

    /// Report output path (overrides settings.output_path)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Use the embedded sample data even when credentials are present
    #[arg(long)]
    demo: bool,

    /// Exit with an error instead of falling back to demo mode when
    /// credentials are missing
    #[arg(long, conflicts_with = "demo")]
    require_credentials: bool,
}

#[tokio::main]
async fn main() {
    // RUST_LOG may come from .env
    dotenvy::dotenv().ok();
    init_tracing();

    let args = Args::parse();
    if let Err(e) = run(args).await {
        error!("Fatal: {e:#}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let mut config = AppConfig::load_or_default(&args.config)?;
    if let Some(preset) = args.policy {
        config.policy = preset.policy();
    }
    if let Some(output) = args.output {
        config.settings.output_path = output;
    }

    let creds = if args.demo {
        None
    } else {
        match Credentials::from_env() {
            Ok(creds) => Some(creds),
            Err(CredentialsError::Missing(vars)) if !args.require_credentials => {
                warn!(
                    "CLOB credentials not found ({}), generating sample data (demo mode)",
                    vars.join(", ")
                );
                None
            }
            Err(e) => return Err(e.into()),
        }
    };

    let report = match creds {
        Some(creds) => live_report(&config, creds).await?,
        None => {
            info!("Building demo report...");
            demo::demo_report(
                &config.policy,
                config.settings.recent_markets_limit,
                Utc::now(),
            )
        }
    };

    let output = &config.settings.output_path;
    reporter::write_report(&report, output)?;
    info!(
        "{} written with {} positions, {} patterns detected",
        output.display(),
        report.summary.total_positions,
        report.summary.patterns_found
    );
    Ok(())
}

async fn live_report(config: &AppConfig, creds: Credentials) -> Result<Report> {
    let settings = &config.settings;
    let wallet = std::env::var(WALLET_VAR)
        .ok()
        .filter(|w| !w.trim().is_empty());
    if wallet.is_none() {
        warn!("{WALLET_VAR} not set, only market data will be collected");
    }

    let client = ClobClient::new(
        &settings.base_url,
        creds,
        Duration::from_secs(settings.request_timeout_secs),
    )?;

    info!("Fetching data from {}...", settings.base_url);
    let snapshot = reporter::fetch_snapshot(&client, wallet.as_deref(), settings)
        .await
        .context("failed to fetch markets")?;

    Ok(reporter::build_report(
        &snapshot.markets,
        snapshot.positions.items(),
        &config.policy,
        settings.recent_markets_limit,
        Utc::now(),
    ))
}
