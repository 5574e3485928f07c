//! stamp — fill the dashboard template with values from the report.
//!
//! Reads the JSON report written by `fetch` and rewrites the HTML template in
//! place, replacing its four placeholders.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use polymarket_analytics::config::{AppConfig, CONFIG_PATH};
use polymarket_analytics::{init_tracing, template};

#[derive(Parser)]
#[command(name = "stamp", about = "Stamp report values into the dashboard HTML")]
struct Args {
    /// Config file; defaults apply when it does not exist
    #[arg(long, default_value = CONFIG_PATH)]
    config: PathBuf,

    /// Report JSON (overrides settings.output_path)
    #[arg(long)]
    data: Option<PathBuf>,

    /// HTML template, rewritten in place (overrides settings.template_path)
    #[arg(long)]
    template: Option<PathBuf>,
}

fn main() -> Result<()> {
    init_tracing();

    let args = Args::parse();
    let config = AppConfig::load_or_default(&args.config)?;
    let data = args.data.unwrap_or(config.settings.output_path);
    let html = args.template.unwrap_or(config.settings.template_path);

    let summary = template::stamp_file(&data, &html)?;
    info!(
        "Dashboard ready: {} positions, {} patterns, {} markets",
        summary.total_positions, summary.patterns_found, summary.total_markets
    );
    Ok(())
}
