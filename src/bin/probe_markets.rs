//! Probe: signed CLOB market listing
//!
//! Hits GET <base>/data?limit=<n>&active=true&closed=false with L2 headers
//! and documents:
//! - Response shape (which top-level key carries the markets)
//! - Field completeness for the fields the report relies on
//! - How many markets decode with usable prices

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::Value;

use polymarket_analytics::CLOB_API_BASE;
use polymarket_analytics::api::{ClobClient, JsonSource, fetch_markets};
use polymarket_analytics::auth::Credentials;

#[derive(Parser)]
#[command(name = "probe_markets", about = "Inspect the signed market listing response")]
struct Args {
    /// Page size to request
    #[arg(long, default_value_t = 5)]
    limit: usize,

    #[arg(long, default_value = CLOB_API_BASE)]
    base_url: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let creds = Credentials::from_env().context("probe needs live credentials")?;
    let client = ClobClient::new(&args.base_url, creds, Duration::from_secs(30))?;
    let path = format!("/data?limit={}&active=true&closed=false", args.limit);

    println!("=== Probe: signed market listing ===");
    println!("URL: {}{}", args.base_url, path);
    println!();

    // 1. Raw response
    println!("--- 1. Raw response ---");
    let start = Instant::now();
    let body = client.get_json(&path).await?;
    println!("Latency: {:?}", start.elapsed());

    let (key, markets) = match &body {
        Value::Array(arr) => ("<top-level array>", arr.clone()),
        Value::Object(obj) => ["data", "markets"]
            .iter()
            .find_map(|k| obj.get(*k).and_then(|v| v.as_array()).map(|a| (*k, a.clone())))
            .unwrap_or(("<none>", Vec::new())),
        _ => ("<none>", Vec::new()),
    };
    println!("Markets key: {key}");
    println!("Market count: {}", markets.len());
    if let Some(obj) = body.as_object() {
        println!("Top-level keys: {:?}", obj.keys().collect::<Vec<_>>());
    }
    if let Some(first) = markets.first() {
        println!("\nSample market (first):");
        println!("{}", serde_json::to_string_pretty(first)?);
    }
    println!();

    // 2. Field completeness
    println!("--- 2. Field completeness check ---");
    let important_fields = [
        "id",
        "question",
        "outcomePrices",
        "volume",
        "liquidity",
        "lastTradePrice",
        "bestBid",
        "category",
        "endDate",
    ];
    for field in &important_fields {
        let present = markets.iter().filter(|m| m.get(*field).is_some()).count();
        let preview = markets
            .first()
            .and_then(|m| m.get(*field))
            .map(|v| {
                let s = v.to_string();
                if s.chars().count() > 50 {
                    format!("{}...", s.chars().take(50).collect::<String>())
                } else {
                    s
                }
            })
            .unwrap_or_else(|| "MISSING".to_string());
        println!(
            "  {:<16} {:>3}/{:<3} ({})",
            field,
            present,
            markets.len(),
            preview
        );
    }
    println!();

    // 3. Decoded view
    println!("--- 3. Decoded markets ---");
    let decoded = fetch_markets(&client, args.limit).await?;
    let priced = decoded.iter().filter(|m| !m.outcome_prices.is_empty()).count();
    println!("Decoded: {} ({} with outcome prices)", decoded.len(), priced);
    for m in &decoded {
        let question: String = m.question.as_deref().unwrap_or("?").chars().take(58).collect();
        println!(
            "  {:<60} yes={:<6.3} vol={:<12.0} {}",
            question,
            m.yes_price(),
            m.volume.unwrap_or(0.0),
            m.category.as_deref().unwrap_or("-")
        );
    }
    println!();

    println!("=== Probe Complete ===");
    Ok(())
}
