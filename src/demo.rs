//! Demo mode: a fixed sample of markets and positions run through the same
//! engine as live data, so the dashboard can be built without credentials.

use chrono::{DateTime, Duration, Utc};

use crate::engine::PatternPolicy;
use crate::reporter;
use crate::types::{Market, Position, Report};

struct SampleMarket {
    id: &'static str,
    question: &'static str,
    yes: f64,
    no: f64,
    volume: f64,
    liquidity: f64,
    category: &'static str,
    days_left: i64,
}

const SAMPLE_MARKETS: [SampleMarket; 5] = [
    SampleMarket {
        id: "demo1",
        question: "Will Bitcoin hit $100k before June 2025?",
        yes: 0.485,
        no: 0.515,
        volume: 1_250_000.0,
        liquidity: 50_000.0,
        category: "Crypto",
        days_left: 7,
    },
    SampleMarket {
        id: "demo2",
        question: "Will Fed raise rates in March meeting?",
        yes: 0.520,
        no: 0.480,
        volume: 890_000.0,
        liquidity: 75_000.0,
        category: "Elections",
        days_left: 30,
    },
    SampleMarket {
        id: "demo3",
        question: "Will Ethereum reach $5k by end of 2025?",
        yes: 0.320,
        no: 0.680,
        volume: 2_100_000.0,
        liquidity: 120_000.0,
        category: "Crypto",
        days_left: 200,
    },
    SampleMarket {
        id: "demo4",
        question: "Will Trump win 2024 election?",
        yes: 0.550,
        no: 0.450,
        volume: 3_500_000.0,
        liquidity: 200_000.0,
        category: "Elections",
        days_left: 60,
    },
    SampleMarket {
        id: "demo5",
        question: "Will Leeds win the 2025–26 English Premier League?",
        yes: 0.180,
        no: 0.820,
        volume: 36_590_082.0,
        liquidity: 857_016.0,
        category: "Sports",
        days_left: 150,
    },
];

/// `(market id, outcome, size, entry price)`
const SAMPLE_POSITIONS: [(&str, &str, f64, f64); 3] = [
    ("demo1", "YES", 100.0, 0.470),
    ("demo2", "NO", 150.0, 0.520),
    ("demo3", "YES", 200.0, 0.310),
];

/// The sample markets, with end dates relative to `now`.
pub fn sample_markets(now: DateTime<Utc>) -> Vec<Market> {
    SAMPLE_MARKETS
        .iter()
        .map(|s| Market {
            id: s.id.to_string(),
            question: Some(s.question.to_string()),
            outcome_prices: vec![s.yes, s.no],
            volume: Some(s.volume),
            liquidity: Some(s.liquidity),
            last_trade_price: None,
            best_bid: None,
            category: Some(s.category.to_string()),
            end_date: Some((now + Duration::days(s.days_left)).to_rfc3339()),
        })
        .collect()
}

pub fn sample_positions() -> Vec<Position> {
    SAMPLE_POSITIONS
        .iter()
        .map(|&(market_id, outcome, size, entry)| Position {
            market_id: market_id.to_string(),
            outcome: Some(outcome.to_string()),
            side: None,
            size: Some(size),
            entry_price: Some(entry),
        })
        .collect()
}

/// Build the demo report.
pub fn demo_report(policy: &PatternPolicy, recent_limit: usize, now: DateTime<Utc>) -> Report {
    let markets = sample_markets(now);
    let positions = sample_positions();
    reporter::build_report(&markets, &positions, policy, recent_limit, now)
}
