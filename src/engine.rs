use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{
    AnalyzedPosition, CategoryStats, Market, MarketPnl, MarketSummary, Pattern, PortfolioStats,
    Position, UNCATEGORIZED, UNTITLED,
};

/// Marker returned by [`calculate_time_left`] once a market has ended.
pub const EXPIRED: &str = "Expirado";

/// Number of markets kept in `PortfolioStats::top_markets`.
const TOP_MARKETS: usize = 10;

const MS_PER_HOUR: i64 = 60 * 60 * 1000;

/// Thresholds a position (or market) must meet to count as a pattern.
///
/// Spread bounds are inclusive. `allowed_categories = None` disables the
/// category check; a `[policy]` table that omits it means any category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternPolicy {
    #[serde(default = "default_spread_min")]
    pub spread_min: f64,
    #[serde(default = "default_spread_max")]
    pub spread_max: f64,
    #[serde(default = "default_volume_floor")]
    pub volume_floor: f64,
    #[serde(default)]
    pub allowed_categories: Option<Vec<String>>,
}

fn default_spread_min() -> f64 {
    1.0
}

fn default_spread_max() -> f64 {
    3.0
}

fn default_volume_floor() -> f64 {
    50_000.0
}

impl PatternPolicy {
    /// Wide spread band restricted to the preferred categories.
    pub fn preferred() -> Self {
        Self {
            spread_min: default_spread_min(),
            spread_max: default_spread_max(),
            volume_floor: default_volume_floor(),
            allowed_categories: Some(
                [
                    "Crypto",
                    "Elections",
                    "Politics",
                    "Sports",
                    "US-current-affairs",
                    "Coronavirus",
                ]
                .into_iter()
                .map(String::from)
                .collect(),
            ),
        }
    }

    /// Narrow spread band with a higher volume floor, any category.
    pub fn tight() -> Self {
        Self {
            spread_min: 1.5,
            spread_max: 2.0,
            volume_floor: 100_000.0,
            allowed_categories: None,
        }
    }

    pub fn admits_spread(&self, spread: f64) -> bool {
        spread >= self.spread_min && spread <= self.spread_max
    }

    pub fn admits_volume(&self, volume: f64) -> bool {
        volume >= self.volume_floor
    }

    pub fn admits_category(&self, category: Option<&str>) -> bool {
        match &self.allowed_categories {
            None => true,
            Some(allowed) => category.is_some_and(|c| allowed.iter().any(|a| a == c)),
        }
    }

    /// Spread, volume and category checks, without the time-left rule.
    pub fn admits(&self, spread: f64, volume: f64, category: Option<&str>) -> bool {
        self.admits_spread(spread) && self.admits_volume(volume) && self.admits_category(category)
    }
}

impl Default for PatternPolicy {
    fn default() -> Self {
        Self::preferred()
    }
}

/// Distance of the yes price from 50%, scaled to `[0, 1]`.
pub fn spread_of(yes_price: f64) -> f64 {
    (yes_price - 0.5).abs() * 2.0
}

/// Spread of a market's yes price, or 0 when the market carries no outcome
/// prices at all.
pub fn market_spread(market: &Market) -> f64 {
    market.outcome_prices.first().map_or(0.0, |&yes| spread_of(yes))
}

/// Best available mark for a market: last trade, then best bid, then the
/// yes outcome price.
pub fn current_price(market: &Market) -> f64 {
    market
        .last_trade_price
        .or(market.best_bid)
        .or_else(|| market.outcome_prices.first().copied())
        .unwrap_or(0.0)
}

/// Human-readable time until `end`: whole days (`"3d"`) when more than 24
/// hours remain, otherwise whole hours (`"5h"`), or [`EXPIRED`].
pub fn calculate_time_left(end: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Option<String> {
    let end = end?;
    let diff_ms = (end - now).num_milliseconds();
    if diff_ms <= 0 {
        return Some(EXPIRED.to_string());
    }
    let hours = diff_ms / MS_PER_HOUR;
    if hours > 24 {
        Some(format!("{}d", hours / 24))
    } else {
        Some(format!("{hours}h"))
    }
}

/// Price a position against its market.
pub fn analyze_position(position: &Position, market: &Market, now: DateTime<Utc>) -> AnalyzedPosition {
    let size = position.size.unwrap_or(0.0);
    let entry_price = position.entry_price.unwrap_or(0.0);
    let current_price = current_price(market);
    let pnl = size * (current_price - entry_price);
    let pnl_percent = (entry_price != 0.0)
        .then(|| (current_price - entry_price) / entry_price * 100.0);

    AnalyzedPosition {
        market_id: market.id.clone(),
        question: market.question.clone().unwrap_or_else(|| UNTITLED.to_string()),
        outcome: position.outcome_side(),
        size,
        entry_price,
        current_price,
        pnl,
        pnl_percent,
        spread: market_spread(market),
        volume_24h: market.volume.unwrap_or(0.0),
        liquidity: market.liquidity.unwrap_or(0.0),
        time_left: calculate_time_left(market.end_time(), now),
        category: market
            .category
            .clone()
            .unwrap_or_else(|| UNCATEGORIZED.to_string()),
        is_winner: pnl > 0.0,
    }
}

/// Markets keyed by id. The first market with a given id wins.
pub struct MarketIndex<'a> {
    by_id: HashMap<&'a str, &'a Market>,
}

impl<'a> MarketIndex<'a> {
    pub fn new(markets: &'a [Market]) -> Self {
        let mut by_id = HashMap::with_capacity(markets.len());
        for market in markets {
            by_id.entry(market.id.as_str()).or_insert(market);
        }
        Self { by_id }
    }

    pub fn get(&self, market_id: &str) -> Option<&'a Market> {
        self.by_id.get(market_id).copied()
    }
}

/// Analyze every position whose market is known; unresolved ones are dropped.
pub fn analyze_positions(
    positions: &[Position],
    markets: &[Market],
    now: DateTime<Utc>,
) -> Vec<AnalyzedPosition> {
    let index = MarketIndex::new(markets);
    positions
        .iter()
        .filter_map(|p| index.get(&p.market_id).map(|m| analyze_position(p, m, now)))
        .collect()
}

fn match_reason(analysis: &AnalyzedPosition, time_left: &str) -> String {
    format!(
        "Spread {:.1}%, Volume ${:.0}k, Categoria: {}, Tempo {}",
        analysis.spread,
        analysis.volume_24h / 1000.0,
        analysis.category,
        time_left
    )
}

/// Turn an analyzed position into a pattern if it satisfies `policy` and its
/// market is still open.
///
/// The category check runs against the market's own category, so an
/// uncategorised market never matches an allow-list entry.
pub fn match_pattern(
    analysis: AnalyzedPosition,
    market: &Market,
    policy: &PatternPolicy,
) -> Option<Pattern> {
    if !policy.admits(analysis.spread, analysis.volume_24h, market.category.as_deref()) {
        return None;
    }
    let time_left = analysis.time_left.as_deref().filter(|t| *t != EXPIRED)?;
    let reason = match_reason(&analysis, time_left);
    Some(Pattern {
        position: analysis,
        match_reason: reason,
    })
}

/// Patterns among already analyzed positions. `markets` must be the slice the
/// positions were analyzed against.
pub fn patterns_from_analyzed(
    analyzed: &[AnalyzedPosition],
    markets: &[Market],
    policy: &PatternPolicy,
) -> Vec<Pattern> {
    let index = MarketIndex::new(markets);
    analyzed
        .iter()
        .filter_map(|a| {
            let market = index.get(&a.market_id)?;
            match_pattern(a.clone(), market, policy)
        })
        .collect()
}

/// Positions that exemplify the setup described by `policy`.
pub fn detect_patterns(
    positions: &[Position],
    markets: &[Market],
    policy: &PatternPolicy,
    now: DateTime<Utc>,
) -> Vec<Pattern> {
    patterns_from_analyzed(&analyze_positions(positions, markets, now), markets, policy)
}

/// Portfolio statistics over every resolvable position, or `None` when no
/// position resolves to a known market.
pub fn calculate_stats(
    positions: &[Position],
    markets: &[Market],
    now: DateTime<Utc>,
) -> Option<PortfolioStats> {
    stats_from_analyzed(analyze_positions(positions, markets, now))
}

/// Aggregate already-analyzed positions.
///
/// Positions without a defined `pnl_percent` (zero entry price) still count
/// toward P&L and win/loss totals but are left out of the percentage averages.
pub fn stats_from_analyzed(analyzed: Vec<AnalyzedPosition>) -> Option<PortfolioStats> {
    if analyzed.is_empty() {
        return None;
    }

    let total_pnl: f64 = analyzed.iter().map(|p| p.pnl).sum();
    let wins = analyzed.iter().filter(|p| p.is_winner).count();
    let losses = analyzed.len() - wins;

    let avg_gain = mean(
        analyzed
            .iter()
            .filter(|p| p.is_winner)
            .filter_map(|p| p.pnl_percent),
    );
    let avg_loss = mean(
        analyzed
            .iter()
            .filter(|p| !p.is_winner)
            .filter_map(|p| p.pnl_percent.map(f64::abs)),
    );
    let profit_factor = if avg_loss > 0.0 { avg_gain / avg_loss } else { 0.0 };

    let win_rate = wins as f64 / analyzed.len() as f64 * 100.0;

    Some(PortfolioStats {
        total_positions: analyzed.len(),
        total_pnl,
        win_rate,
        wins,
        losses,
        avg_gain,
        avg_loss,
        profit_factor,
        by_category: by_category(&analyzed),
        top_markets: top_markets(&analyzed),
        positions: analyzed,
    })
}

/// Mean of `values`, 0 when empty.
fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 { 0.0 } else { sum / count as f64 }
}

/// Per-category count and P&L, highest P&L first.
fn by_category(analyzed: &[AnalyzedPosition]) -> Vec<CategoryStats> {
    let mut out: Vec<CategoryStats> = Vec::new();
    let mut slot: HashMap<&str, usize> = HashMap::new();
    for p in analyzed {
        let idx = *slot.entry(p.category.as_str()).or_insert_with(|| {
            out.push(CategoryStats {
                category: p.category.clone(),
                count: 0,
                pnl: 0.0,
            });
            out.len() - 1
        });
        out[idx].count += 1;
        out[idx].pnl += p.pnl;
    }
    out.sort_by(|a, b| b.pnl.total_cmp(&a.pnl));
    out
}

/// P&L summed per market (first occurrence names it), best first, top 10.
fn top_markets(analyzed: &[AnalyzedPosition]) -> Vec<MarketPnl> {
    let mut out: Vec<MarketPnl> = Vec::new();
    let mut slot: HashMap<&str, usize> = HashMap::new();
    for p in analyzed {
        let idx = *slot.entry(p.market_id.as_str()).or_insert_with(|| {
            out.push(MarketPnl {
                market_id: p.market_id.clone(),
                question: p.question.clone(),
                total_pnl: 0.0,
                trades: 0,
            });
            out.len() - 1
        });
        out[idx].total_pnl += p.pnl;
        out[idx].trades += 1;
    }
    out.sort_by(|a, b| b.total_pnl.total_cmp(&a.total_pnl));
    out.truncate(TOP_MARKETS);
    out
}

pub fn summarize_market(market: &Market) -> MarketSummary {
    MarketSummary {
        id: market.id.clone(),
        question: market.question.clone(),
        yes_price: market.yes_price(),
        no_price: market.no_price(),
        volume: market.volume.unwrap_or(0.0),
        liquidity: market.liquidity.unwrap_or(0.0),
        spread: market_spread(market),
        category: market.category.clone(),
    }
}

/// Markets passing `policy` (no time-left rule), by volume descending,
/// at most `limit`.
pub fn recent_markets(markets: &[Market], policy: &PatternPolicy, limit: usize) -> Vec<MarketSummary> {
    let mut out: Vec<MarketSummary> = markets
        .iter()
        .map(summarize_market)
        .filter(|m| policy.admits(m.spread, m.volume, m.category.as_deref()))
        .collect();
    out.sort_by(|a, b| b.volume.total_cmp(&a.volume));
    out.truncate(limit);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    use crate::types::OutcomeSide;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap()
    }

    fn make_market(id: &str, yes: f64, volume: f64, category: &str, end_in: Duration) -> Market {
        serde_json::from_value(json!({
            "id": id,
            "question": format!("Question {id}?"),
            "outcomePrices": [yes.to_string(), (1.0 - yes).to_string()],
            "volume": volume,
            "liquidity": 1000,
            "category": category,
            "endDate": (now() + end_in).to_rfc3339(),
        }))
        .expect("valid test Market JSON")
    }

    fn make_position(market_id: &str, size: f64, entry: f64) -> Position {
        Position {
            market_id: market_id.to_string(),
            outcome: Some("YES".to_string()),
            side: None,
            size: Some(size),
            entry_price: Some(entry),
        }
    }

    fn analyzed(market_id: &str, pnl: f64, pct: Option<f64>, category: &str) -> AnalyzedPosition {
        AnalyzedPosition {
            market_id: market_id.to_string(),
            question: format!("Q {market_id}"),
            outcome: OutcomeSide::Yes,
            size: 1.0,
            entry_price: 0.5,
            current_price: 0.5,
            pnl,
            pnl_percent: pct,
            spread: 0.0,
            volume_24h: 0.0,
            liquidity: 0.0,
            time_left: None,
            category: category.to_string(),
            is_winner: pnl > 0.0,
        }
    }

    // ── calculate_time_left ────────────────────────────────────────

    #[test]
    fn time_left_none_without_end() {
        assert_eq!(calculate_time_left(None, now()), None);
    }

    #[test]
    fn time_left_expired() {
        let past = now() - Duration::minutes(1);
        assert_eq!(calculate_time_left(Some(past), now()).as_deref(), Some(EXPIRED));
        assert_eq!(calculate_time_left(Some(now()), now()).as_deref(), Some(EXPIRED));
    }

    #[test]
    fn time_left_hours() {
        let end = now() + Duration::hours(2);
        assert_eq!(calculate_time_left(Some(end), now()).as_deref(), Some("2h"));
        let end = now() + Duration::minutes(59);
        assert_eq!(calculate_time_left(Some(end), now()).as_deref(), Some("0h"));
    }

    #[test]
    fn time_left_exactly_a_day_stays_in_hours() {
        let end = now() + Duration::hours(24) + Duration::minutes(30);
        assert_eq!(calculate_time_left(Some(end), now()).as_deref(), Some("24h"));
    }

    #[test]
    fn time_left_days_floor() {
        let end = now() + Duration::hours(50);
        assert_eq!(calculate_time_left(Some(end), now()).as_deref(), Some("2d"));
        let end = now() + Duration::hours(71) + Duration::minutes(59);
        assert_eq!(calculate_time_left(Some(end), now()).as_deref(), Some("2d"));
    }

    // ── analyze_position ───────────────────────────────────────────

    #[test]
    fn analyze_basic_pnl() {
        let market = make_market("m1", 0.485, 1_250_000.0, "Crypto", Duration::days(7));
        let a = analyze_position(&make_position("m1", 100.0, 0.47), &market, now());
        assert!(approx_eq(a.current_price, 0.485));
        assert!(approx_eq(a.pnl, 1.5));
        assert!(a.is_winner);
        assert!(approx_eq(a.pnl_percent.unwrap(), (0.485 - 0.47) / 0.47 * 100.0));
        assert!(approx_eq(a.spread, 0.03));
        assert_eq!(a.volume_24h, 1_250_000.0);
        assert_eq!(a.time_left.as_deref(), Some("7d"));
        assert_eq!(a.category, "Crypto");
        assert_eq!(a.outcome, OutcomeSide::Yes);
    }

    #[test]
    fn analyze_prefers_last_trade_then_bid() {
        let mut market = make_market("m1", 0.40, 0.0, "Crypto", Duration::days(1));
        market.best_bid = Some(0.42);
        assert!(approx_eq(current_price(&market), 0.42));
        market.last_trade_price = Some(0.45);
        assert!(approx_eq(current_price(&market), 0.45));
    }

    #[test]
    fn analyze_absent_prices_default_to_zero() {
        let market: Market = serde_json::from_value(json!({"id": "m1"})).unwrap();
        let a = analyze_position(&make_position("m1", 10.0, 0.5), &market, now());
        assert_eq!(a.current_price, 0.0);
        assert_eq!(a.spread, 0.0);
        assert!(approx_eq(a.pnl, -5.0));
        assert!(!a.is_winner);
        assert_eq!(a.question, UNTITLED);
        assert_eq!(a.category, UNCATEGORIZED);
        assert_eq!(a.time_left, None);
    }

    #[test]
    fn priceless_market_is_neither_pattern_nor_recent() {
        let market: Market = serde_json::from_value(json!({
            "id": "bare",
            "volume": 60_000,
            "category": "Crypto",
            "endDate": (now() + Duration::days(4)).to_rfc3339(),
        }))
        .unwrap();
        assert_eq!(market_spread(&market), 0.0);
        let markets = vec![market];
        let positions = vec![make_position("bare", 10.0, 0.5)];
        let policy = PatternPolicy::preferred();
        assert!(detect_patterns(&positions, &markets, &policy, now()).is_empty());
        assert!(recent_markets(&markets, &policy, 20).is_empty());
    }

    #[test]
    fn analyze_zero_entry_price_has_no_percent() {
        let market = make_market("m1", 0.6, 0.0, "Crypto", Duration::days(1));
        let a = analyze_position(&make_position("m1", 10.0, 0.0), &market, now());
        assert_eq!(a.pnl_percent, None);
        assert!(approx_eq(a.pnl, 6.0));
    }

    #[test]
    fn zero_pnl_is_not_a_winner() {
        let market = make_market("m1", 0.5, 0.0, "Crypto", Duration::days(1));
        let a = analyze_position(&make_position("m1", 10.0, 0.5), &market, now());
        assert!(!a.is_winner);
    }

    // ── PatternPolicy ──────────────────────────────────────────────

    #[test]
    fn preferred_spread_bounds_inclusive() {
        let p = PatternPolicy::preferred();
        assert!(p.admits_spread(1.0));
        assert!(p.admits_spread(3.0));
        assert!(!p.admits_spread(0.99));
        assert!(!p.admits_spread(3.01));
    }

    #[test]
    fn preferred_volume_floor_inclusive() {
        let p = PatternPolicy::preferred();
        assert!(p.admits_volume(50_000.0));
        assert!(!p.admits_volume(49_999.99));
    }

    #[test]
    fn preferred_category_allow_list() {
        let p = PatternPolicy::preferred();
        assert!(p.admits_category(Some("Sports")));
        assert!(!p.admits_category(Some("Science")));
        assert!(!p.admits_category(None));
        assert!(p.admits(2.0, 60_000.0, Some("Politics")));
        assert!(!p.admits(2.0, 60_000.0, Some("Science")));
    }

    #[test]
    fn tight_ignores_category() {
        let p = PatternPolicy::tight();
        assert!(p.admits(1.5, 100_000.0, None));
        assert!(p.admits(2.0, 100_000.0, Some("Anything")));
        assert!(!p.admits(2.01, 100_000.0, None));
        assert!(!p.admits(1.75, 99_999.0, None));
    }

    // ── detect_patterns ────────────────────────────────────────────

    #[test]
    fn patterns_match_certain_market() {
        // yes = 1.0 gives spread exactly 1.0
        let markets = vec![make_market("m1", 1.0, 50_000.0, "Crypto", Duration::days(3))];
        let positions = vec![make_position("m1", 10.0, 0.9)];
        let found = detect_patterns(&positions, &markets, &PatternPolicy::preferred(), now());
        assert_eq!(found.len(), 1);
        assert_eq!(
            found[0].match_reason,
            "Spread 1.0%, Volume $50k, Categoria: Crypto, Tempo 3d"
        );
        assert_eq!(found[0].position.market_id, "m1");
    }

    #[test]
    fn patterns_skip_low_volume_and_wrong_category() {
        let markets = vec![
            make_market("low", 1.0, 49_999.0, "Crypto", Duration::days(3)),
            make_market("cat", 0.0, 80_000.0, "Science", Duration::days(3)),
            make_market("ok", 0.0, 80_000.0, "Sports", Duration::days(3)),
        ];
        let positions = vec![
            make_position("low", 1.0, 0.5),
            make_position("cat", 1.0, 0.5),
            make_position("ok", 1.0, 0.5),
        ];
        let found = detect_patterns(&positions, &markets, &PatternPolicy::preferred(), now());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].position.market_id, "ok");
    }

    #[test]
    fn patterns_check_raw_category_not_display_default() {
        let mut bare = make_market("bare", 1.0, 80_000.0, "Crypto", Duration::days(2));
        bare.category = None;
        let markets = vec![bare];
        let positions = vec![make_position("bare", 1.0, 0.5)];
        let policy = PatternPolicy {
            allowed_categories: Some(vec![UNCATEGORIZED.to_string()]),
            ..PatternPolicy::preferred()
        };
        let analyzed = analyze_positions(&positions, &markets, now());
        assert_eq!(analyzed[0].category, UNCATEGORIZED);
        assert!(patterns_from_analyzed(&analyzed, &markets, &policy).is_empty());
        assert!(recent_markets(&markets, &policy, 20).is_empty());

        let any = PatternPolicy { allowed_categories: None, ..policy };
        let found = detect_patterns(&positions, &markets, &any, now());
        assert_eq!(found.len(), 1);
        assert!(found[0].match_reason.ends_with("Categoria: Outros, Tempo 2d"));
    }

    #[test]
    fn patterns_skip_expired_and_undated() {
        let mut undated = make_market("undated", 1.0, 80_000.0, "Crypto", Duration::days(1));
        undated.end_date = None;
        let markets = vec![
            make_market("expired", 1.0, 80_000.0, "Crypto", Duration::hours(-1)),
            undated,
        ];
        let positions = vec![make_position("expired", 1.0, 0.5), make_position("undated", 1.0, 0.5)];
        assert!(detect_patterns(&positions, &markets, &PatternPolicy::preferred(), now()).is_empty());
    }

    #[test]
    fn patterns_drop_unresolved_positions() {
        let markets = vec![make_market("m1", 1.0, 80_000.0, "Crypto", Duration::days(1))];
        let positions = vec![make_position("missing", 1.0, 0.5)];
        assert!(detect_patterns(&positions, &markets, &PatternPolicy::preferred(), now()).is_empty());
    }

    // ── calculate_stats ────────────────────────────────────────────

    #[test]
    fn stats_none_when_nothing_resolves() {
        let markets = vec![make_market("m1", 0.5, 0.0, "Crypto", Duration::days(1))];
        assert!(calculate_stats(&[], &markets, now()).is_none());
        assert!(calculate_stats(&[make_position("m2", 1.0, 0.5)], &markets, now()).is_none());
    }

    #[test]
    fn stats_aggregate_repeated_market() {
        let positions = vec![
            analyzed("m1", 10.0, Some(20.0), "Crypto"),
            analyzed("m1", -3.0, Some(-6.0), "Crypto"),
        ];
        let stats = stats_from_analyzed(positions).unwrap();
        assert_eq!(stats.top_markets.len(), 1);
        assert_eq!(stats.top_markets[0].market_id, "m1");
        assert!(approx_eq(stats.top_markets[0].total_pnl, 7.0));
        assert_eq!(stats.top_markets[0].trades, 2);
        assert!(approx_eq(stats.total_pnl, 7.0));
        assert_eq!(stats.wins, 1);
        assert_eq!(stats.losses, 1);
        assert!(approx_eq(stats.win_rate, 50.0));
        assert!(approx_eq(stats.avg_gain, 20.0));
        assert!(approx_eq(stats.avg_loss, 6.0));
        assert!(approx_eq(stats.profit_factor, 20.0 / 6.0));
    }

    #[test]
    fn stats_profit_factor_zero_without_losses() {
        let stats = stats_from_analyzed(vec![analyzed("m1", 5.0, Some(10.0), "Crypto")]).unwrap();
        assert_eq!(stats.avg_loss, 0.0);
        assert_eq!(stats.profit_factor, 0.0);
        assert!(approx_eq(stats.win_rate, 100.0));
    }

    #[test]
    fn stats_skip_undefined_percent_in_averages() {
        let stats = stats_from_analyzed(vec![
            analyzed("m1", 5.0, None, "Crypto"),
            analyzed("m2", 1.0, Some(4.0), "Crypto"),
        ])
        .unwrap();
        assert!(approx_eq(stats.avg_gain, 4.0));
        assert_eq!(stats.wins, 2);
        assert!(stats.avg_gain.is_finite());
    }

    #[test]
    fn stats_by_category_sorted_by_pnl() {
        let stats = stats_from_analyzed(vec![
            analyzed("m1", -2.0, Some(-4.0), "Sports"),
            analyzed("m2", 3.0, Some(6.0), "Crypto"),
            analyzed("m3", 4.0, Some(8.0), "Sports"),
        ])
        .unwrap();
        assert_eq!(stats.by_category.len(), 2);
        assert_eq!(stats.by_category[0].category, "Crypto");
        assert!(approx_eq(stats.by_category[0].pnl, 3.0));
        assert_eq!(stats.by_category[1].category, "Sports");
        assert_eq!(stats.by_category[1].count, 2);
        assert!(approx_eq(stats.by_category[1].pnl, 2.0));
    }

    #[test]
    fn stats_top_markets_truncated_and_sorted() {
        let positions: Vec<_> = (0..12)
            .map(|i| analyzed(&format!("m{i}"), i as f64, Some(1.0), "Crypto"))
            .collect();
        let stats = stats_from_analyzed(positions).unwrap();
        assert_eq!(stats.top_markets.len(), 10);
        assert_eq!(stats.top_markets[0].market_id, "m11");
        assert_eq!(stats.top_markets[9].market_id, "m2");
        assert_eq!(stats.positions.len(), 12);
    }

    #[test]
    fn stats_first_occurrence_names_market() {
        let mut second = analyzed("m1", 1.0, Some(1.0), "Crypto");
        second.question = "Other title".to_string();
        let stats =
            stats_from_analyzed(vec![analyzed("m1", 1.0, Some(1.0), "Crypto"), second]).unwrap();
        assert_eq!(stats.top_markets[0].question, "Q m1");
    }

    #[test]
    fn market_index_first_wins() {
        let mut dup = make_market("m1", 0.9, 0.0, "Crypto", Duration::days(1));
        dup.question = Some("duplicate".to_string());
        let markets = vec![make_market("m1", 0.1, 0.0, "Crypto", Duration::days(1)), dup];
        let index = MarketIndex::new(&markets);
        assert_eq!(index.get("m1").unwrap().question.as_deref(), Some("Question m1?"));
        assert!(index.get("nope").is_none());
    }

    // ── recent_markets ─────────────────────────────────────────────

    #[test]
    fn recent_markets_filter_sort_truncate() {
        let markets = vec![
            make_market("a", 1.0, 60_000.0, "Crypto", Duration::days(1)),
            make_market("b", 0.0, 90_000.0, "Sports", Duration::days(1)),
            make_market("c", 0.5, 900_000.0, "Crypto", Duration::days(1)),
            make_market("d", 1.0, 70_000.0, "Science", Duration::days(1)),
            make_market("e", 1.0, 80_000.0, "Politics", Duration::days(1)),
        ];
        let out = recent_markets(&markets, &PatternPolicy::preferred(), 2);
        let ids: Vec<_> = out.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "e"]);
        assert_eq!(out[0].yes_price, 0.0);
        assert_eq!(out[0].no_price, 1.0);
        assert_eq!(out[0].spread, 1.0);
    }
}
