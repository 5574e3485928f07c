use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Display fallback for markets without a question.
pub const UNTITLED: &str = "Sem título";

/// Display fallback for markets without a category.
pub const UNCATEGORIZED: &str = "Outros";

// ── API records ────────────────────────────────────────────────────

/// A market snapshot as returned by the market listing endpoint.
///
/// Numeric fields arrive either as JSON numbers or decimal strings; anything
/// unparseable decodes as `None` and is treated as 0 downstream.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Market {
    #[serde(deserialize_with = "de::id")]
    pub id: String,
    #[serde(deserialize_with = "de::opt_string")]
    pub question: Option<String>,
    /// `[yes, no]` outcome probabilities.
    #[serde(deserialize_with = "de::outcome_prices")]
    pub outcome_prices: Vec<f64>,
    #[serde(deserialize_with = "de::opt_f64")]
    pub volume: Option<f64>,
    #[serde(deserialize_with = "de::opt_f64")]
    pub liquidity: Option<f64>,
    #[serde(deserialize_with = "de::opt_f64")]
    pub last_trade_price: Option<f64>,
    #[serde(deserialize_with = "de::opt_f64")]
    pub best_bid: Option<f64>,
    #[serde(deserialize_with = "de::opt_string")]
    pub category: Option<String>,
    #[serde(deserialize_with = "de::opt_string")]
    pub end_date: Option<String>,
}

impl Market {
    pub fn yes_price(&self) -> f64 {
        self.outcome_prices.first().copied().unwrap_or(0.0)
    }

    pub fn no_price(&self) -> f64 {
        self.outcome_prices.get(1).copied().unwrap_or(0.0)
    }

    /// Parsed end timestamp. Accepts RFC 3339 or a bare `YYYY-MM-DD` date
    /// (midnight UTC). Unparseable dates count as absent.
    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        let raw = self.end_date.as_deref()?.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OutcomeSide {
    Yes,
    No,
}

/// A held quantity of one market outcome.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Position {
    #[serde(deserialize_with = "de::id")]
    pub market_id: String,
    #[serde(deserialize_with = "de::opt_string")]
    pub outcome: Option<String>,
    #[serde(deserialize_with = "de::opt_string")]
    pub side: Option<String>,
    #[serde(deserialize_with = "de::opt_f64")]
    pub size: Option<f64>,
    #[serde(deserialize_with = "de::opt_f64")]
    pub entry_price: Option<f64>,
}

impl Position {
    /// `outcome` wins over `side`; only an explicit yes maps to YES.
    pub fn outcome_side(&self) -> OutcomeSide {
        let raw = self.outcome.as_deref().or(self.side.as_deref());
        match raw {
            Some(s) if s.trim().eq_ignore_ascii_case("yes") => OutcomeSide::Yes,
            _ => OutcomeSide::No,
        }
    }
}

/// A historical fill for the configured wallet.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Trade {
    #[serde(deserialize_with = "de::id")]
    pub id: String,
    #[serde(deserialize_with = "de::id")]
    pub market: String,
    #[serde(deserialize_with = "de::opt_string")]
    pub side: Option<String>,
    #[serde(deserialize_with = "de::opt_string")]
    pub outcome: Option<String>,
    #[serde(deserialize_with = "de::opt_f64")]
    pub size: Option<f64>,
    #[serde(deserialize_with = "de::opt_f64")]
    pub price: Option<f64>,
    #[serde(deserialize_with = "de::opt_string")]
    pub match_time: Option<String>,
}

// ── Derived records ────────────────────────────────────────────────

/// A position joined with its market and priced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzedPosition {
    pub market_id: String,
    pub question: String,
    pub outcome: OutcomeSide,
    pub size: f64,
    pub entry_price: f64,
    pub current_price: f64,
    pub pnl: f64,
    /// `None` when the entry price is zero.
    pub pnl_percent: Option<f64>,
    pub spread: f64,
    pub volume_24h: f64,
    pub liquidity: f64,
    pub time_left: Option<String>,
    pub category: String,
    pub is_winner: bool,
}

/// A position that satisfied the pattern policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pattern {
    #[serde(flatten)]
    pub position: AnalyzedPosition,
    pub match_reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryStats {
    pub category: String,
    pub count: usize,
    pub pnl: f64,
}

/// P&L summed over every position held in one market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketPnl {
    pub market_id: String,
    pub question: String,
    #[serde(rename = "totalPnL")]
    pub total_pnl: f64,
    pub trades: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioStats {
    pub total_positions: usize,
    #[serde(rename = "totalPnL")]
    pub total_pnl: f64,
    pub win_rate: f64,
    pub wins: usize,
    pub losses: usize,
    pub avg_gain: f64,
    pub avg_loss: f64,
    pub profit_factor: f64,
    pub by_category: Vec<CategoryStats>,
    pub top_markets: Vec<MarketPnl>,
    pub positions: Vec<AnalyzedPosition>,
}

/// Flat projection of a market for the report's `recentMarkets` list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSummary {
    pub id: String,
    pub question: Option<String>,
    pub yes_price: f64,
    pub no_price: f64,
    pub volume: f64,
    pub liquidity: f64,
    pub spread: f64,
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub total_positions: usize,
    pub total_markets: usize,
    pub patterns_found: usize,
}

/// The `data.json` document consumed by the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub generated_at: DateTime<Utc>,
    pub summary: ReportSummary,
    pub stats: Option<PortfolioStats>,
    pub patterns: Vec<Pattern>,
    pub recent_markets: Vec<MarketSummary>,
}

/// Lenient field decoders for API payloads.
mod de {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    /// JSON number or decimal string; non-finite and non-numeric values are `None`.
    pub fn number(v: &Value) -> Option<f64> {
        let n = match v {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }?;
        n.is_finite().then_some(n)
    }

    pub fn opt_f64<'de, D>(d: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let v = Option::<Value>::deserialize(d)?;
        Ok(v.as_ref().and_then(number))
    }

    pub fn opt_string<'de, D>(d: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let v = Option::<Value>::deserialize(d)?;
        Ok(match v {
            Some(Value::String(s)) if !s.is_empty() => Some(s),
            _ => None,
        })
    }

    /// Identifiers show up as strings or integers depending on the endpoint.
    pub fn id<'de, D>(d: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        let v = Option::<Value>::deserialize(d)?;
        Ok(match v {
            Some(Value::String(s)) => s,
            Some(Value::Number(n)) => n.to_string(),
            _ => String::new(),
        })
    }

    /// Outcome prices arrive as a JSON array, a JSON-encoded array string
    /// (`"[\"0.55\", \"0.45\"]"`) or a comma-separated string.
    pub fn outcome_prices<'de, D>(d: D) -> Result<Vec<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let v = Option::<Value>::deserialize(d)?;
        Ok(match v {
            Some(Value::Array(items)) => items.iter().map(|i| number(i).unwrap_or(0.0)).collect(),
            Some(Value::String(s)) => parse_price_string(&s),
            _ => Vec::new(),
        })
    }

    fn parse_price_string(s: &str) -> Vec<f64> {
        let trimmed = s.trim();
        if trimmed.starts_with('[') {
            return serde_json::from_str::<Vec<Value>>(trimmed)
                .map(|items| items.iter().map(|i| number(i).unwrap_or(0.0)).collect())
                .unwrap_or_default();
        }
        if trimmed.is_empty() {
            return Vec::new();
        }
        trimmed
            .split(',')
            .map(|p| p.trim().trim_matches('"').parse::<f64>().unwrap_or(0.0))
            .collect()
    }
}
