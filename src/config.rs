use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::CLOB_API_BASE;
use crate::engine::PatternPolicy;

/// Default config file path.
pub const CONFIG_PATH: &str = "config.toml";

/// Top-level application config deserialized from `config.toml`.
///
/// Credentials never live here; they come from the environment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub settings: SettingsConfig,
    #[serde(default)]
    pub policy: PatternPolicy,
}

/// Runtime settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Page size for the market listing.
    #[serde(default = "default_market_limit")]
    pub market_limit: usize,
    #[serde(default = "default_trade_limit")]
    pub trade_limit: usize,
    /// Maximum entries in the report's `recentMarkets`.
    #[serde(default = "default_recent_markets_limit")]
    pub recent_markets_limit: usize,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,
    #[serde(default = "default_template_path")]
    pub template_path: PathBuf,
}

fn default_base_url() -> String {
    CLOB_API_BASE.to_string()
}

fn default_market_limit() -> usize {
    500
}

fn default_trade_limit() -> usize {
    200
}

fn default_recent_markets_limit() -> usize {
    20
}

fn default_request_timeout() -> u64 {
    30
}

fn default_output_path() -> PathBuf {
    PathBuf::from("data.json")
}

fn default_template_path() -> PathBuf {
    PathBuf::from("index.html")
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            market_limit: default_market_limit(),
            trade_limit: default_trade_limit(),
            recent_markets_limit: default_recent_markets_limit(),
            request_timeout_secs: default_request_timeout(),
            output_path: default_output_path(),
            template_path: default_template_path(),
        }
    }
}

/// Named threshold presets selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PolicyPreset {
    /// Spread 1.0-3.0, volume >= 50k, preferred categories only.
    Preferred,
    /// Spread 1.5-2.0, volume >= 100k, any category.
    Tight,
}

impl PolicyPreset {
    pub fn policy(self) -> PatternPolicy {
        match self {
            PolicyPreset::Preferred => PatternPolicy::preferred(),
            PolicyPreset::Tight => PatternPolicy::tight(),
        }
    }
}

impl AppConfig {
    /// Load config from the given TOML file path.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config: Self = toml::from_str(&contents)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// Load config if the file exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            let config = Self::load(path)?;
            info!("Loaded config from {}", path.display());
            Ok(config)
        } else {
            info!("No {} found, using defaults", path.display());
            Ok(Self::default())
        }
    }
}
