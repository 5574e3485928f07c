pub mod api;
pub mod auth;
pub mod config;
pub mod demo;
pub mod engine;
pub mod reporter;
pub mod template;
pub mod types;

/// CLOB REST API base URL (Central Limit Order Book)
pub const CLOB_API_BASE: &str = "https://clob.polymarket.com";

/// Environment variables holding the L2 API credentials.
pub const API_KEY_VAR: &str = "POLYMARKET_API_KEY";
pub const API_SECRET_VAR: &str = "POLYMARKET_API_SECRET";
pub const API_PASSPHRASE_VAR: &str = "POLYMARKET_API_PASSPHRASE";

/// Wallet whose positions and trades are analyzed. Optional.
pub const WALLET_VAR: &str = "POLYMARKET_WALLET";

/// Install the stderr `tracing` subscriber shared by all binaries.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}
