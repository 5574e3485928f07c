use std::time::Duration;

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::auth::Credentials;
use crate::types::{Market, Position, Trade};

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid header value: {0}")]
    Header(#[from] reqwest::header::InvalidHeaderValue),
}

/// Anything that can answer a signed JSON request against the CLOB API.
///
/// `path` always includes the query string.
#[allow(async_fn_in_trait)]
pub trait JsonSource {
    async fn request_json(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value, ClientError>;

    async fn get_json(&self, path: &str) -> Result<Value, ClientError> {
        self.request_json(Method::GET, path, None).await
    }
}

/// Authenticated HTTP client for the CLOB REST API.
pub struct ClobClient {
    http: reqwest::Client,
    base_url: String,
    creds: Credentials,
}

impl ClobClient {
    pub fn new(base_url: &str, creds: Credentials, timeout: Duration) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_http(base_url, creds, http))
    }

    /// Use a preconfigured `reqwest::Client`.
    pub fn with_http(base_url: &str, creds: Credentials, http: reqwest::Client) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            creds,
        }
    }
}

impl JsonSource for ClobClient {
    /// One signed request, no retries. Non-2xx responses fail with the status
    /// and the response body text.
    async fn request_json(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value, ClientError> {
        let body_str = match body {
            Some(b) => serde_json::to_string(b)?,
            None => String::new(),
        };
        let headers = self
            .creds
            .sign_now(method.as_str(), path, &body_str)
            .to_header_map()?;
        let url = format!("{}{}", self.base_url, path);

        let mut req = self.http.request(method, &url).headers(headers);
        if body.is_some() {
            req = req.body(body_str);
        }

        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }
        let text = resp.text().await?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// Result of a best-effort wallet fetch.
///
/// Distinguishes "the wallet has nothing" (`Data` with an empty vec) from
/// "no wallet configured" and "the fetch failed".
#[derive(Debug)]
pub enum Fetched<T> {
    Data(Vec<T>),
    NoWallet,
    Degraded(String),
}

impl<T> Fetched<T> {
    pub fn items(&self) -> &[T] {
        match self {
            Fetched::Data(items) => items,
            Fetched::NoWallet | Fetched::Degraded(_) => &[],
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Fetched::Degraded(_))
    }
}

/// Pull the record list out of a response: a bare array, or the first of
/// `keys` holding an array. Records that fail to decode are skipped.
fn extract_list<T: DeserializeOwned>(body: Value, keys: &[&str], what: &str) -> Vec<T> {
    let items = match body {
        Value::Array(items) => items,
        Value::Object(mut obj) => keys
            .iter()
            .find_map(|k| match obj.remove(*k) {
                Some(Value::Array(items)) => Some(items),
                _ => None,
            })
            .unwrap_or_default(),
        _ => Vec::new(),
    };

    let total = items.len();
    let decoded: Vec<T> = items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(v) => Some(v),
            Err(e) => {
                debug!("Skipping undecodable {what}: {e}");
                None
            }
        })
        .collect();
    if decoded.len() < total {
        warn!("Skipped {} of {total} {what} record(s)", total - decoded.len());
    }
    decoded
}

/// Fetch active, non-closed markets. Failure here is fatal to the run.
pub async fn fetch_markets(src: &impl JsonSource, limit: usize) -> Result<Vec<Market>, ClientError> {
    let path = format!("/data?limit={limit}&active=true&closed=false");
    let body = src.get_json(&path).await?;
    let markets = extract_list(body, &["data", "markets"], "market");
    debug!("Fetched {} markets", markets.len());
    Ok(markets)
}

/// Fetch the wallet's open positions, best effort.
pub async fn fetch_positions(src: &impl JsonSource, wallet: Option<&str>) -> Fetched<Position> {
    let Some(wallet) = wallet else {
        return Fetched::NoWallet;
    };
    let path = format!("/data/positions?address={wallet}");
    match src.get_json(&path).await {
        Ok(body) => Fetched::Data(extract_list(body, &["positions", "data"], "position")),
        Err(e) => {
            warn!("Could not fetch positions (permission or endpoint unavailable): {e}");
            Fetched::Degraded(e.to_string())
        }
    }
}

/// Fetch the wallet's recent trades, best effort.
pub async fn fetch_trades(src: &impl JsonSource, wallet: Option<&str>, limit: usize) -> Fetched<Trade> {
    let Some(wallet) = wallet else {
        return Fetched::NoWallet;
    };
    let path = format!("/data/trades?address={wallet}&limit={limit}");
    match src.get_json(&path).await {
        Ok(body) => Fetched::Data(extract_list(body, &["trades", "data"], "trade")),
        Err(e) => {
            warn!("Could not fetch trades: {e}");
            Fetched::Degraded(e.to_string())
        }
    }
}
