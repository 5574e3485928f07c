//! L2 HMAC-SHA256 request signing for the CLOB REST API.
//!
//! Every authenticated call carries a timestamp, the API key, the passphrase
//! and `base64(HMAC-SHA256(secret, timestamp + METHOD + path + body))`, where
//! the secret is itself base64-encoded in configuration.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, Mac};
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue, InvalidHeaderValue};
use sha2::Sha256;
use thiserror::Error;
use tracing::debug;

use crate::{API_KEY_VAR, API_PASSPHRASE_VAR, API_SECRET_VAR};

type HmacSha256 = Hmac<Sha256>;

pub const HEADER_TIMESTAMP: &str = "x-bapi-timestamp";
pub const HEADER_API_KEY: &str = "x-bapi-api-key";
pub const HEADER_SIGNATURE: &str = "x-bapi-sign";
pub const HEADER_PASSPHRASE: &str = "x-bapi-passphrase";

#[derive(Error, Debug)]
pub enum CredentialsError {
    #[error("missing required environment variable(s): {}", .0.join(", "))]
    Missing(Vec<&'static str>),
    #[error("POLYMARKET_API_SECRET is not valid base64: {0}")]
    InvalidSecret(#[from] base64::DecodeError),
    #[error("HMAC key error: {0}")]
    HmacKey(String),
}

/// L2 API credentials with the secret already decoded into a keyed MAC.
#[derive(Clone)]
pub struct Credentials {
    api_key: String,
    passphrase: String,
    mac: HmacSha256,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("secret", &"<redacted>")
            .field("passphrase", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Build credentials from raw values. `secret` is the base64 string handed
    /// out by the API.
    pub fn new(api_key: &str, secret: &str, passphrase: &str) -> Result<Self, CredentialsError> {
        let secret_bytes = BASE64.decode(secret.trim())?;
        let mac = <HmacSha256 as Mac>::new_from_slice(&secret_bytes)
            .map_err(|e| CredentialsError::HmacKey(e.to_string()))?;
        Ok(Self {
            api_key: api_key.to_string(),
            passphrase: passphrase.to_string(),
            mac,
        })
    }

    /// Read credentials from the process environment.
    pub fn from_env() -> Result<Self, CredentialsError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read credentials through `lookup`. Empty values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CredentialsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let api_key = read(API_KEY_VAR);
        let secret = read(API_SECRET_VAR);
        let passphrase = read(API_PASSPHRASE_VAR);

        match (api_key, secret, passphrase) {
            (Some(key), Some(secret), Some(pass)) => Self::new(&key, &secret, &pass),
            (key, secret, pass) => {
                let missing = [
                    (API_KEY_VAR, key.is_none()),
                    (API_SECRET_VAR, secret.is_none()),
                    (API_PASSPHRASE_VAR, pass.is_none()),
                ]
                .into_iter()
                .filter_map(|(name, absent)| absent.then_some(name))
                .collect();
                Err(CredentialsError::Missing(missing))
            }
        }
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Sign a request. `path` includes the query string and `body` is the
    /// serialized JSON body, or empty.
    pub fn sign(&self, method: &str, path: &str, body: &str, timestamp_ms: i64) -> AuthHeaders {
        let message = format!("{}{}{}{}", timestamp_ms, method.to_uppercase(), path, body);

        let mut mac = self.mac.clone();
        mac.update(message.as_bytes());
        let signature = BASE64.encode(mac.finalize().into_bytes());

        debug!(method, path, timestamp_ms, "built L2 auth headers");

        AuthHeaders {
            timestamp: timestamp_ms.to_string(),
            api_key: self.api_key.clone(),
            signature,
            passphrase: self.passphrase.clone(),
        }
    }

    /// Sign a request stamped with the current time.
    pub fn sign_now(&self, method: &str, path: &str, body: &str) -> AuthHeaders {
        self.sign(method, path, body, chrono::Utc::now().timestamp_millis())
    }
}

/// The header set attached to every authenticated request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthHeaders {
    pub timestamp: String,
    pub api_key: String,
    pub signature: String,
    pub passphrase: String,
}

impl AuthHeaders {
    pub fn to_header_map(&self) -> Result<HeaderMap, InvalidHeaderValue> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(HEADER_TIMESTAMP, HeaderValue::from_str(&self.timestamp)?);
        headers.insert(HEADER_API_KEY, HeaderValue::from_str(&self.api_key)?);
        headers.insert(HEADER_SIGNATURE, HeaderValue::from_str(&self.signature)?);
        headers.insert(HEADER_PASSPHRASE, HeaderValue::from_str(&self.passphrase)?);
        Ok(headers)
    }
}
