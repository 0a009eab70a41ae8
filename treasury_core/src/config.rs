use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{TreasuryError, TreasuryResult};
use crate::helpers::retry::RetryPolicy;

pub const DEFAULT_SKYNET_URL: &str = "https://api-gateway.skymavis.com";
pub const DEFAULT_COINGECKO_URL: &str = "https://api.coingecko.com/api/v3";
pub const DEFAULT_TREASURY_WALLET: &str = "0x245db945c485b68fdc429e4f7085a1761aa4d45d";
pub const DEFAULT_DECIMALS: u32 = 18;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackedToken {
    pub symbol: &'static str,
    pub coingecko_id: &'static str,
    pub decimals: u32,
}

pub const AXS: TrackedToken = TrackedToken {
    symbol: "AXS",
    coingecko_id: "axie-infinity",
    decimals: 18,
};

pub const WETH: TrackedToken = TrackedToken {
    symbol: "WETH",
    coingecko_id: "ethereum",
    decimals: 18,
};

pub const TRACKED_TOKENS: &[TrackedToken] = &[AXS, WETH];

pub fn decimals_for(symbol: &str) -> u32 {
    TRACKED_TOKENS
        .iter()
        .find(|token| token.symbol.eq_ignore_ascii_case(symbol))
        .map(|token| token.decimals)
        .unwrap_or(DEFAULT_DECIMALS)
}

#[derive(Debug, Clone)]
pub struct Config {
    pub skynet_url: String,
    pub skynet_api_key: Option<String>,
    pub coingecko_url: String,
    pub db_path: PathBuf,
    pub wallet: String,
    pub export_dir: PathBuf,
    pub window_size: u64,
    pub page_size: usize,
    pub lookup_batch_size: usize,
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
    pub server_domain: String,
}

impl Config {
    /// Reads `.env` (if present) and then the process environment.
    pub fn load() -> TreasuryResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_env()
    }

    pub fn from_env() -> TreasuryResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> TreasuryResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let retry = RetryPolicy {
            max_retries: parse_or(&get, "RETRY_MAX_ATTEMPTS", 3u32)?,
            initial_delay: Duration::from_millis(parse_or(&get, "RETRY_INITIAL_DELAY_MS", 500u64)?),
            max_delay: Duration::from_millis(parse_or(&get, "RETRY_MAX_DELAY_MS", 10_000u64)?),
        };

        Ok(Self {
            skynet_url: get("SKYNET_URL")
                .unwrap_or_else(|| DEFAULT_SKYNET_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            skynet_api_key: get("SKYNET_API_KEY"),
            coingecko_url: get("COINGECKO_URL")
                .unwrap_or_else(|| DEFAULT_COINGECKO_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            db_path: PathBuf::from(get("TREASURY_DB_PATH").unwrap_or_else(|| "treasury_db".to_string())),
            wallet: get("TREASURY_WALLET")
                .unwrap_or_else(|| DEFAULT_TREASURY_WALLET.to_string())
                .to_lowercase(),
            export_dir: PathBuf::from(get("EXPORT_DIR").unwrap_or_else(|| "dashboard_data".to_string())),
            window_size: parse_positive(&get, "WINDOW_SIZE", 200u64)?,
            page_size: parse_positive(&get, "PAGE_SIZE", 200usize)?,
            lookup_batch_size: parse_positive(&get, "LOOKUP_BATCH_SIZE", 100usize)?,
            request_timeout: Duration::from_secs(parse_positive(&get, "REQUEST_TIMEOUT_SECS", 30u64)?),
            retry,
            server_domain: get("SERVER_DOMAIN").unwrap_or_else(|| "127.0.0.1:8080".to_string()),
        })
    }

    pub fn api_key(&self) -> TreasuryResult<&str> {
        self.skynet_api_key
            .as_deref()
            .ok_or_else(|| TreasuryError::Config("SKYNET_API_KEY must be set".to_string()))
    }
}

fn parse_or<T, F>(get: &F, key: &str, default: T) -> TreasuryResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| TreasuryError::Config(format!("{} is not valid ({}): {}", key, raw, e))),
        None => Ok(default),
    }
}

fn parse_positive<T, F>(get: &F, key: &str, default: T) -> TreasuryResult<T>
where
    T: FromStr + PartialOrd + Default,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    let value = parse_or(get, key, default)?;
    if value <= T::default() {
        return Err(TreasuryError::Config(format!("{} must be positive", key)));
    }
    Ok(value)
}
