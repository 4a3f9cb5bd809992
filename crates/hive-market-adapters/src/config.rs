use std::str::FromStr;

use thiserror::Error;

use hive_market_core::{PairTable, RateSyncConfig, SignMethod};

pub const ENV_RATE_STALE_AFTER_MS: &str = "HIVE_MARKET_RATE_STALE_AFTER_MS";
pub const ENV_RATE_REFRESH_INTERVAL_MS: &str = "HIVE_MARKET_RATE_REFRESH_INTERVAL_MS";
pub const ENV_SIGN_METHOD: &str = "HIVE_MARKET_SIGN_METHOD";
pub const ENV_ORDER_EXPIRATION_DAYS: &str = "HIVE_MARKET_ORDER_EXPIRATION_DAYS";
pub const ENV_HOSTED_APP: &str = "HIVE_MARKET_HOSTED_APP";
pub const ENV_KEYCHAIN: &str = "HIVE_MARKET_KEYCHAIN";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
    #[error("{var} must be greater than zero")]
    Zero { var: &'static str },
}

#[derive(Debug, Clone)]
pub struct MarketAdapterConfig {
    pub rate_stale_after_ms: u64,
    pub rate_refresh_interval_ms: u64,
    pub default_sign_method: SignMethod,
    pub order_expiration_days: u64,
    pub hosted_signer_app: String,
    pub keychain_available: bool,
}

impl Default for MarketAdapterConfig {
    fn default() -> Self {
        Self {
            rate_stale_after_ms: 20_000,
            rate_refresh_interval_ms: 20_000,
            default_sign_method: SignMethod::Key,
            order_expiration_days: 27,
            hosted_signer_app: "hive-market".to_owned(),
            keychain_available: false,
        }
    }
}

impl MarketAdapterConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(v) = lookup(ENV_RATE_STALE_AFTER_MS) {
            cfg.rate_stale_after_ms = positive(ENV_RATE_STALE_AFTER_MS, &v)?;
        }
        if let Some(v) = lookup(ENV_RATE_REFRESH_INTERVAL_MS) {
            cfg.rate_refresh_interval_ms = positive(ENV_RATE_REFRESH_INTERVAL_MS, &v)?;
        }
        if let Some(v) = lookup(ENV_SIGN_METHOD) {
            cfg.default_sign_method = parse(ENV_SIGN_METHOD, &v)?;
        }
        if let Some(v) = lookup(ENV_ORDER_EXPIRATION_DAYS) {
            cfg.order_expiration_days = positive(ENV_ORDER_EXPIRATION_DAYS, &v)?;
        }
        if let Some(v) = lookup(ENV_HOSTED_APP) {
            cfg.hosted_signer_app = v.trim().to_owned();
        }
        if let Some(v) = lookup(ENV_KEYCHAIN) {
            cfg.keychain_available = flag(ENV_KEYCHAIN, &v)?;
        }
        Ok(cfg)
    }

    pub fn rate_sync_config(&self) -> RateSyncConfig {
        RateSyncConfig {
            pairs: PairTable::default(),
            stale_after_ms: self.rate_stale_after_ms,
        }
    }
}

fn parse<T: FromStr>(var: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::Invalid {
        var,
        value: raw.to_owned(),
    })
}

fn positive(var: &'static str, raw: &str) -> Result<u64, ConfigError> {
    match parse::<u64>(var, raw)? {
        0 => Err(ConfigError::Zero { var }),
        n => Ok(n),
    }
}

fn flag(var: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::Invalid {
            var,
            value: raw.to_owned(),
        }),
    }
}
