//! Runtime configuration read from `MATCHROOM_*` environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::domain::{CARD_SLUGS, DEFAULT_PAIR_COUNT};
use crate::error::AppError;
use crate::services::DEFAULT_MAX_RETRIES;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_SESSION_TTL_SECS: u64 = 3600;
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 600;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Unset means events stay in-process.
    pub redis_url: Option<String>,
    pub pair_count: usize,
    pub session_ttl: Duration,
    pub sweep_interval: Duration,
    pub max_move_retries: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            redis_url: None,
            pair_count: DEFAULT_PAIR_COUNT,
            session_ttl: Duration::from_secs(DEFAULT_SESSION_TTL_SECS),
            sweep_interval: Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
            max_move_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let pair_count = parse_or(&get, "MATCHROOM_PAIR_COUNT", defaults.pair_count)?;
        if pair_count == 0 || pair_count > CARD_SLUGS.len() {
            return Err(AppError::config(format!(
                "MATCHROOM_PAIR_COUNT must be between 1 and {}, got {pair_count}",
                CARD_SLUGS.len()
            )));
        }

        let sweep_secs = parse_or(&get, "MATCHROOM_SWEEP_INTERVAL_SECS", DEFAULT_SWEEP_INTERVAL_SECS)?;
        if sweep_secs == 0 {
            return Err(AppError::config(
                "MATCHROOM_SWEEP_INTERVAL_SECS must be greater than 0",
            ));
        }

        Ok(Self {
            host: get("MATCHROOM_HOST").unwrap_or(defaults.host),
            port: parse_or(&get, "MATCHROOM_PORT", defaults.port)?,
            redis_url: get("MATCHROOM_REDIS_URL"),
            pair_count,
            session_ttl: Duration::from_secs(parse_or(
                &get,
                "MATCHROOM_SESSION_TTL_SECS",
                DEFAULT_SESSION_TTL_SECS,
            )?),
            sweep_interval: Duration::from_secs(sweep_secs),
            max_move_retries: parse_or(&get, "MATCHROOM_MAX_MOVE_RETRIES", defaults.max_move_retries)?,
        })
    }

    pub fn bind_addr(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|err| AppError::config(format!("{key}={raw:?} is invalid: {err}"))),
    }
}
