//! Sync configuration parsed from environment variables.

use std::time::Duration;

use crate::error::SyncError;

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:3000";
pub const DEFAULT_PAGE_SIZE: usize = 100;
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_BASE_DELAY_MS: u64 = 1000;
pub const DEFAULT_MAX_DELAY_MS: u64 = 30_000;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

/// Tunables for a paginated `load_all`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    pub page_size: usize,
    /// Consecutive retryable failures tolerated on a single page.
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: Duration::from_millis(DEFAULT_BASE_DELAY_MS),
            max_delay: Duration::from_millis(DEFAULT_MAX_DELAY_MS),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    pub api_base_url: String,
    pub api_token: Option<String>,
    pub load: LoadOptions,
    pub timeouts: HttpTimeouts,
}

impl SyncConfig {
    /// Build typed sync config from environment variables.
    ///
    /// All optional:
    /// - `REPLAY_API_BASE_URL`: default `http://127.0.0.1:3000`
    /// - `REPLAY_API_TOKEN_ENV`: names the env var holding a bearer token
    /// - `REPLAY_SYNC_PAGE_SIZE`: default 100
    /// - `REPLAY_SYNC_MAX_RETRIES`: default 3
    /// - `REPLAY_SYNC_BASE_DELAY_MS` / `REPLAY_SYNC_MAX_DELAY_MS`: default 1000 / 30000
    /// - `REPLAY_REQUEST_TIMEOUT_SECS` / `REPLAY_CONNECT_TIMEOUT_SECS`: default 30 / 10
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Config`] for unparseable numbers, a zero page size,
    /// or a token env var that names an unset variable.
    pub fn from_env() -> Result<Self, SyncError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`SyncConfig::from_env`] but reading values through `lookup`.
    ///
    /// # Errors
    ///
    /// See [`SyncConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SyncError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_base_url = lookup("REPLAY_API_BASE_URL")
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let api_token = match lookup("REPLAY_API_TOKEN_ENV") {
            Some(var) => {
                let token = lookup(&var).ok_or_else(|| SyncError::Config(format!("token env var {var} not set")))?;
                Some(token)
            }
            None => None,
        };

        let page_size = parse_or(&lookup, "REPLAY_SYNC_PAGE_SIZE", DEFAULT_PAGE_SIZE)?;
        if page_size == 0 {
            return Err(SyncError::Config("REPLAY_SYNC_PAGE_SIZE must be at least 1".into()));
        }
        let load = LoadOptions {
            page_size,
            max_retries: parse_or(&lookup, "REPLAY_SYNC_MAX_RETRIES", DEFAULT_MAX_RETRIES)?,
            base_delay: Duration::from_millis(parse_or(&lookup, "REPLAY_SYNC_BASE_DELAY_MS", DEFAULT_BASE_DELAY_MS)?),
            max_delay: Duration::from_millis(parse_or(&lookup, "REPLAY_SYNC_MAX_DELAY_MS", DEFAULT_MAX_DELAY_MS)?),
        };
        let timeouts = HttpTimeouts {
            request_secs: parse_or(&lookup, "REPLAY_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS)?,
            connect_secs: parse_or(&lookup, "REPLAY_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS)?,
        };

        Ok(Self { api_base_url, api_token, load, timeouts })
    }
}

impl From<&SyncConfig> for LoadOptions {
    fn from(config: &SyncConfig) -> Self {
        config.load
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, SyncError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| SyncError::Config(format!("invalid {key}: {raw}"))),
        None => Ok(default),
    }
}
