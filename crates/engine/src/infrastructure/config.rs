//! Server configuration from environment variables.
//!
//! | Variable | Default |
//! |---|---|
//! | `SERVER_HOST` | `0.0.0.0` |
//! | `SERVER_PORT` / `PORT` | `3001` |
//! | `SESSION_IDLE_TIMEOUT_SECS` | `3600` |
//! | `SESSION_SWEEP_INTERVAL_SECS` | `3600` |
//! | `CORS_ALLOWED_ORIGINS` | unset (no CORS layer) |
//!
//! `SERVER_HOST` may be an IP literal or a hostname such as `localhost`.

use std::net::SocketAddr;
use std::time::Duration;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3001;
const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 60 * 60;
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60 * 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Sessions with nobody online and no activity for longer than this are evicted.
    pub idle_timeout: Duration,
    pub sweep_interval: Duration,
    /// Raw `CORS_ALLOWED_ORIGINS` value, trimmed; `None` when unset or blank.
    pub cors_allowed_origins: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            idle_timeout: Duration::from_secs(DEFAULT_IDLE_TIMEOUT_SECS),
            sweep_interval: Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
            cors_allowed_origins: None,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let host = get("SERVER_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = match (get("SERVER_PORT"), get("PORT")) {
            (Some(value), _) => parse("SERVER_PORT", &value)?,
            (None, Some(value)) => parse("PORT", &value)?,
            (None, None) => DEFAULT_PORT,
        };

        let idle_timeout_secs = match get("SESSION_IDLE_TIMEOUT_SECS") {
            Some(value) => parse("SESSION_IDLE_TIMEOUT_SECS", &value)?,
            None => DEFAULT_IDLE_TIMEOUT_SECS,
        };

        let sweep_interval_secs = match get("SESSION_SWEEP_INTERVAL_SECS") {
            Some(value) => parse::<u64>("SESSION_SWEEP_INTERVAL_SECS", &value)?,
            None => DEFAULT_SWEEP_INTERVAL_SECS,
        };
        if sweep_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "SESSION_SWEEP_INTERVAL_SECS",
                value: "0".to_string(),
            });
        }

        Ok(Self {
            host,
            port,
            idle_timeout: Duration::from_secs(idle_timeout_secs),
            sweep_interval: Duration::from_secs(sweep_interval_secs),
            cors_allowed_origins: get("CORS_ALLOWED_ORIGINS"),
        })
    }

    /// Resolve `host:port` to the first address the host maps to.
    pub async fn resolve_addr(&self) -> Result<SocketAddr, ConfigError> {
        let invalid_host = || ConfigError::InvalidValue {
            key: "SERVER_HOST",
            value: self.host.clone(),
        };
        tokio::net::lookup_host((self.host.as_str(), self.port))
            .await
            .map_err(|_| invalid_host())?
            .next()
            .ok_or_else(invalid_host)
    }

    /// Idle threshold as a chrono duration for comparisons against session timestamps.
    pub fn idle_threshold(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.idle_timeout)
            .unwrap_or_else(|_| chrono::Duration::days(365 * 100))
    }
}

fn parse<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
    })
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}
