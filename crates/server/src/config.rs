//! Environment-driven configuration.

use std::env;
use std::net::SocketAddr;
use std::time::Duration;

const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
const DEFAULT_STORE_TIMEOUT_MS: u64 = 3000;

#[derive(Debug, thiserror::Error)]
#[error("invalid {name}: {value}")]
pub struct ConfigError {
    name: &'static str,
    value: String,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub redis_url: String,
    pub bind_addr: SocketAddr,
    pub store_timeout: Duration,
}

impl Config {
    /// Reads `REDIS_URL`, `BIND_ADDR` and `STORE_TIMEOUT_MS`, falling back
    /// to local-development defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let redis_url = env::var("REDIS_URL").unwrap_or_else(|_| DEFAULT_REDIS_URL.to_string());

        let bind_raw = env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw.parse().map_err(|_| ConfigError {
            name: "BIND_ADDR",
            value: bind_raw,
        })?;

        let store_timeout = match env::var("STORE_TIMEOUT_MS") {
            Ok(raw) => Duration::from_millis(raw.parse().map_err(|_| ConfigError {
                name: "STORE_TIMEOUT_MS",
                value: raw,
            })?),
            Err(_) => Duration::from_millis(DEFAULT_STORE_TIMEOUT_MS),
        };

        Ok(Self {
            redis_url,
            bind_addr,
            store_timeout,
        })
    }
}
