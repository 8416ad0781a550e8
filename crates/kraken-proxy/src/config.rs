//! Proxy configuration
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `KRAKEN_PROXY_HOST` | `0.0.0.0` | Bind address |
//! | `KRAKEN_PROXY_PORT` | `8787` | Bind port |
//! | `KRAKEN_PROXY_TIMEOUT_SECS` | `30` | Upstream request timeout, must be positive |
//! | `KRAKEN_PROXY_USER_AGENT` | `kraken-proxy/0.1.0` | Upstream `User-Agent` |
//! | `KRAKEN_PROXY_ENVIRONMENT` | `https://api.kraken.com` | Origin used when a request names none |

use kraken_types::KRAKEN_API_URL;
use std::time::Duration;
use thiserror::Error;

pub const HOST_VAR: &str = "KRAKEN_PROXY_HOST";
pub const PORT_VAR: &str = "KRAKEN_PROXY_PORT";
pub const TIMEOUT_VAR: &str = "KRAKEN_PROXY_TIMEOUT_SECS";
pub const USER_AGENT_VAR: &str = "KRAKEN_PROXY_USER_AGENT";
pub const ENVIRONMENT_VAR: &str = "KRAKEN_PROXY_ENVIRONMENT";

/// Default upstream request timeout
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_PORT: u16 = 8787;
const DEFAULT_USER_AGENT: &str = concat!("kraken-proxy/", env!("CARGO_PKG_VERSION"));

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value:?}")]
    InvalidValue { var: &'static str, value: String },
}

/// Proxy configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    /// Bind address
    pub host: String,
    /// Bind port
    pub port: u16,
    /// Upstream request timeout in seconds
    pub timeout_secs: u64,
    /// `User-Agent` sent upstream
    pub user_agent: String,
    /// Origin used when a request omits `environment`
    pub default_environment: String,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            default_environment: KRAKEN_API_URL.to_string(),
        }
    }
}

impl ProxyConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through `lookup`, falling back to defaults
    ///
    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(host) = read(HOST_VAR) {
            config.host = host;
        }
        if let Some(port) = read(PORT_VAR) {
            config.port = parse_var(PORT_VAR, &port)?;
        }
        if let Some(timeout) = read(TIMEOUT_VAR) {
            config.timeout_secs = parse_var(TIMEOUT_VAR, &timeout)?;
            if config.timeout_secs == 0 {
                return Err(ConfigError::InvalidValue {
                    var: TIMEOUT_VAR,
                    value: timeout,
                });
            }
        }
        if let Some(user_agent) = read(USER_AGENT_VAR) {
            config.user_agent = user_agent;
        }
        if let Some(environment) = read(ENVIRONMENT_VAR) {
            config.default_environment = environment;
        }

        Ok(config)
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set upstream timeout in seconds
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_default_environment(mut self, environment: impl Into<String>) -> Self {
        self.default_environment = environment.into();
        self
    }

    /// `host:port` to bind
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn parse_var<T: std::str::FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        var,
        value: value.to_string(),
    })
}
