use std::env;
use std::net::SocketAddr;

use anyhow::{Context, Result};
use folio_core::FetchConfig;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

/// Service configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub fetch: FetchConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)), fetch: FetchConfig::default() }
    }
}

impl ServerConfig {
    /// Load configuration from the process environment.
    ///
    /// - `FOLIO_BIND_ADDR`: listen address, default `127.0.0.1:3000`
    /// - `FOLIO_FETCH_TIMEOUT_SECS`: upstream fetch timeout, default 30
    /// - `FOLIO_USER_AGENT`: User-Agent sent upstream
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(addr) = lookup("FOLIO_BIND_ADDR") {
            config.bind_addr = addr.parse().with_context(|| format!("FOLIO_BIND_ADDR is not a socket address: {addr}"))?;
        }

        if let Some(secs) = lookup("FOLIO_FETCH_TIMEOUT_SECS") {
            config.fetch.timeout =
                secs.parse().with_context(|| format!("FOLIO_FETCH_TIMEOUT_SECS must be a whole number: {secs}"))?;
        }

        if let Some(user_agent) = lookup("FOLIO_USER_AGENT")
            && !user_agent.trim().is_empty()
        {
            config.fetch.user_agent = user_agent;
        }

        Ok(config)
    }
}
