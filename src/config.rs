//! Environment configuration for the HTTP façade and CLI server mode.
//!
//! The analysis engine itself takes its three inputs directly
//! (`address`, `rpc_url`, `explorer_key`) and has no configuration of its
//! own; everything here is ambient service wiring.

use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_host: String,
    pub bind_port: u16,
    pub default_rpc_url: String,
    pub default_explorer_key: String,
    pub cache_capacity: usize,
}

impl Config {
    /// Load configuration from environment variables, falling back to
    /// development-friendly defaults for everything but the bind port.
    pub fn from_env() -> Result<Self> {
        let bind_host = std::env::var("BIND_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let bind_port = std::env::var("BIND_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .context("BIND_PORT must be a valid u16")?;
        let default_rpc_url = std::env::var("BASE_RPC_URL")
            .unwrap_or_else(|_| "https://mainnet.base.org".to_string());
        let default_explorer_key = std::env::var("BASESCAN_API_KEY").unwrap_or_default();
        let cache_capacity = std::env::var("CACHE_CAPACITY")
            .unwrap_or_else(|_| crate::cache::MIN_CAPACITY.to_string())
            .parse()
            .context("CACHE_CAPACITY must be a valid usize")?;

        Ok(Self {
            bind_host,
            bind_port,
            default_rpc_url,
            default_explorer_key,
            cache_capacity,
        })
    }
}
