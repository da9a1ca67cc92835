use crate::utils::constants::{MULTICALL3, POLYGON_CHAIN_ID};
use alloy_primitives::Address;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_RPC_URL: &str = "https://polygon-rpc.com";

/// Configuration for the chain data layer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    /// HTTP RPC URL used for eth_call and gas reads
    pub rpc_http_url: String,
    /// Multicall3 contract address
    pub multicall_address: Address,
    pub chain_id: u64,
    /// Maximum number of calls packed into a single aggregate3 request
    pub max_calls_per_batch: usize,
    /// Maximum number of aggregate3 requests in flight at once
    pub max_inflight_batches: usize,
    /// Timeout for HTTP requests in seconds
    pub http_timeout_secs: u64,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            rpc_http_url: DEFAULT_RPC_URL.to_string(),
            multicall_address: MULTICALL3,
            chain_id: POLYGON_CHAIN_ID,
            max_calls_per_batch: 1024,
            max_inflight_batches: 4,
            http_timeout_secs: 10,
        }
    }
}

/// Accept either a full URL or a bare Alchemy key.
pub fn normalize_rpc_url(raw: &str) -> Option<String> {
    let value = raw.trim();
    if value.is_empty() {
        None
    } else if value.starts_with("http://") || value.starts_with("https://") {
        Some(value.to_string())
    } else {
        Some(format!("https://polygon-mainnet.g.alchemy.com/v2/{value}"))
    }
}

impl ChainConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> eyre::Result<Self> {
        let mut config = Self::default();

        let rpc = ["RPC_HTTP_URL", "ALCHEMY_POLYGON_URL", "ALCHEMY_KEY"]
            .iter()
            .find_map(|name| std::env::var(name).ok().and_then(|raw| normalize_rpc_url(&raw)));
        if let Some(rpc_http_url) = rpc {
            let _url = Url::parse(&rpc_http_url).map_err(|e| eyre::eyre!("Invalid RPC_HTTP_URL: {}", e))?;
            config.rpc_http_url = rpc_http_url;
        }

        if let Ok(multicall_address) = std::env::var("MULTICALL_ADDRESS") {
            config.multicall_address =
                multicall_address.trim().parse().map_err(|e| eyre::eyre!("Invalid MULTICALL_ADDRESS: {}", e))?;
        }

        if let Ok(chain_id_str) = std::env::var("CHAIN_ID") {
            config.chain_id = chain_id_str.parse().map_err(|e| eyre::eyre!("Invalid CHAIN_ID: {}", e))?;
        }

        if let Ok(batch_str) = std::env::var("MAX_CALLS_PER_BATCH") {
            config.max_calls_per_batch = batch_str.parse().map_err(|e| eyre::eyre!("Invalid MAX_CALLS_PER_BATCH: {}", e))?;
        }

        if let Ok(inflight_str) = std::env::var("MAX_INFLIGHT_BATCHES") {
            config.max_inflight_batches =
                inflight_str.parse().map_err(|e| eyre::eyre!("Invalid MAX_INFLIGHT_BATCHES: {}", e))?;
        }

        if let Ok(timeout_str) = std::env::var("HTTP_TIMEOUT_SECS") {
            config.http_timeout_secs = timeout_str.parse().map_err(|e| eyre::eyre!("Invalid HTTP_TIMEOUT_SECS: {}", e))?;
        }

        Ok(config)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}
