//! RPC endpoint configuration
//!
//! Resolution order, following Ethereum ecosystem conventions:
//! 1. LEDGER_RPC_URL - explicit endpoint for this tool
//! 2. ETH_RPC_URL - the usual foundry/cast variable
//! 3. ALCHEMY_API_KEY / INFURA_API_KEY - builds a Sepolia URL
//! 4. Local dev node (anvil, hardhat) at 127.0.0.1:8545
//!
//! # Examples
//!
//! ```bash
//! # Testnet through a provider key
//! export ALCHEMY_API_KEY="YOUR_KEY"
//!
//! # Any node
//! export LEDGER_RPC_URL="http://10.0.0.5:8545"
//! ```

use crate::{Error, Result};
use serde::Serialize;

/// Environment variable names
mod env_vars {
    pub const LEDGER_RPC_URL: &str = "LEDGER_RPC_URL";
    pub const ETH_RPC_URL: &str = "ETH_RPC_URL";

    // Provider API keys
    pub const ALCHEMY_API_KEY: &str = "ALCHEMY_API_KEY";
    pub const INFURA_API_KEY: &str = "INFURA_API_KEY";
}

/// Default endpoint of anvil and the hardhat node
pub const LOCAL_DEV_RPC: &str = "http://127.0.0.1:8545";

/// Where the RPC URL came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RpcSource {
    LedgerRpcUrl,
    EthRpcUrl,
    Alchemy,
    Infura,
    LocalDevNode,
    Explicit,
}

/// Resolved RPC endpoint
#[derive(Debug, Clone, Serialize)]
pub struct RpcConfig {
    url: String,
    source: RpcSource,
}

impl RpcConfig {
    /// Resolve the endpoint from the process environment
    pub fn from_env() -> Self {
        Self::resolve(|name| std::env::var(name).ok())
    }

    /// Resolve the endpoint from an arbitrary variable lookup
    pub fn resolve(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(url) = var(env_vars::LEDGER_RPC_URL) {
            tracing::debug!("Using LEDGER_RPC_URL");
            return Self::new(url, RpcSource::LedgerRpcUrl);
        }
        if let Some(url) = var(env_vars::ETH_RPC_URL) {
            tracing::debug!("Using ETH_RPC_URL");
            return Self::new(url, RpcSource::EthRpcUrl);
        }
        if let Some(key) = var(env_vars::ALCHEMY_API_KEY) {
            tracing::info!("Building Sepolia RPC URL from ALCHEMY_API_KEY");
            return Self::new(
                format!("https://eth-sepolia.g.alchemy.com/v2/{}", key),
                RpcSource::Alchemy,
            );
        }
        if let Some(key) = var(env_vars::INFURA_API_KEY) {
            tracing::info!("Building Sepolia RPC URL from INFURA_API_KEY");
            return Self::new(
                format!("https://sepolia.infura.io/v3/{}", key),
                RpcSource::Infura,
            );
        }

        tracing::warn!(url = LOCAL_DEV_RPC, "No RPC configured, using local dev node");
        Self::new(LOCAL_DEV_RPC.to_string(), RpcSource::LocalDevNode)
    }

    /// Create with an explicit URL
    pub fn with_url(url: impl Into<String>) -> Self {
        Self::new(url.into(), RpcSource::Explicit)
    }

    fn new(url: String, source: RpcSource) -> Self {
        Self { url, source }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn source(&self) -> RpcSource {
        self.source
    }

    /// Parse the URL for alloy's HTTP transport
    pub fn parsed_url(&self) -> Result<url::Url> {
        self.url
            .parse()
            .map_err(|e| Error::Config(format!("Invalid RPC URL {}: {}", self.redacted(), e)))
    }

    /// URL safe to log: provider keys in the path are masked
    ///
    /// The last path segment and any password of a non-local URL are
    /// replaced with `***`.
    pub fn redacted(&self) -> String {
        if self.source == RpcSource::LocalDevNode {
            return self.url.clone();
        }
        let Ok(mut url) = url::Url::parse(&self.url) else {
            return "***".to_string();
        };

        let mut masked = false;
        if url.password().is_some() {
            masked |= url.set_password(Some("***")).is_ok();
        }
        let has_key = url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .is_some_and(|last| !last.is_empty());
        if has_key {
            if let Ok(mut segments) = url.path_segments_mut() {
                segments.pop().push("***");
                masked = true;
            }
        }

        if masked {
            url.to_string()
        } else {
            self.url.clone()
        }
    }
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self::from_env()
    }
}
