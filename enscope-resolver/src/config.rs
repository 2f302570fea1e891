//! Resolver configuration.

use serde::{Deserialize, Serialize};

use enscope_core::constants::{FALLBACK_RPC_URLS, MAX_RPC_ATTEMPTS, RPC_URL_ENV};

/// Resolver configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Preferred primary RPC endpoint, tried before the fallbacks.
    pub primary_rpc_url: Option<String>,
    /// Fallback RPC endpoints, in priority order. Never empty.
    pub fallback_rpc_urls: Vec<String>,
    /// Maximum attempts per logical resolution call.
    pub max_attempts: usize,
    /// Whether resolved profiles are cached.
    pub enable_cache: bool,
    /// Profile cache TTL in seconds.
    pub cache_ttl_seconds: u64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            primary_rpc_url: None,
            fallback_rpc_urls: FALLBACK_RPC_URLS.iter().map(|s| (*s).to_string()).collect(),
            max_attempts: MAX_RPC_ATTEMPTS,
            enable_cache: true,
            cache_ttl_seconds: 3600,
        }
    }
}

impl ResolverConfig {
    /// Creates a configuration with the given primary RPC URL.
    pub fn with_rpc(rpc_url: impl Into<String>) -> Self {
        Self {
            primary_rpc_url: Some(rpc_url.into()),
            ..Default::default()
        }
    }

    /// Creates a configuration from the environment.
    ///
    /// Reads `ETH_RPC_URL` for the optional primary endpoint; blank values
    /// are treated as unset.
    pub fn from_env() -> Self {
        let primary = std::env::var(RPC_URL_ENV)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
        Self {
            primary_rpc_url: primary,
            ..Default::default()
        }
    }

    /// Disables profile caching.
    pub fn no_cache(mut self) -> Self {
        self.enable_cache = false;
        self
    }

    /// The full endpoint list: primary first (if set), then the fallbacks.
    ///
    /// Guaranteed non-empty: the fallback defaults are restored if the
    /// configured fallback list was emptied.
    pub fn endpoints(&self) -> Vec<String> {
        let mut urls: Vec<String> = self.primary_rpc_url.iter().cloned().collect();
        urls.extend(self.fallback_rpc_urls.iter().cloned());
        if urls.is_empty() {
            urls = FALLBACK_RPC_URLS.iter().map(|s| (*s).to_string()).collect();
        }
        urls
    }
}
