//! Endpoint pool with a shared preferred-endpoint hint.

use std::sync::atomic::{AtomicUsize, Ordering};

use enscope_core::constants::FALLBACK_RPC_URLS;

/// Ordered, non-empty pool of RPC endpoint URLs.
///
/// The URL list is immutable after construction. The only mutable state is
/// the preferred-endpoint hint: each logical call rotates locally against the
/// immutable list and commits "the endpoint after the one that failed" back
/// here, so concurrent calls racing on the hint affect only which endpoint
/// the next call tries first, never correctness.
pub struct EndpointPool {
    urls: Vec<String>,
    hint: AtomicUsize,
}

impl EndpointPool {
    /// Builds a pool from an ordered URL list.
    ///
    /// An empty list is replaced by the public fallback defaults so the pool
    /// is never empty.
    pub fn new(urls: Vec<String>) -> Self {
        let urls = if urls.is_empty() {
            FALLBACK_RPC_URLS.iter().map(|s| (*s).to_string()).collect()
        } else {
            urls
        };
        Self {
            urls,
            hint: AtomicUsize::new(0),
        }
    }

    /// Number of endpoints in the pool.
    pub fn len(&self) -> usize {
        self.urls.len()
    }

    /// Always false: construction guarantees at least one endpoint.
    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    /// The endpoint URL at the given position (wrapped modulo pool size).
    pub fn url(&self, index: usize) -> &str {
        &self.urls[index % self.urls.len()]
    }

    /// The currently preferred endpoint index.
    pub fn preferred(&self) -> usize {
        self.hint.load(Ordering::Relaxed) % self.urls.len()
    }

    /// Commits the endpoint after `failed` as the new preferred hint.
    pub fn advance_from(&self, failed: usize) {
        self.hint
            .store((failed + 1) % self.urls.len(), Ordering::Relaxed);
    }

    /// All endpoint URLs, in priority order.
    pub fn urls(&self) -> &[String] {
        &self.urls
    }
}
