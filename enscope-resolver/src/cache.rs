//! Local caching for recently resolved profiles.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use enscope_core::types::EnsProfile;

/// Cache entry with TTL.
#[derive(Clone)]
struct CacheEntry {
    profile: EnsProfile,
    inserted_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn is_expired(&self) -> bool {
        self.inserted_at.elapsed() > self.ttl
    }
}

/// Cache configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of entries
    pub max_entries: usize,
    /// Default TTL in seconds
    pub default_ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 1000,
            default_ttl_seconds: 3600, // 1 hour
        }
    }
}

/// In-memory cache for resolved profiles.
///
/// Thread-safe and supports TTL-based expiration. Keys are the normalized
/// lookup query (name or address).
pub struct ProfileCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    config: CacheConfig,
}

impl ProfileCache {
    /// Creates a new cache with default configuration.
    pub fn new() -> Self {
        Self::with_config(CacheConfig::default())
    }

    /// Creates a cache with custom configuration.
    pub fn with_config(config: CacheConfig) -> Self {
        Self {
            entries: RwLock::new(HashMap::with_capacity(config.max_entries)),
            config,
        }
    }

    /// Gets a cached profile by query.
    ///
    /// Returns None if not cached or expired.
    pub fn get(&self, query: &str) -> Option<EnsProfile> {
        let normalized = query.trim().to_lowercase();

        let entries = self.entries.read();

        if let Some(entry) = entries.get(&normalized) {
            if !entry.is_expired() {
                return Some(entry.profile.clone());
            }
        }

        None
    }

    /// Caches a profile with the default TTL.
    pub fn set(&self, query: &str, profile: EnsProfile) {
        self.set_with_ttl(
            query,
            profile,
            Duration::from_secs(self.config.default_ttl_seconds),
        );
    }

    /// Caches a profile with a custom TTL.
    pub fn set_with_ttl(&self, query: &str, profile: EnsProfile, ttl: Duration) {
        let normalized = query.trim().to_lowercase();

        let mut entries = self.entries.write();

        // Drop expired entries before evicting live ones.
        if entries.len() >= self.config.max_entries {
            entries.retain(|_, e| !e.is_expired());
        }

        // Still at capacity? Remove oldest entry
        if entries.len() >= self.config.max_entries {
            if let Some(oldest_key) = entries
                .iter()
                .min_by_key(|(_, e)| e.inserted_at)
                .map(|(k, _)| k.clone())
            {
                entries.remove(&oldest_key);
            }
        }

        entries.insert(
            normalized,
            CacheEntry {
                profile,
                inserted_at: Instant::now(),
                ttl,
            },
        );
    }

    /// Removes a cached entry.
    pub fn remove(&self, query: &str) {
        let normalized = query.trim().to_lowercase();
        self.entries.write().remove(&normalized);
    }

    /// Clears all entries.
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Number of entries currently held (including expired ones not yet
    /// cleaned up).
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl Default for ProfileCache {
    fn default() -> Self {
        Self::new()
    }
}
