//! ENS resolution with endpoint failover.
//!
//! All public operations share one resilience primitive: try the preferred
//! endpoint, and on transport failure rotate to the next endpoint in the pool
//! and retry, up to the configured attempt budget. Exhaustion and genuine
//! non-resolution both surface as absence; callers never see an error.

use std::future::Future;
use std::sync::Arc;

use ethers::types::Address;
use ethers::utils::to_checksum;
use futures::future::join_all;
use parking_lot::RwLock;
use tracing::{debug, instrument, warn};

use enscope_core::constants::TEXT_RECORD_KEYS;
use enscope_core::error::{EnscopeError, Result};
use enscope_core::types::{EnsProfile, LookupInput, TextRecords};

use crate::cache::{CacheConfig, ProfileCache};
use crate::config::ResolverConfig;
use crate::pool::EndpointPool;
use crate::provider::{EnsProvider, HttpProviderFactory, ProviderFactory};

/// A provider handle together with the pool index it was built for.
struct CachedHandle {
    index: usize,
    provider: Arc<dyn EnsProvider>,
}

/// ENS resolver with automatic endpoint rotation.
///
/// Owns the endpoint pool, the currently cached provider handle, and an
/// optional profile cache. Handles are replaced, never mutated: a handle
/// swapped out while another call is still using it stays valid for that
/// call's remaining attempts.
pub struct EnsResolver {
    pool: EndpointPool,
    factory: Arc<dyn ProviderFactory>,
    handle: RwLock<Option<CachedHandle>>,
    cache: Option<ProfileCache>,
    max_attempts: usize,
}

impl EnsResolver {
    /// Creates a resolver with default configuration.
    pub fn new() -> Self {
        Self::with_config(ResolverConfig::default())
    }

    /// Creates a resolver configured from the environment (`ETH_RPC_URL`).
    pub fn from_env() -> Self {
        Self::with_config(ResolverConfig::from_env())
    }

    /// Creates a resolver with custom configuration.
    pub fn with_config(config: ResolverConfig) -> Self {
        Self::with_factory(config, Arc::new(HttpProviderFactory))
    }

    /// Creates a resolver with a custom provider factory.
    ///
    /// This is the seam for substituting the transport, e.g. a scripted
    /// provider in tests.
    pub fn with_factory(config: ResolverConfig, factory: Arc<dyn ProviderFactory>) -> Self {
        let cache = config.enable_cache.then(|| {
            ProfileCache::with_config(CacheConfig {
                default_ttl_seconds: config.cache_ttl_seconds,
                ..Default::default()
            })
        });
        Self {
            pool: EndpointPool::new(config.endpoints()),
            factory,
            handle: RwLock::new(None),
            cache,
            max_attempts: config.max_attempts.max(1),
        }
    }

    /// The endpoint pool, in priority order.
    pub fn endpoints(&self) -> &[String] {
        self.pool.urls()
    }

    /// The pool index the next call will try first.
    pub fn preferred_endpoint(&self) -> usize {
        self.pool.preferred()
    }

    /// Resolves an ENS name to an address.
    ///
    /// Returns `None` if the name does not resolve or every attempt failed.
    #[instrument(skip(self))]
    pub async fn resolve_name(&self, name: &str) -> Option<Address> {
        let name = normalize_name(name)?;
        self.with_failover("resolve_name", |p| {
            let name = name.clone();
            async move { p.resolve_name(&name).await }
        })
        .await
    }

    /// Reverse-resolves an address to its primary ENS name.
    #[instrument(skip(self))]
    pub async fn lookup_address(&self, address: Address) -> Option<String> {
        self.with_failover("lookup_address", |p| async move {
            p.lookup_address(address).await
        })
        .await
    }

    /// Fetches the avatar URI for a name.
    ///
    /// Two-step: if the name has no resolver configured, returns `None`
    /// without issuing the avatar query at all.
    #[instrument(skip(self))]
    pub async fn get_avatar(&self, name: &str) -> Option<String> {
        let name = normalize_name(name)?;
        self.with_failover("get_avatar", |p| {
            let name = name.clone();
            async move {
                match p.resolver_address(&name).await? {
                    None => Ok(None),
                    Some(_) => p.avatar(&name).await,
                }
            }
        })
        .await
    }

    /// Fetches one text record for a name.
    ///
    /// The whole resolver-then-query sequence runs inside the failover
    /// helper, so a transport failure in either step rotates the endpoint
    /// and retries both.
    #[instrument(skip(self))]
    pub async fn get_text_record(&self, name: &str, key: &str) -> Option<String> {
        let name = normalize_name(name)?;
        self.with_failover("get_text_record", |p| {
            let name = name.clone();
            let key = key.to_string();
            async move {
                match p.resolver_address(&name).await? {
                    None => Ok(None),
                    Some(_) => p.text(&name, &key).await,
                }
            }
        })
        .await
    }

    /// Fetches all well-known text records for a name concurrently.
    ///
    /// Every per-key lookup swallows its own failure into absence, so the
    /// join always settles; the result holds exactly the keys that resolved
    /// to a non-empty value. A fully unresolvable name yields an empty map.
    #[instrument(skip(self))]
    pub async fn get_all_text_records(&self, name: &str) -> TextRecords {
        let lookups = TEXT_RECORD_KEYS.iter().map(|key| async move {
            self.get_text_record(name, key)
                .await
                .filter(|value| !value.is_empty())
                .map(|value| ((*key).to_string(), value))
        });
        join_all(lookups).await.into_iter().flatten().collect()
    }

    /// Resolves a full profile for a name or a `0x…` address.
    ///
    /// For a name, the profile is absent unless the name resolves to an
    /// address. For an address, the profile always carries the address and
    /// fills in name/avatar/records when a primary name exists.
    #[instrument(skip(self))]
    pub async fn resolve_profile(&self, query: &str) -> Option<EnsProfile> {
        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.get(query) {
                debug!(query, "profile cache hit");
                return Some(hit);
            }
        }

        let profile = match LookupInput::parse(query) {
            LookupInput::Name(name) => {
                let address = self.resolve_name(&name).await?;
                let avatar = self.get_avatar(&name).await;
                let records = self.get_all_text_records(&name).await;
                EnsProfile {
                    name: Some(name),
                    address: Some(to_checksum(&address, None)),
                    avatar,
                    records,
                }
            }
            LookupInput::Address(raw) => {
                let address: Address = raw.parse().ok()?;
                let name = self.lookup_address(address).await;
                let (avatar, records) = match name.as_deref() {
                    Some(n) => (self.get_avatar(n).await, self.get_all_text_records(n).await),
                    None => (None, TextRecords::new()),
                };
                EnsProfile {
                    name,
                    address: Some(to_checksum(&address, None)),
                    avatar,
                    records,
                }
            }
        };

        if let Some(cache) = &self.cache {
            cache.set(query, profile.clone());
        }

        Some(profile)
    }

    /// Runs one logical operation with rotation and bounded retry.
    ///
    /// Each attempt rotates locally from the pool's preferred index and only
    /// commits the next-endpoint hint back on failure, so concurrent calls
    /// racing on the hint can at worst pick a suboptimal starting endpoint.
    /// `Ok(None)` from the operation is genuine non-resolution and ends the
    /// call without burning retries.
    async fn with_failover<T, F, Fut>(&self, what: &'static str, op: F) -> Option<T>
    where
        F: Fn(Arc<dyn EnsProvider>) -> Fut,
        Fut: Future<Output = Result<Option<T>>>,
    {
        let start = self.pool.preferred();
        let mut last_err: Option<EnscopeError> = None;

        for attempt in 0..self.max_attempts {
            let index = (start + attempt) % self.pool.len();

            let provider = match self.provider_for(index) {
                Ok(p) => p,
                Err(e) => {
                    warn!(what, endpoint = self.pool.url(index), error = %e, "endpoint unusable");
                    self.pool.advance_from(index);
                    last_err = Some(e);
                    continue;
                }
            };

            match op(provider).await {
                Ok(found) => return found,
                Err(e) => {
                    warn!(
                        what,
                        endpoint = self.pool.url(index),
                        attempt = attempt + 1,
                        recoverable = e.is_recoverable(),
                        error = %e,
                        "attempt failed, rotating endpoint"
                    );
                    self.pool.advance_from(index);
                    self.discard_handle(index);
                    last_err = Some(e);
                }
            }
        }

        if let Some(e) = last_err {
            warn!(what, error = %e, "all attempts exhausted");
        }
        None
    }

    /// Returns the cached handle for `index`, building and caching a new one
    /// if the cache holds a handle for a different endpoint.
    fn provider_for(&self, index: usize) -> Result<Arc<dyn EnsProvider>> {
        {
            let guard = self.handle.read();
            if let Some(h) = guard.as_ref() {
                if h.index == index {
                    return Ok(h.provider.clone());
                }
            }
        }

        let provider = self.factory.connect(self.pool.url(index))?;
        *self.handle.write() = Some(CachedHandle {
            index,
            provider: provider.clone(),
        });
        Ok(provider)
    }

    /// Drops the cached handle if it is still bound to the failed endpoint.
    /// In-flight clones of the handle stay valid.
    fn discard_handle(&self, index: usize) {
        let mut guard = self.handle.write();
        if guard.as_ref().map(|h| h.index) == Some(index) {
            *guard = None;
        }
    }
}

impl Default for EnsResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Trims and lowercases a name; empty input short-circuits to absence.
fn normalize_name(name: &str) -> Option<String> {
    let normalized = name.trim().to_lowercase();
    if normalized.is_empty() {
        return None;
    }
    Some(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use parking_lot::Mutex;

    /// Call counters shared between a factory and every provider it builds.
    #[derive(Default)]
    struct Calls {
        connects: Mutex<Vec<String>>,
        resolve_name: AtomicUsize,
        lookup_address: AtomicUsize,
        resolver_address: AtomicUsize,
        avatar: AtomicUsize,
        text: AtomicUsize,
    }

    /// What a scripted provider answers with.
    #[derive(Clone, Default)]
    struct Behavior {
        fail: bool,
        address: Option<Address>,
        primary_name: Option<String>,
        resolver: Option<Address>,
        avatar: Option<String>,
        texts: HashMap<String, String>,
    }

    impl Behavior {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Default::default()
            }
        }
    }

    struct ScriptedProvider {
        behavior: Behavior,
        calls: Arc<Calls>,
    }

    impl ScriptedProvider {
        fn transport_err(&self) -> EnscopeError {
            EnscopeError::Provider("connection refused".into())
        }
    }

    #[async_trait]
    impl EnsProvider for ScriptedProvider {
        async fn resolve_name(&self, _name: &str) -> Result<Option<Address>> {
            self.calls.resolve_name.fetch_add(1, Ordering::SeqCst);
            if self.behavior.fail {
                return Err(self.transport_err());
            }
            Ok(self.behavior.address)
        }

        async fn lookup_address(&self, _address: Address) -> Result<Option<String>> {
            self.calls.lookup_address.fetch_add(1, Ordering::SeqCst);
            if self.behavior.fail {
                return Err(self.transport_err());
            }
            Ok(self.behavior.primary_name.clone())
        }

        async fn resolver_address(&self, _name: &str) -> Result<Option<Address>> {
            self.calls.resolver_address.fetch_add(1, Ordering::SeqCst);
            if self.behavior.fail {
                return Err(self.transport_err());
            }
            Ok(self.behavior.resolver)
        }

        async fn avatar(&self, _name: &str) -> Result<Option<String>> {
            self.calls.avatar.fetch_add(1, Ordering::SeqCst);
            if self.behavior.fail {
                return Err(self.transport_err());
            }
            Ok(self.behavior.avatar.clone())
        }

        async fn text(&self, _name: &str, key: &str) -> Result<Option<String>> {
            self.calls.text.fetch_add(1, Ordering::SeqCst);
            if self.behavior.fail {
                return Err(self.transport_err());
            }
            Ok(self.behavior.texts.get(key).cloned())
        }
    }

    /// Factory handing out scripted providers per endpoint URL.
    struct ScriptedFactory {
        by_url: HashMap<String, Behavior>,
        default: Behavior,
        calls: Arc<Calls>,
    }

    impl ScriptedFactory {
        fn uniform(behavior: Behavior) -> Self {
            Self {
                by_url: HashMap::new(),
                default: behavior,
                calls: Arc::new(Calls::default()),
            }
        }

        fn per_url(by_url: HashMap<String, Behavior>, default: Behavior) -> Self {
            Self {
                by_url,
                default,
                calls: Arc::new(Calls::default()),
            }
        }
    }

    impl ProviderFactory for ScriptedFactory {
        fn connect(&self, url: &str) -> Result<Arc<dyn EnsProvider>> {
            self.calls.connects.lock().push(url.to_string());
            let behavior = self.by_url.get(url).cloned().unwrap_or_else(|| self.default.clone());
            Ok(Arc::new(ScriptedProvider {
                behavior,
                calls: self.calls.clone(),
            }))
        }
    }

    fn test_urls() -> Vec<String> {
        vec![
            "https://rpc0.example.com".into(),
            "https://rpc1.example.com".into(),
            "https://rpc2.example.com".into(),
        ]
    }

    fn resolver_with(factory: ScriptedFactory) -> (EnsResolver, Arc<Calls>) {
        let calls = factory.calls.clone();
        let config = ResolverConfig {
            primary_rpc_url: None,
            fallback_rpc_urls: test_urls(),
            max_attempts: 3,
            enable_cache: false,
            cache_ttl_seconds: 0,
        };
        (EnsResolver::with_factory(config, Arc::new(factory)), calls)
    }

    fn addr(n: u64) -> Address {
        Address::from_low_u64_be(n)
    }

    #[tokio::test]
    async fn failing_transport_exhausts_exactly_three_attempts() {
        let (resolver, calls) = resolver_with(ScriptedFactory::uniform(Behavior::failing()));

        assert_eq!(resolver.resolve_name("alice.eth").await, None);
        assert_eq!(calls.resolve_name.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn rotation_tries_each_endpoint_once() {
        let (resolver, calls) = resolver_with(ScriptedFactory::uniform(Behavior::failing()));

        resolver.resolve_name("alice.eth").await;
        assert_eq!(*calls.connects.lock(), test_urls());
        // A full cycle of failures lands the hint back on the start.
        assert_eq!(resolver.preferred_endpoint(), 0);
    }

    #[tokio::test]
    async fn failover_succeeds_on_second_endpoint() {
        let mut by_url = HashMap::new();
        by_url.insert(test_urls()[0].clone(), Behavior::failing());
        let healthy = Behavior {
            address: Some(addr(7)),
            ..Default::default()
        };
        let (resolver, calls) = resolver_with(ScriptedFactory::per_url(by_url, healthy));

        assert_eq!(resolver.resolve_name("alice.eth").await, Some(addr(7)));
        assert_eq!(calls.connects.lock().len(), 2);
        // The failed endpoint committed its successor as the new preference.
        assert_eq!(resolver.preferred_endpoint(), 1);
    }

    #[tokio::test]
    async fn genuine_non_resolution_does_not_retry() {
        let (resolver, calls) = resolver_with(ScriptedFactory::uniform(Behavior::default()));

        assert_eq!(resolver.resolve_name("nosuchname.eth").await, None);
        assert_eq!(calls.resolve_name.load(Ordering::SeqCst), 1);
        assert_eq!(resolver.preferred_endpoint(), 0);
    }

    #[tokio::test]
    async fn empty_name_short_circuits_without_transport() {
        let (resolver, calls) = resolver_with(ScriptedFactory::uniform(Behavior::default()));

        assert_eq!(resolver.resolve_name("   ").await, None);
        assert_eq!(calls.resolve_name.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn handle_is_reused_across_calls_on_same_endpoint() {
        let behavior = Behavior {
            address: Some(addr(1)),
            ..Default::default()
        };
        let (resolver, calls) = resolver_with(ScriptedFactory::uniform(behavior));

        resolver.resolve_name("a.eth").await;
        resolver.resolve_name("b.eth").await;
        assert_eq!(calls.connects.lock().len(), 1);
    }

    #[tokio::test]
    async fn avatar_skipped_when_no_resolver_configured() {
        let (resolver, calls) = resolver_with(ScriptedFactory::uniform(Behavior::default()));

        assert_eq!(resolver.get_avatar("alice.eth").await, None);
        assert_eq!(calls.resolver_address.load(Ordering::SeqCst), 1);
        assert_eq!(calls.avatar.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn avatar_returned_when_resolver_exists() {
        let behavior = Behavior {
            resolver: Some(addr(42)),
            avatar: Some("https://example.com/a.png".into()),
            ..Default::default()
        };
        let (resolver, _) = resolver_with(ScriptedFactory::uniform(behavior));

        assert_eq!(
            resolver.get_avatar("alice.eth").await.as_deref(),
            Some("https://example.com/a.png")
        );
    }

    #[tokio::test]
    async fn text_record_retries_whole_two_step_sequence() {
        let mut by_url = HashMap::new();
        by_url.insert(test_urls()[0].clone(), Behavior::failing());
        let mut texts = HashMap::new();
        texts.insert("com.twitter".to_string(), "alice".to_string());
        let healthy = Behavior {
            resolver: Some(addr(42)),
            texts,
            ..Default::default()
        };
        let (resolver, calls) = resolver_with(ScriptedFactory::per_url(by_url, healthy));

        assert_eq!(
            resolver.get_text_record("alice.eth", "com.twitter").await.as_deref(),
            Some("alice")
        );
        // First endpoint failed at the resolver lookup; the retry re-ran both
        // steps against the next endpoint.
        assert_eq!(calls.resolver_address.load(Ordering::SeqCst), 2);
        assert_eq!(calls.text.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn all_text_records_returns_exactly_the_resolvable_subset() {
        let mut texts = HashMap::new();
        texts.insert("com.twitter".to_string(), "alice".to_string());
        texts.insert("url".to_string(), "https://alice.example".to_string());
        let behavior = Behavior {
            resolver: Some(addr(42)),
            texts,
            ..Default::default()
        };
        let (resolver, _) = resolver_with(ScriptedFactory::uniform(behavior));

        let records = resolver.get_all_text_records("alice.eth").await;
        assert_eq!(records.len(), 2);
        assert_eq!(records.get("com.twitter").map(String::as_str), Some("alice"));
        assert_eq!(
            records.get("url").map(String::as_str),
            Some("https://alice.example")
        );
    }

    #[tokio::test]
    async fn all_text_records_drops_empty_values() {
        let mut texts = HashMap::new();
        texts.insert("url".to_string(), "https://alice.example".to_string());
        texts.insert("notice".to_string(), String::new());
        let behavior = Behavior {
            resolver: Some(addr(42)),
            texts,
            ..Default::default()
        };
        let (resolver, _) = resolver_with(ScriptedFactory::uniform(behavior));

        let records = resolver.get_all_text_records("alice.eth").await;
        assert_eq!(records.len(), 1);
        assert!(!records.contains_key("notice"));
        assert!(records.contains_key("url"));
    }

    #[tokio::test]
    async fn all_text_records_empty_for_dead_name() {
        let (resolver, _) = resolver_with(ScriptedFactory::uniform(Behavior::failing()));

        let records = resolver.get_all_text_records("dead.eth").await;
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn profile_by_name_aggregates_everything() {
        let mut texts = HashMap::new();
        texts.insert("email".to_string(), "alice@example.com".to_string());
        let behavior = Behavior {
            address: Some(addr(7)),
            resolver: Some(addr(42)),
            avatar: Some("ipfs://avatar".into()),
            texts,
            ..Default::default()
        };
        let (resolver, _) = resolver_with(ScriptedFactory::uniform(behavior));

        let profile = resolver.resolve_profile("Alice.ETH").await.unwrap();
        assert_eq!(profile.name.as_deref(), Some("alice.eth"));
        assert_eq!(
            profile.address.as_deref(),
            Some(to_checksum(&addr(7), None).as_str())
        );
        assert_eq!(profile.avatar.as_deref(), Some("ipfs://avatar"));
        assert_eq!(profile.records.len(), 1);
    }

    #[tokio::test]
    async fn profile_by_address_without_reverse_record_keeps_address() {
        let behavior = Behavior {
            address: Some(addr(7)),
            ..Default::default()
        };
        let (resolver, calls) = resolver_with(ScriptedFactory::uniform(behavior));

        let query = format!("{:?}", addr(7));
        let profile = resolver.resolve_profile(&query).await.unwrap();
        assert!(profile.name.is_none());
        assert_eq!(profile.address.as_deref(), Some(to_checksum(&addr(7), None).as_str()));
        assert!(profile.records.is_empty());
        // No primary name, so no avatar/text lookups were attempted.
        assert_eq!(calls.resolver_address.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn profile_for_unresolvable_name_is_absent() {
        let (resolver, _) = resolver_with(ScriptedFactory::uniform(Behavior::default()));

        assert_eq!(resolver.resolve_profile("ghost.eth").await, None);
    }

    #[tokio::test]
    async fn profile_cache_serves_repeat_lookups() {
        let behavior = Behavior {
            address: Some(addr(7)),
            ..Default::default()
        };
        let factory = ScriptedFactory::uniform(behavior);
        let calls = factory.calls.clone();
        let config = ResolverConfig {
            primary_rpc_url: None,
            fallback_rpc_urls: test_urls(),
            max_attempts: 3,
            enable_cache: true,
            cache_ttl_seconds: 3600,
        };
        let resolver = EnsResolver::with_factory(config, Arc::new(factory));

        resolver.resolve_profile("alice.eth").await.unwrap();
        let first = calls.resolve_name.load(Ordering::SeqCst);
        resolver.resolve_profile("alice.eth").await.unwrap();
        assert_eq!(calls.resolve_name.load(Ordering::SeqCst), first);
    }

    #[tokio::test]
    async fn configured_cache_ttl_expires_entries() {
        let behavior = Behavior {
            address: Some(addr(7)),
            ..Default::default()
        };
        let factory = ScriptedFactory::uniform(behavior);
        let calls = factory.calls.clone();
        let config = ResolverConfig {
            primary_rpc_url: None,
            fallback_rpc_urls: test_urls(),
            max_attempts: 3,
            enable_cache: true,
            cache_ttl_seconds: 0,
        };
        let resolver = EnsResolver::with_factory(config, Arc::new(factory));

        resolver.resolve_profile("alice.eth").await.unwrap();
        let first = calls.resolve_name.load(Ordering::SeqCst);

        std::thread::sleep(std::time::Duration::from_millis(5));
        resolver.resolve_profile("alice.eth").await.unwrap();
        assert!(calls.resolve_name.load(Ordering::SeqCst) > first);
    }
}
