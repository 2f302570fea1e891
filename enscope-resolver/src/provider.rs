//! Provider abstraction over the underlying Ethereum JSON-RPC client.
//!
//! The resolver only speaks to the chain through [`EnsProvider`], so tests
//! substitute scripted implementations and production binds `ethers`'
//! `Provider<Http>` to whichever endpoint the pool currently prefers.

use std::sync::Arc;

use async_trait::async_trait;
use ethers::providers::{ens, Http, Middleware, Provider, ProviderError};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::Address;

use enscope_core::error::{EnscopeError, Result};

/// The ENS capability consumed by the resolver.
///
/// `Ok(None)` is genuine non-resolution (no record, no resolver); `Err` is a
/// transport-level failure and is what triggers endpoint rotation.
#[async_trait]
pub trait EnsProvider: Send + Sync {
    /// Forward-resolves a name to an address.
    async fn resolve_name(&self, name: &str) -> Result<Option<Address>>;

    /// Reverse-resolves an address to its primary name.
    async fn lookup_address(&self, address: Address) -> Result<Option<String>>;

    /// Looks up the resolver contract configured for a name, if any.
    async fn resolver_address(&self, name: &str) -> Result<Option<Address>>;

    /// Queries the avatar record for a name.
    async fn avatar(&self, name: &str) -> Result<Option<String>>;

    /// Queries one text record for a name.
    async fn text(&self, name: &str, key: &str) -> Result<Option<String>>;
}

/// Builds a provider handle bound to one endpoint URL.
pub trait ProviderFactory: Send + Sync {
    /// Connects to the given RPC endpoint.
    fn connect(&self, url: &str) -> Result<Arc<dyn EnsProvider>>;
}

/// [`EnsProvider`] backed by `ethers`' HTTP JSON-RPC provider.
///
/// Name hashing and resolver ABI handling are delegated to `ethers`; this
/// wrapper only normalizes its error surface into the
/// `Ok(None)`-vs-`Err` split the failover loop needs.
#[derive(Debug)]
pub struct RpcEnsProvider {
    inner: Provider<Http>,
}

impl RpcEnsProvider {
    /// Connects to an RPC endpoint.
    pub fn connect(url: &str) -> Result<Self> {
        let inner = Provider::<Http>::try_from(url).map_err(|e| EnscopeError::EndpointParse {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self { inner })
    }
}

/// Splits an `ethers` result into resolved / not-found / transport-failed.
///
/// `ethers` signals "name has no record" through its ENS error variants, not
/// through an absent value; those are non-resolution here, everything else is
/// a transport failure.
fn ens_miss_as_none<T>(res: std::result::Result<T, ProviderError>) -> Result<Option<T>> {
    match res {
        Ok(v) => Ok(Some(v)),
        Err(ProviderError::EnsError(_)) | Err(ProviderError::EnsNotOwned(_)) => Ok(None),
        Err(e) => Err(EnscopeError::Provider(e.to_string())),
    }
}

#[async_trait]
impl EnsProvider for RpcEnsProvider {
    async fn resolve_name(&self, name: &str) -> Result<Option<Address>> {
        let resolved = ens_miss_as_none(self.inner.resolve_name(name).await)?;
        Ok(resolved.filter(|addr| !addr.is_zero()))
    }

    async fn lookup_address(&self, address: Address) -> Result<Option<String>> {
        let name = ens_miss_as_none(self.inner.lookup_address(address).await)?;
        Ok(name.filter(|n| !n.is_empty()))
    }

    async fn resolver_address(&self, name: &str) -> Result<Option<Address>> {
        let tx: TypedTransaction = ens::get_resolver(ens::ENS_ADDRESS, name).into();
        let data = self
            .inner
            .call(&tx, None)
            .await
            .map_err(|e| EnscopeError::Provider(e.to_string()))?;
        if data.len() < 32 {
            return Ok(None);
        }
        let resolver = Address::from_slice(&data[12..32]);
        Ok((!resolver.is_zero()).then_some(resolver))
    }

    async fn avatar(&self, name: &str) -> Result<Option<String>> {
        let url = ens_miss_as_none(self.inner.resolve_avatar(name).await)?;
        Ok(url.map(|u| u.to_string()))
    }

    async fn text(&self, name: &str, key: &str) -> Result<Option<String>> {
        let value = ens_miss_as_none(self.inner.resolve_field(name, key).await)?;
        Ok(value.filter(|v| !v.is_empty()))
    }
}

/// Factory producing [`RpcEnsProvider`] handles.
#[derive(Clone, Copy, Debug, Default)]
pub struct HttpProviderFactory;

impl ProviderFactory for HttpProviderFactory {
    fn connect(&self, url: &str) -> Result<Arc<dyn EnsProvider>> {
        Ok(Arc::new(RpcEnsProvider::connect(url)?))
    }
}
