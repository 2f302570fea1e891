//! # enscope Resolver
//!
//! ENS resolution client with automatic RPC endpoint rotation and bounded
//! retry. Forward and reverse resolution, avatar lookup, and concurrent text
//! record aggregation, all degrading to absence instead of surfacing
//! transport errors.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod cache;
mod config;
mod pool;
mod provider;
mod resolver;

pub use cache::{CacheConfig, ProfileCache};
pub use config::ResolverConfig;
pub use pool::EndpointPool;
pub use provider::{EnsProvider, HttpProviderFactory, ProviderFactory, RpcEnsProvider};
pub use resolver::EnsResolver;
