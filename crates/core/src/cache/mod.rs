//! Key-value cache in front of the read path.
//!
//! Keys are structured ([`CacheKey`]) and writes invalidate an explicit key
//! set rather than a wildcard pattern. An unreachable cache degrades to
//! "always miss": cache errors are logged and never fail a read.

mod invalidator;
mod keys;
mod memory;
mod read_through;

use async_trait::async_trait;
use std::time::Duration;

use crate::errors::Result;

pub use invalidator::CacheInvalidator;
pub use keys::{CacheKey, CacheView};
pub use memory::{MemoryCache, NoopCache};
pub use read_through::ReadThroughCache;

/// A string key-value cache with expiry.
#[async_trait]
pub trait KeyValueCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()>;

    /// Deletes the given keys. Returns how many existed.
    async fn delete(&self, keys: &[String]) -> Result<usize>;

    async fn flush_all(&self) -> Result<()>;
}
