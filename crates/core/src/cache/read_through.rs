use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::invalidator::CacheInvalidator;
use super::keys::CacheKey;
use super::KeyValueCache;
use crate::errors::Result;

/// Bumped by every invalidation. A load that overlaps a bump must not
/// populate the cache.
#[derive(Debug, Clone, Default)]
pub(crate) struct Generation(Arc<AtomicU64>);

impl Generation {
    pub(crate) fn current(&self) -> u64 {
        self.0.load(Ordering::Acquire)
    }

    pub(crate) fn bump(&self) {
        self.0.fetch_add(1, Ordering::AcqRel);
    }
}

/// Read-through helper: serve from cache, else load and populate.
#[derive(Clone)]
pub struct ReadThroughCache {
    cache: Arc<dyn KeyValueCache>,
    ttl: Duration,
    generation: Generation,
}

impl ReadThroughCache {
    pub fn new(cache: Arc<dyn KeyValueCache>, ttl: Duration) -> Self {
        Self {
            cache,
            ttl,
            generation: Generation::default(),
        }
    }

    /// An invalidator over the same cache whose invalidations discard
    /// loads that were in flight when they ran.
    pub fn invalidator(&self) -> CacheInvalidator {
        CacheInvalidator::new(self.cache.clone(), self.generation.clone())
    }

    pub async fn get_or_load<T, F, Fut>(&self, key: &CacheKey, load: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let rendered = key.to_string();

        match self.cache.get(&rendered).await {
            Ok(Some(raw)) => match serde_json::from_str::<T>(&raw) {
                Ok(value) => {
                    debug!("Cache hit for {}", rendered);
                    return Ok(value);
                }
                Err(e) => warn!("Discarding undecodable cache entry {}: {}", rendered, e),
            },
            Ok(None) => {}
            Err(e) => warn!("Cache read for {} failed, loading from store: {}", rendered, e),
        }

        let generation = self.generation.current();
        let value = load().await?;
        if self.generation.current() != generation {
            debug!("Invalidated while loading {}; not caching", rendered);
            return Ok(value);
        }

        match serde_json::to_string(&value) {
            Ok(raw) => {
                if let Err(e) = self.cache.set(&rendered, raw, self.ttl).await {
                    warn!("Cache write for {} failed: {}", rendered, e);
                }
            }
            Err(e) => warn!("Could not encode {} for caching: {}", rendered, e),
        }

        // An invalidation between the check above and the write may have
        // missed the entry just written.
        if self.generation.current() != generation {
            if let Err(e) = self.cache.delete(&[rendered.clone()]).await {
                warn!("Could not drop stale entry {}: {}", rendered, e);
            }
        }

        Ok(value)
    }
}
