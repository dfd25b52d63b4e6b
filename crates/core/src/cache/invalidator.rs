use log::{info, warn};
use std::sync::Arc;

use super::keys::CacheKey;
use super::read_through::Generation;
use super::KeyValueCache;

/// Removes cached views affected by a history write.
///
/// Built from [`ReadThroughCache::invalidator`](super::ReadThroughCache::invalidator)
/// so that reads racing an invalidation do not repopulate stale views.
pub struct CacheInvalidator {
    cache: Arc<dyn KeyValueCache>,
    generation: Generation,
}

impl CacheInvalidator {
    pub(crate) fn new(cache: Arc<dyn KeyValueCache>, generation: Generation) -> Self {
        Self { cache, generation }
    }

    /// Deletes every view that can contain `symbol`. Returns the number of
    /// keys that were present. Cache failures are logged and swallowed.
    pub async fn invalidate_entity(&self, symbol: &str, sector: Option<&str>) -> usize {
        let keys: Vec<String> = CacheKey::invalidation_set(symbol, sector)
            .iter()
            .map(ToString::to_string)
            .collect();

        self.generation.bump();
        match self.cache.delete(&keys).await {
            Ok(removed) => removed,
            Err(e) => {
                warn!("Cache invalidation for {} failed: {}", symbol, e);
                0
            }
        }
    }

    pub async fn flush_all(&self) {
        self.generation.bump();
        match self.cache.flush_all().await {
            Ok(()) => info!("Cache flushed"),
            Err(e) => warn!("Cache flush failed: {}", e),
        }
    }
}
