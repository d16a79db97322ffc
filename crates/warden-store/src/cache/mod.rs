//! Compiled-policy cache.
//!
//! The store only talks to `PolicyCache`; disabling caching swaps in
//! `NoopCache` so call sites never branch on "is there a cache".

pub mod two_queue;

use std::sync::Arc;

use warden_core::Policy;

pub use two_queue::TwoQueueCache;

/// Default number of compiled policies kept in memory.
pub const DEFAULT_CACHE_CAPACITY: usize = 1024;

/// Name-keyed policy cache. Implementations must be safe for concurrent
/// get/add/remove without external locking.
pub trait PolicyCache: Send + Sync {
    fn get(&self, name: &str) -> Option<Arc<Policy>>;
    fn add(&self, name: &str, policy: Arc<Policy>);
    fn remove(&self, name: &str);
}

/// Always misses, never stores. For deployments that require fresh reads.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCache;

impl PolicyCache for NoopCache {
    fn get(&self, _name: &str) -> Option<Arc<Policy>> {
        None
    }

    fn add(&self, _name: &str, _policy: Arc<Policy>) {}

    fn remove(&self, _name: &str) {}
}

/// Build the cache selected by configuration.
pub fn build(enabled: bool, capacity: usize) -> Arc<dyn PolicyCache> {
    if enabled {
        Arc::new(TwoQueueCache::new(capacity))
    } else {
        Arc::new(NoopCache)
    }
}
