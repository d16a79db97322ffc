//! Bounded 2Q cache (recent / frequent / ghost).
//!
//! - `recent`: entries seen once; capped at a quarter of capacity when the
//!   cache is full, so a burst of one-off reads only churns this segment.
//! - `frequent`: entries hit again while in `recent`, or re-added shortly after
//!   being evicted from it.
//! - `ghost`: keys (no values) recently evicted from `recent`, half of capacity.
//!
//! Enumerating many cold policies therefore cannot flush the hot ones, which a
//! plain LRU would do.

use std::sync::{Arc, Mutex};

use lru::LruCache;
use warden_core::Policy;

use super::PolicyCache;

struct Queues {
    size: usize,
    recent_size: usize,
    ghost_size: usize,
    recent: LruCache<String, Arc<Policy>>,
    frequent: LruCache<String, Arc<Policy>>,
    ghost: LruCache<String, ()>,
}

impl Queues {
    fn get(&mut self, key: &str) -> Option<Arc<Policy>> {
        if let Some(p) = self.frequent.get(key) {
            return Some(Arc::clone(p));
        }
        // Second hit: promote.
        let p = self.recent.pop(key)?;
        self.frequent.push(key.to_string(), Arc::clone(&p));
        Some(p)
    }

    fn add(&mut self, key: &str, policy: Arc<Policy>) {
        if self.frequent.contains(key) {
            self.frequent.push(key.to_string(), policy);
            return;
        }
        if self.recent.pop(key).is_some() {
            self.frequent.push(key.to_string(), policy);
            return;
        }
        if self.ghost.pop(key).is_some() {
            self.ensure_space(true);
            self.frequent.push(key.to_string(), policy);
            return;
        }
        self.ensure_space(false);
        self.recent.push(key.to_string(), policy);
    }

    fn remove(&mut self, key: &str) {
        self.frequent.pop(key);
        self.recent.pop(key);
        self.ghost.pop(key);
    }

    fn ensure_space(&mut self, readmitting_ghost: bool) {
        if self.recent.len() + self.frequent.len() < self.size {
            return;
        }

        let recent = self.recent.len();
        if recent > 0
            && (recent > self.recent_size || (recent == self.recent_size && !readmitting_ghost))
        {
            self.evict_recent();
            return;
        }

        if self.frequent.pop_lru().is_none() {
            self.evict_recent();
        }
    }

    fn evict_recent(&mut self) {
        if let Some((key, _)) = self.recent.pop_lru() {
            self.ghost.push(key, ());
            while self.ghost.len() > self.ghost_size {
                self.ghost.pop_lru();
            }
        }
    }
}

/// Thread-safe 2Q policy cache.
pub struct TwoQueueCache {
    inner: Mutex<Queues>,
}

impl TwoQueueCache {
    pub fn new(capacity: usize) -> Self {
        let size = capacity.max(1);
        Self {
            inner: Mutex::new(Queues {
                size,
                recent_size: size / 4,
                ghost_size: size / 2,
                recent: LruCache::unbounded(),
                frequent: LruCache::unbounded(),
                ghost: LruCache::unbounded(),
            }),
        }
    }

    /// Number of cached policies (recent + frequent).
    #[cfg(test)]
    fn len(&self) -> usize {
        match self.inner.lock() {
            Ok(q) => q.recent.len() + q.frequent.len(),
            Err(_) => 0,
        }
    }

    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// Poisoned mutex means a logic bug in another thread; degrade to a cache
// miss / no-op instead of panicking on the request path.
impl PolicyCache for TwoQueueCache {
    fn get(&self, name: &str) -> Option<Arc<Policy>> {
        self.inner.lock().ok()?.get(name)
    }

    fn add(&self, name: &str, policy: Arc<Policy>) {
        if let Ok(mut q) = self.inner.lock() {
            q.add(name, policy);
        }
    }

    fn remove(&self, name: &str) {
        if let Ok(mut q) = self.inner.lock() {
            q.remove(name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(name: &str) -> Arc<Policy> {
        Arc::new(Policy::parse("").unwrap().with_name(name))
    }

    #[test]
    fn bounded() {
        let cache = TwoQueueCache::new(4);
        for i in 0..10 {
            let name = format!("p{i}");
            cache.add(&name, p(&name));
        }
        assert_eq!(cache.len(), 4);
        assert!(cache.get("p9").is_some());
        assert!(cache.get("p0").is_none());
    }

    #[test]
    fn hot_entries_survive_a_cold_scan() {
        let cache = TwoQueueCache::new(8);
        cache.add("hot1", p("hot1"));
        cache.add("hot2", p("hot2"));
        assert!(cache.get("hot1").is_some());
        assert!(cache.get("hot2").is_some());

        for i in 0..50 {
            let name = format!("cold{i}");
            cache.add(&name, p(&name));
        }

        assert!(cache.get("hot1").is_some());
        assert!(cache.get("hot2").is_some());
        assert_eq!(cache.len(), 8);
    }

    #[test]
    fn ghost_hit_is_admitted_as_frequent() {
        let cache = TwoQueueCache::new(4);
        for name in ["a", "b", "c", "d", "e"] {
            cache.add(name, p(name));
        }
        // `a` was evicted from recent into the ghost list.
        assert!(cache.get("a").is_none());
        cache.add("a", p("a"));

        for name in ["f", "g", "h", "i"] {
            cache.add(name, p(name));
        }
        assert!(cache.get("a").is_some());
    }

    #[test]
    fn add_replaces_and_remove_purges() {
        let cache = TwoQueueCache::new(4);
        cache.add("x", p("old"));
        cache.add("x", p("new"));
        assert_eq!(cache.get("x").unwrap().name(), "new");
        cache.remove("x");
        assert!(cache.get("x").is_none());
        assert!(cache.is_empty());
    }
}
