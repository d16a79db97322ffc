use dashmap::DashMap;

use warden_core::PolicyType;

/// Policy name -> stored type.
///
/// Backed by a sharded `DashMap`: each shard sits behind its own `RwLock`, so
/// an `insert` that has returned happens-before any later `get` of the same
/// name from any thread. Lookups never block on writers to other shards.
/// The store only mutates entries while holding its write lock, so there is
/// at most one writer per name at a time.
#[derive(Default)]
pub struct PolicyRegistry {
    types: DashMap<String, PolicyType>,
}

impl PolicyRegistry {
    pub fn new() -> Self {
        Self {
            types: DashMap::new(),
        }
    }

    pub fn insert(&self, name: String, policy_type: PolicyType) {
        self.types.insert(name, policy_type);
    }

    pub fn get(&self, name: &str) -> Option<PolicyType> {
        self.types.get(name).map(|r| *r.value())
    }

    pub fn remove(&self, name: &str) -> Option<PolicyType> {
        self.types.remove(name).map(|(_, t)| t)
    }
}
