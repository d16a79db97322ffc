//! Policy repository: durable storage + type registry + compiled-policy cache.
//!
//! # Locking
//! `modify_lock` serializes every mutation and every cache-miss load. A miss
//! re-checks the cache after acquiring the lock, so N tasks missing on the
//! same name at once produce one storage read and one parse; the rest find
//! the freshly cached policy. Cache hits never touch the lock.
//!
//! The registry and cache are only updated after storage has accepted the
//! change, so a failed write or delete leaves both exactly as they were.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use warden_core::error::{Result, StorageError, WardenError};
use warden_core::policy::builtin::{self, DEFAULT_POLICY_NAME, ROOT_POLICY_NAME};
use warden_core::{Acl, Policy, PolicyType};

use crate::cache::{self, PolicyCache};
use crate::config::{StorageKind, StoreConfig};
use crate::registry::PolicyRegistry;
use crate::storage::{FileStorage, MemoryStorage, PolicyStorage};

/// Current on-disk record version.
const ENTRY_VERSION: u32 = 2;

/// How `get_policy` decides which type to load a name as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyLookup {
    /// Use the type recorded in the registry; unknown names resolve to `None`.
    ByName,
    /// Load as the given type regardless of the registry.
    Exact(PolicyType),
}

impl From<PolicyType> for PolicyLookup {
    fn from(t: PolicyType) -> Self {
        PolicyLookup::Exact(t)
    }
}

/// Persisted record: `{"version":2,"raw":"...","type":"acl"}`.
#[derive(Debug, Serialize, Deserialize)]
struct PolicyEntry {
    version: u32,
    raw: String,
    #[serde(rename = "type")]
    policy_type: PolicyType,
}

/// Names arrive from URLs and storage keys; both may carry a leading `/`.
fn sanitize_name(name: &str) -> String {
    name.trim_start_matches('/').trim().to_lowercase()
}

fn unsupported(policy_type: PolicyType) -> WardenError {
    WardenError::UnknownType(policy_type.to_string())
}

pub struct PolicyStore {
    storage: Arc<dyn PolicyStorage>,
    cache: Arc<dyn PolicyCache>,
    registry: PolicyRegistry,
    modify_lock: Mutex<()>,
}

impl PolicyStore {
    /// Build a store over `storage`, seeding the registry from its keys.
    pub async fn new(storage: Arc<dyn PolicyStorage>, cache: Arc<dyn PolicyCache>) -> Result<Self> {
        let keys = storage
            .list()
            .await
            .map_err(|e| WardenError::storage("failed to list policies", e))?;

        let registry = PolicyRegistry::new();
        for key in &keys {
            registry.insert(sanitize_name(key), PolicyType::Acl);
        }
        registry.insert(ROOT_POLICY_NAME.to_string(), PolicyType::Acl);

        tracing::debug!(policies = keys.len(), "policy registry loaded");

        Ok(Self {
            storage,
            cache,
            registry,
            modify_lock: Mutex::new(()),
        })
    }

    /// Build storage and cache from configuration.
    pub async fn open(cfg: &StoreConfig) -> Result<Self> {
        let storage: Arc<dyn PolicyStorage> = match cfg.storage.kind {
            StorageKind::Memory => Arc::new(MemoryStorage::new()),
            StorageKind::File => {
                let path = cfg.storage.path.as_deref().ok_or_else(|| {
                    WardenError::Config("storage.path is required when storage.kind is file".into())
                })?;
                let fs = FileStorage::open(path)
                    .await
                    .map_err(|e| WardenError::storage("failed to open policy directory", e))?;
                Arc::new(fs)
            }
        };
        let cache = cache::build(cfg.cache.enabled, cfg.cache.capacity);

        tracing::info!(
            storage = ?cfg.storage.kind,
            cache_enabled = cfg.cache.enabled,
            cache_capacity = cfg.cache.capacity,
            "opening policy store"
        );
        Self::new(storage, cache).await
    }

    /// Create or replace a policy. Built-in immutable names are rejected.
    pub async fn set_policy(&self, policy: Policy) -> Result<()> {
        let name = sanitize_name(policy.name());
        if name.is_empty() {
            return Err(WardenError::Validation("policy name missing".into()));
        }
        if builtin::is_immutable(&name) {
            tracing::warn!(name = %name, "rejected write to immutable policy");
            return Err(WardenError::Immutable { name, action: "update" });
        }
        self.set_policy_internal(policy.with_name(name)).await
    }

    /// Write path shared with bootstrap; skips the immutability check.
    pub(crate) async fn set_policy_internal(&self, policy: Policy) -> Result<()> {
        let _guard = self.modify_lock.lock().await;

        let policy_type = policy.policy_type();
        match policy_type {
            PolicyType::Acl => {}
            PolicyType::Rgp | PolicyType::Egp => return Err(unsupported(policy_type)),
        }

        let entry = PolicyEntry {
            version: ENTRY_VERSION,
            raw: policy.raw().to_string(),
            policy_type,
        };
        let bytes = serde_json::to_vec(&entry).map_err(|e| {
            WardenError::storage("failed to encode policy", StorageError::Backend(e.to_string()))
        })?;

        self.storage
            .put(policy.name(), bytes)
            .await
            .map_err(|e| WardenError::storage("failed to persist policy", e))?;

        let name = policy.name().to_string();
        self.registry.insert(name.clone(), policy_type);
        self.cache.add(&name, Arc::new(policy));

        tracing::debug!(name = %name, "policy stored");
        Ok(())
    }

    /// Fetch a policy, loading and caching it on a miss.
    pub async fn get_policy(&self, name: &str, lookup: PolicyLookup) -> Result<Option<Arc<Policy>>> {
        let name = sanitize_name(name);

        let policy_type = match lookup {
            PolicyLookup::ByName => match self.registry.get(&name) {
                Some(t) => t,
                None => return Ok(None),
            },
            PolicyLookup::Exact(t) => t,
        };
        match policy_type {
            PolicyType::Acl => {}
            PolicyType::Rgp | PolicyType::Egp => return Err(unsupported(policy_type)),
        }

        if let Some(p) = self.cache.get(&name) {
            return Ok(Some(p));
        }

        if name == ROOT_POLICY_NAME {
            let p = Arc::new(Policy::root());
            self.cache.add(&name, Arc::clone(&p));
            return Ok(Some(p));
        }

        let _guard = self.modify_lock.lock().await;

        // Another task may have loaded it while we waited.
        if let Some(p) = self.cache.get(&name) {
            return Ok(Some(p));
        }

        tracing::debug!(name = %name, "policy cache miss");
        self.load_locked(&name).await
    }

    /// Caller holds `modify_lock`.
    async fn load_locked(&self, name: &str) -> Result<Option<Arc<Policy>>> {
        let bytes = self
            .storage
            .get(name)
            .await
            .map_err(|e| WardenError::storage("failed to read policy", e))?;

        let Some(bytes) = bytes else {
            // Gone from storage (e.g. deleted by another node).
            self.registry.remove(name);
            return Ok(None);
        };

        let entry: PolicyEntry = serde_json::from_slice(&bytes).map_err(|source| WardenError::Decode {
            name: name.to_string(),
            source,
        })?;

        match entry.policy_type {
            PolicyType::Acl => {}
            PolicyType::Rgp | PolicyType::Egp => return Err(unsupported(entry.policy_type)),
        }

        let policy = Arc::new(Policy::parse(&entry.raw)?.with_name(name));
        self.registry.insert(name.to_string(), entry.policy_type);
        self.cache.add(name, Arc::clone(&policy));

        tracing::debug!(name = %name, version = entry.version, "policy loaded from storage");
        Ok(Some(policy))
    }

    /// Sorted names of stored policies that may be attached to credentials.
    pub async fn list_policies(&self, policy_type: PolicyType) -> Result<Vec<String>> {
        match policy_type {
            PolicyType::Acl => {}
            PolicyType::Rgp | PolicyType::Egp => return Err(unsupported(policy_type)),
        }

        let keys = self
            .storage
            .list()
            .await
            .map_err(|e| WardenError::storage("failed to list policies", e))?;

        let mut names: Vec<String> = keys
            .iter()
            .map(|k| sanitize_name(k))
            .filter(|n| !n.is_empty() && builtin::is_assignable(n))
            .collect();
        names.sort();
        names.dedup();
        Ok(names)
    }

    pub async fn delete_policy(&self, name: &str, policy_type: PolicyType) -> Result<()> {
        let name = sanitize_name(name);
        match policy_type {
            PolicyType::Acl => {}
            PolicyType::Rgp | PolicyType::Egp => return Err(unsupported(policy_type)),
        }
        if builtin::is_immutable(&name) || name == DEFAULT_POLICY_NAME {
            tracing::warn!(name = %name, "rejected delete of built-in policy");
            return Err(WardenError::Immutable { name, action: "delete" });
        }

        let _guard = self.modify_lock.lock().await;

        self.storage
            .delete(&name)
            .await
            .map_err(|e| WardenError::storage("failed to delete policy", e))?;

        self.cache.remove(&name);
        self.registry.remove(&name);

        tracing::debug!(name = %name, "policy deleted");
        Ok(())
    }

    /// Drop the cached copy of `name` and reload it from storage.
    ///
    /// Called when storage changed underneath this instance. Reload errors
    /// are logged, never returned.
    pub async fn invalidate(&self, name: &str, policy_type: PolicyType) {
        let name = sanitize_name(name);
        self.cache.remove(&name);

        if let Err(e) = self.get_policy(&name, PolicyLookup::Exact(policy_type)).await {
            tracing::error!(name = %name, code = e.code().as_str(), error = %e, "error fetching policy after invalidation");
        }
    }

    /// Resolve `names` and compile them into one ACL. Unknown names grant
    /// nothing.
    pub async fn build_acl<S: AsRef<str>>(&self, names: &[S]) -> Result<Acl> {
        let mut resolved = Vec::with_capacity(names.len());
        for name in names {
            let p = self.get_policy(name.as_ref(), PolicyLookup::ByName).await?;
            if p.is_none() {
                tracing::debug!(name = %name.as_ref(), "unknown policy in acl request");
            }
            resolved.push(p);
        }
        Ok(Acl::compile(resolved.iter().map(|p| p.as_deref())))
    }
}
