//! Durable key-value view the policy store writes through.
//!
//! Backends are opaque to the store: any call may block on I/O and fail with
//! a `StorageError`, which the store wraps and propagates unchanged.

pub mod file;

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

pub use warden_core::error::StorageError;
pub use file::FileStorage;

/// Atomic per-key put/get/delete plus key enumeration.
#[async_trait]
pub trait PolicyStorage: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;
    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError>;
    async fn delete(&self, key: &str) -> Result<(), StorageError>;
    /// All keys. May carry a leading `/`; callers strip it.
    async fn list(&self) -> Result<Vec<String>, StorageError>;
}

/// In-process storage. Contents are lost on drop.
#[derive(Default)]
pub struct MemoryStorage {
    entries: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
        }
    }
}

#[async_trait]
impl PolicyStorage for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.entries.read().await.keys().cloned().collect())
    }
}
