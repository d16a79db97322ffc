use serde::Deserialize;
use warden_core::error::{Result, WardenError};

use crate::cache::DEFAULT_CACHE_CAPACITY;

const MAX_CACHE_CAPACITY: usize = 1 << 20;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    pub version: u32,

    #[serde(default)]
    pub cache: CacheSection,

    #[serde(default)]
    pub storage: StorageSection,

    /// Operator policies loaded at startup.
    #[serde(default)]
    pub seed: Vec<SeedPolicy>,
}

impl StoreConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(WardenError::Config(format!(
                "unsupported config version {}",
                self.version
            )));
        }

        self.cache.validate()?;
        self.storage.validate()?;

        for s in &self.seed {
            if s.name.trim().is_empty() {
                return Err(WardenError::Config("seed.name must not be empty".into()));
            }
            if s.file.trim().is_empty() {
                return Err(WardenError::Config(format!("seed {}: file must not be empty", s.name)));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheSection {
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,

    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            capacity: default_cache_capacity(),
        }
    }
}

impl CacheSection {
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_CACHE_CAPACITY).contains(&self.capacity) {
            return Err(WardenError::Config(format!(
                "cache.capacity must be between 1 and {MAX_CACHE_CAPACITY}"
            )));
        }
        Ok(())
    }
}

fn default_cache_enabled() -> bool {
    true
}
fn default_cache_capacity() -> usize {
    DEFAULT_CACHE_CAPACITY
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageKind {
    #[default]
    Memory,
    File,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageSection {
    #[serde(default)]
    pub kind: StorageKind,

    /// Directory for `kind: file`.
    #[serde(default)]
    pub path: Option<String>,
}

impl StorageSection {
    pub fn validate(&self) -> Result<()> {
        match (self.kind, self.path.as_deref()) {
            (StorageKind::File, None) | (StorageKind::File, Some("")) => Err(WardenError::Config(
                "storage.path is required when storage.kind is file".into(),
            )),
            (StorageKind::Memory, Some(_)) => Err(WardenError::Config(
                "storage.path is only valid when storage.kind is file".into(),
            )),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedPolicy {
    pub name: String,
    /// Path to the policy source file.
    pub file: String,
}
