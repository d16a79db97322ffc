//! Store config loader (strict parsing).

pub mod schema;

use std::fs;

use warden_core::error::{Result, WardenError};

pub use schema::{CacheSection, SeedPolicy, StorageKind, StorageSection, StoreConfig};

pub fn load_from_file(path: &str) -> Result<StoreConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| WardenError::Config(format!("read config {path} failed: {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<StoreConfig> {
    let cfg: StoreConfig = serde_yaml::from_str(s)
        .map_err(|e| WardenError::Config(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
