//! File-backed storage: one file per key under a root directory.
//!
//! Puts write a hidden temp file and rename it over the target, so a reader
//! sees either the old or the new record, never a torn one.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use super::{PolicyStorage, StorageError};

pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    /// Open (creating if needed) the directory at `root`.
    pub async fn open(root: impl AsRef<Path>) -> Result<Self, StorageError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        // Keys map to single file names; hidden names are reserved for temp files.
        if key.is_empty()
            || key.starts_with('.')
            || key.contains("..")
            || key.contains(|c: char| c == '/' || c == '\\')
        {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl PolicyStorage for FileStorage {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let path = self.path_for(key)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        let tmp = self.root.join(format!(".{key}.tmp"));
        fs::write(&tmp, value).await?;
        fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn list(&self) -> Result<Vec<String>, StorageError> {
        let mut out = Vec::new();
        let mut dir = fs::read_dir(&self.root).await?;
        while let Some(entry) = dir.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let Ok(name) = entry.file_name().into_string() else { continue };
            if !name.starts_with('.') {
                out.push(name);
            }
        }
        out.sort();
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("warden-file-storage-{tag}-{}", std::process::id()))
    }

    #[tokio::test]
    async fn file_roundtrip_and_listing() {
        let dir = scratch_dir("roundtrip");
        let _ = fs::remove_dir_all(&dir).await;
        let s = FileStorage::open(&dir).await.unwrap();

        s.put("ops", b"{}".to_vec()).await.unwrap();
        s.put("default", b"{\"v\":1}".to_vec()).await.unwrap();
        s.put("default", b"{\"v\":2}".to_vec()).await.unwrap();

        assert_eq!(s.get("default").await.unwrap().as_deref(), Some(&b"{\"v\":2}"[..]));
        assert_eq!(s.list().await.unwrap(), vec!["default", "ops"]);

        s.delete("ops").await.unwrap();
        s.delete("ops").await.unwrap();
        assert!(s.get("ops").await.unwrap().is_none());

        let _ = fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn rejects_keys_outside_root() {
        let dir = scratch_dir("keys");
        let s = FileStorage::open(&dir).await.unwrap();
        for key in ["", "../etc", "a/b", ".hidden", "a\\b"] {
            assert!(matches!(s.get(key).await, Err(StorageError::InvalidKey(_))), "key={key}");
        }
        let _ = fs::remove_dir_all(&dir).await;
    }
}
