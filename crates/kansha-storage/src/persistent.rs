//! Persistent storage implementation
//!
//! Each key becomes one file in the storage directory. Writes go through
//! a temp file and an atomic rename, so a torn write never corrupts the
//! previous value. One file per key keeps every ledger field
//! independently durable, matching the field-per-key write model above.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, trace};

use crate::KeyValueStore;
use crate::error::StorageError;

/// Persistent implementation of `KeyValueStore`.
#[derive(Debug)]
pub struct PersistentKeyValueStore {
    /// Directory holding one file per key
    dir: PathBuf,
}

impl PersistentKeyValueStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub async fn new(dir: impl AsRef<Path>) -> Result<Self, StorageError> {
        let dir = dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&dir).await?;
        debug!(path = %dir.display(), "Opened key-value store");
        Ok(Self { dir })
    }

    /// The directory this store writes into.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Map a key to its file path. Keys are restricted to dotted names so
    /// they can never escape the storage directory.
    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
        if !valid {
            return Err(StorageError::invalid_key(key));
        }
        Ok(self.dir.join(key))
    }
}

#[async_trait]
impl KeyValueStore for PersistentKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        trace!(key, bytes = value.len(), "Writing value");

        // Write to a temp file first, then rename into place
        let tmp = self.dir.join(format!("{key}.tmp~"));
        tokio::fs::write(&tmp, value).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn get_missing_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = PersistentKeyValueStore::new(dir.path()).await.unwrap();
        assert_eq!(store.get("wall.virtue").await.unwrap(), None);
    }

    #[tokio::test]
    async fn set_then_get_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = PersistentKeyValueStore::new(dir.path()).await.unwrap();
        store.set("wall.display_name", "花子").await.unwrap();
        assert_eq!(
            store.get("wall.display_name").await.unwrap(),
            Some("花子".to_string())
        );
    }

    #[tokio::test]
    async fn values_survive_reopening() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = PersistentKeyValueStore::new(dir.path()).await.unwrap();
            store.set("wall.virtue", "42").await.unwrap();
        }
        let store = PersistentKeyValueStore::new(dir.path()).await.unwrap();
        assert_eq!(store.get("wall.virtue").await.unwrap(), Some("42".to_string()));
    }

    #[tokio::test]
    async fn set_replaces_previous_value() {
        let dir = tempfile::tempdir().unwrap();
        let store = PersistentKeyValueStore::new(dir.path()).await.unwrap();
        store.set("k", "one").await.unwrap();
        store.set("k", "two").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some("two".to_string()));
    }

    #[tokio::test]
    async fn rejects_path_escaping_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = PersistentKeyValueStore::new(dir.path()).await.unwrap();
        assert!(matches!(
            store.set("../outside", "x").await,
            Err(StorageError::InvalidKey(_))
        ));
        assert!(matches!(
            store.get("a/b").await,
            Err(StorageError::InvalidKey(_))
        ));
        assert!(matches!(
            store.set("", "x").await,
            Err(StorageError::InvalidKey(_))
        ));
    }

    #[tokio::test]
    async fn no_temp_files_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let store = PersistentKeyValueStore::new(dir.path()).await.unwrap();
        store.set("wall.virtue", "7").await.unwrap();
        store.set("wall.daily_post_count", "3").await.unwrap();

        let mut names = Vec::new();
        let mut entries = tokio::fs::read_dir(dir.path()).await.unwrap();
        while let Some(entry) = entries.next_entry().await.unwrap() {
            names.push(entry.file_name().to_string_lossy().to_string());
        }
        names.sort();
        assert_eq!(names, vec!["wall.daily_post_count", "wall.virtue"]);
    }
}
