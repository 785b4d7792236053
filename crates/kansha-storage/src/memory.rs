//! In-memory storage implementation
//!
//! Values live in a `DashMap` and disappear with the process. Suitable
//! for testing and simulation environments.

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::trace;

use crate::KeyValueStore;
use crate::error::StorageError;

/// In-memory implementation of `KeyValueStore`.
#[derive(Debug, Default)]
pub struct InMemoryKeyValueStore {
    entries: DashMap<String, String>,
}

impl InMemoryKeyValueStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check whether the store holds no keys
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for InMemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        trace!(key, bytes = value.len(), "Storing value");
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn get_missing_returns_none() {
        let store = InMemoryKeyValueStore::new();
        assert_eq!(store.get("nothing").await.unwrap(), None);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn set_then_get() {
        let store = InMemoryKeyValueStore::new();
        store.set("wall.virtue", "12").await.unwrap();
        assert_eq!(store.get("wall.virtue").await.unwrap(), Some("12".to_string()));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn set_replaces_previous_value() {
        let store = InMemoryKeyValueStore::new();
        store.set("k", "first").await.unwrap();
        store.set("k", "second").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some("second".to_string()));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn keys_are_independent() {
        let store = InMemoryKeyValueStore::new();
        store.set("a", "1").await.unwrap();
        store.set("b", "2").await.unwrap();
        assert_eq!(store.get("a").await.unwrap(), Some("1".to_string()));
        assert_eq!(store.get("b").await.unwrap(), Some("2".to_string()));
    }
}
