//! # Kansha Storage
//!
//! Durable local key-value storage for the gratitude wall client.
//!
//! The device ledger keeps every field under its own key as plain text,
//! so the storage contract stays deliberately small: string keys, string
//! values, no transactions, no expiry.
//!
//! ## Features
//!
//! - **KeyValueStore trait**: the contract the ledger is written against
//! - **InMemoryKeyValueStore**: DashMap-backed implementation for testing/simulation
//! - **PersistentKeyValueStore**: file-per-key implementation for real devices
//!
//! ## Example
//!
//! ```rust,ignore
//! use kansha_storage::{InMemoryKeyValueStore, KeyValueStore};
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = InMemoryKeyValueStore::new();
//!     store.set("wall.display_name", "Hana").await.unwrap();
//!     assert_eq!(
//!         store.get("wall.display_name").await.unwrap(),
//!         Some("Hana".to_string())
//!     );
//! }
//! ```

pub mod error;
pub mod memory;
pub mod persistent;

// Re-exports
pub use error::StorageError;
pub use memory::InMemoryKeyValueStore;
pub use persistent::PersistentKeyValueStore;

use async_trait::async_trait;

/// String-only durable key-value storage.
///
/// Keys are short dotted names such as `wall.virtue`; values are the
/// field's text encoding. Each key is written independently - there is
/// no cross-key atomicity, and concurrent writers to the same key race
/// with last-write-wins semantics. The ledger accepts both: fields
/// degrade independently on corruption, and a device runs one writing
/// session at a time.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}
