//! # Kansha Feed
//!
//! Shared-feed synchronization for the gratitude wall client.
//!
//! The wall's posts live in a hosted table every device reads and
//! writes; each device additionally keeps a private reward ledger. This
//! crate owns the reconciliation between the two:
//!
//! - **PostStore trait**: the four primitives the client needs from the
//!   hosted table (read, insert, update, change notices)
//! - **InMemoryPostStore**: DashMap-backed implementation for
//!   testing/simulation and the demo binary
//! - **FeedSynchronizer**: wholesale refresh, gated submission with
//!   all-or-nothing ledger effects, owner-checked edits, local
//!   favorites, and the notice-driven refresh watcher
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use kansha_feed::{FeedSynchronizer, InMemoryPostStore};
//! use kansha_ledger::LedgerStore;
//! use kansha_storage::InMemoryKeyValueStore;
//!
//! #[tokio::main]
//! async fn main() {
//!     let posts = Arc::new(InMemoryPostStore::new());
//!     let ledger = LedgerStore::new(Arc::new(InMemoryKeyValueStore::new()));
//!     let sync = FeedSynchronizer::new(posts, ledger).await.unwrap();
//!
//!     sync.start().await.unwrap();
//!     let receipt = sync.submit("Hana", "ありがとう", None).await.unwrap();
//!     println!("virtue is now {}", receipt.virtue);
//!     sync.shutdown().await;
//! }
//! ```

pub mod error;
pub mod memory;
pub mod store;
pub mod sync;

// Re-exports
pub use error::FeedError;
pub use memory::InMemoryPostStore;
pub use store::{FeedChange, PostStore};
pub use sync::{FEED_LIMIT, FeedSynchronizer, SubmitReceipt};
