//! # Kansha Wall
//!
//! View-state coordination for the gratitude wall client.
//!
//! The crates below this one keep the data honest; this one keeps the
//! interface honest. A single [`ViewState`] value says what is on
//! screen - browsing, composing, editing, or celebrating - and the
//! [`ViewCoordinator`] is the only thing allowed to change it, applying
//! the gating rules on the way: quota before composing, balance before
//! offering, ownership before editing, and a five-second celebration
//! that always falls back to browsing.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use kansha_feed::InMemoryPostStore;
//! use kansha_storage::InMemoryKeyValueStore;
//! use kansha_wall::WallSession;
//!
//! #[tokio::main]
//! async fn main() {
//!     let session = WallSession::new(
//!         Arc::new(InMemoryKeyValueStore::new()),
//!         Arc::new(InMemoryPostStore::new()),
//!     )
//!     .await
//!     .unwrap();
//!     session.start().await.unwrap();
//!
//!     let coord = session.coordinator();
//!     coord.open_compose().await.unwrap();
//!     coord.set_draft_author("Hana").unwrap();
//!     coord.set_draft_content("ありがとう").unwrap();
//!     coord.submit_draft().await.unwrap();
//!
//!     session.shutdown().await;
//! }
//! ```

pub mod coordinator;
pub mod error;
pub mod session;
pub mod view;

// Re-exports
pub use coordinator::{CELEBRATION_MILLIS, ViewCoordinator};
pub use error::ViewError;
pub use session::WallSession;
pub use view::{BrowseTab, Celebration, Draft, ViewState};
