//! The shared post store contract.
//!
//! The wall's datastore is a hosted table with change notification. The
//! client only needs four primitives from it: an ordered read, an insert
//! that assigns identity, an in-place content update, and a subscription
//! that says "something changed". A notice carries no payload worth
//! trusting - consumers re-fetch rather than patch.

use async_trait::async_trait;
use kansha_core::{NewPost, Post, PostId};
use tokio::sync::broadcast;

use crate::error::FeedError;

/// What kind of change a realtime notice reports.
///
/// Consumers must not read more into a notice than "the table changed";
/// the synchronizer re-fetches on every kind alike, own writes included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedChange {
    /// A post was created.
    Inserted,
    /// A post was rewritten in place.
    Updated,
    /// A post was removed.
    Deleted,
}

/// A hosted post table with change notification.
///
/// Implementations assign ids and creation timestamps on insert; clients
/// never mint either. Dropping the receiver returned by [`subscribe`]
/// is the unsubscribe.
///
/// [`subscribe`]: PostStore::subscribe
#[async_trait]
pub trait PostStore: Send + Sync {
    /// The most recent posts, newest first, at most `limit` of them.
    async fn recent(&self, limit: usize) -> Result<Vec<Post>, FeedError>;

    /// Create a post; the store assigns `id` and `created_at_millis`.
    async fn insert(&self, new_post: NewPost) -> Result<Post, FeedError>;

    /// Replace the content of an existing post.
    async fn update_content(&self, id: PostId, content: &str) -> Result<(), FeedError>;

    /// Subscribe to change notices for the post table.
    fn subscribe(&self) -> broadcast::Receiver<FeedChange>;
}
