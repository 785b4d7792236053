//! In-memory post store.
//!
//! Backs tests, simulation, and the demo binary. Assigns ids and
//! creation timestamps the way a hosted table would, and feeds every
//! mutation into the change-notice channel - the writer's own included,
//! which is exactly what a shared realtime table does.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::broadcast;
use tracing::trace;

use kansha_core::post::{generate_post_id, post_id_to_hex};
use kansha_core::{NewPost, Post, PostId};

use crate::error::FeedError;
use crate::store::{FeedChange, PostStore};

/// In-memory implementation of `PostStore`.
#[derive(Debug)]
pub struct InMemoryPostStore {
    /// All posts by id
    posts: DashMap<PostId, Post>,
    /// Change notices; receivers are the subscriptions
    changes: broadcast::Sender<FeedChange>,
}

impl Default for InMemoryPostStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryPostStore {
    /// Create a new empty store
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(64);
        Self {
            posts: DashMap::new(),
            changes,
        }
    }

    /// Number of posts stored
    pub fn len(&self) -> usize {
        self.posts.len()
    }

    /// Check whether the store holds no posts
    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    /// Remove a post entirely, as a moderator would. Emits a `Deleted`
    /// notice; there is no client-facing delete.
    pub fn remove(&self, id: &PostId) -> Option<Post> {
        let removed = self.posts.remove(id).map(|(_, post)| post);
        if removed.is_some() {
            self.notify(FeedChange::Deleted);
        }
        removed
    }

    fn notify(&self, change: FeedChange) {
        // No receivers is fine; notices are best-effort
        let _ = self.changes.send(change);
    }
}

#[async_trait]
impl PostStore for InMemoryPostStore {
    async fn recent(&self, limit: usize) -> Result<Vec<Post>, FeedError> {
        let mut posts: Vec<Post> = self.posts.iter().map(|entry| entry.value().clone()).collect();
        // Newest first; id breaks timestamp ties so the order is stable
        posts.sort_by(|a, b| {
            b.created_at_millis
                .cmp(&a.created_at_millis)
                .then_with(|| b.id.cmp(&a.id))
        });
        posts.truncate(limit);
        Ok(posts)
    }

    async fn insert(&self, new_post: NewPost) -> Result<Post, FeedError> {
        let post = Post {
            id: generate_post_id(),
            author_name: new_post.author_name,
            content: new_post.content,
            ai_reply: new_post.ai_reply,
            created_at_millis: Utc::now().timestamp_millis(),
        };
        trace!(id = %post_id_to_hex(&post.id), "Inserting post");
        self.posts.insert(post.id, post.clone());
        self.notify(FeedChange::Inserted);
        Ok(post)
    }

    async fn update_content(&self, id: PostId, content: &str) -> Result<(), FeedError> {
        {
            let mut entry = self
                .posts
                .get_mut(&id)
                .ok_or_else(|| FeedError::PostNotFound(post_id_to_hex(&id)))?;
            entry.content = content.to_string();
        }
        self.notify(FeedChange::Updated);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<FeedChange> {
        self.changes.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn insert_assigns_identity() {
        let store = InMemoryPostStore::new();
        let a = store.insert(NewPost::new("Hana", "one")).await.unwrap();
        let b = store.insert(NewPost::new("Hana", "two")).await.unwrap();
        assert_ne!(a.id, b.id);
        assert!(a.created_at_millis > 0);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn recent_is_newest_first_and_limited() {
        let store = InMemoryPostStore::new();
        for i in 0..6 {
            store
                .insert(NewPost::new("Hana", format!("post {i}")))
                .await
                .unwrap();
        }

        let posts = store.recent(4).await.unwrap();
        assert_eq!(posts.len(), 4);
        for pair in posts.windows(2) {
            assert!(
                pair[0].created_at_millis > pair[1].created_at_millis
                    || (pair[0].created_at_millis == pair[1].created_at_millis
                        && pair[0].id > pair[1].id)
            );
        }
    }

    #[tokio::test]
    async fn update_rewrites_content_in_place() {
        let store = InMemoryPostStore::new();
        let post = store.insert(NewPost::new("Hana", "first")).await.unwrap();

        store.update_content(post.id, "second").await.unwrap();

        let posts = store.recent(10).await.unwrap();
        assert_eq!(posts[0].content, "second");
        assert_eq!(posts[0].id, post.id);
        assert_eq!(posts[0].created_at_millis, post.created_at_millis);
    }

    #[tokio::test]
    async fn update_missing_post_fails() {
        let store = InMemoryPostStore::new();
        let err = store
            .update_content(generate_post_id(), "x")
            .await
            .unwrap_err();
        assert!(matches!(err, FeedError::PostNotFound(_)));
    }

    #[tokio::test]
    async fn every_mutation_emits_a_notice() {
        let store = InMemoryPostStore::new();
        let mut notices = store.subscribe();

        let post = store.insert(NewPost::new("Hana", "hi")).await.unwrap();
        store.update_content(post.id, "hi!").await.unwrap();
        store.remove(&post.id);

        assert_eq!(notices.recv().await.unwrap(), FeedChange::Inserted);
        assert_eq!(notices.recv().await.unwrap(), FeedChange::Updated);
        assert_eq!(notices.recv().await.unwrap(), FeedChange::Deleted);
    }
}
