//! The feed synchronizer.
//!
//! Keeps one device's picture of the shared wall and its private ledger
//! in step. The shared store stays the single source of truth for posts:
//! every refresh replaces the whole local list with what the store
//! returned, and every realtime notice triggers such a refresh. The
//! ledger moves only after a remote write has succeeded, so a failed
//! insert leaves no local trace - no virtue, no tokens, no quota use.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{Local, NaiveDate};
use tokio::sync::{Mutex, broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use kansha_core::post::post_id_to_hex;
use kansha_core::{NewPost, OfferingKind, Post, PostId};
use kansha_ledger::{Ledger, LedgerPatch, LedgerStore, quota, reward};

use crate::error::FeedError;
use crate::store::{FeedChange, PostStore};

/// How many posts a refresh asks the store for.
pub const FEED_LIMIT: usize = 50;

/// A successful submission: the created post and what it earned.
#[derive(Debug, Clone)]
pub struct SubmitReceipt {
    /// The post as the store created it.
    pub post: Post,
    /// The virtue count after this submission.
    pub virtue: u64,
    /// Tokens this submission unlocked, in grant order.
    pub unlocked: Vec<OfferingKind>,
}

/// Reconciles the shared post feed with the local ledger.
///
/// Readers observe the feed through a watch channel holding the latest
/// fetched list; the ledger is read through cloned snapshots. One
/// synchronizer serves one device session.
pub struct FeedSynchronizer {
    /// The shared post table
    store: Arc<dyn PostStore>,
    /// Ledger persistence
    ledger_store: LedgerStore,
    /// In-memory ledger; the mutex keeps read-modify-write runs whole
    ledger: Mutex<Ledger>,
    /// Latest fetched feed, newest first
    feed_tx: watch::Sender<Vec<Post>>,
    /// Guards against overlapping submissions
    submitting: AtomicBool,
    /// Whether the watcher is running
    started: AtomicBool,
    /// Shutdown signal for the watcher
    shutdown_tx: broadcast::Sender<()>,
    /// The watcher task handle
    watcher_task: Mutex<Option<JoinHandle<()>>>,
}

impl FeedSynchronizer {
    /// Load the ledger and wrap the stores.
    ///
    /// The feed starts empty; call [`start`](Self::start) to subscribe
    /// and perform the first fetch.
    pub async fn new(
        store: Arc<dyn PostStore>,
        ledger_store: LedgerStore,
    ) -> Result<Self, FeedError> {
        let ledger = ledger_store.load().await?;
        let (feed_tx, _) = watch::channel(Vec::new());
        let (shutdown_tx, _) = broadcast::channel(1);
        Ok(Self {
            store,
            ledger_store,
            ledger: Mutex::new(ledger),
            feed_tx,
            submitting: AtomicBool::new(false),
            started: AtomicBool::new(false),
            shutdown_tx,
            watcher_task: Mutex::new(None),
        })
    }

    /// Establish the realtime subscription and fetch the initial feed.
    ///
    /// The subscription is registered before the fetch so a change
    /// arriving in between still triggers a refresh. Calling `start`
    /// twice is a no-op.
    pub async fn start(&self) -> Result<(), FeedError> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Ok(()); // Already started
        }

        let changes = self.store.subscribe();
        let shutdown_rx = self.shutdown_tx.subscribe();
        let handle = Self::spawn_watcher(
            Arc::clone(&self.store),
            self.feed_tx.clone(),
            changes,
            shutdown_rx,
        );
        *self.watcher_task.lock().await = Some(handle);

        self.refresh().await?;
        Ok(())
    }

    /// Tear down the realtime subscription.
    ///
    /// The watcher drops its receiver, which is the unsubscribe; after
    /// this no notice will touch the feed. Calling `shutdown` twice is a
    /// no-op.
    pub async fn shutdown(&self) {
        if !self.started.swap(false, Ordering::SeqCst) {
            return; // Already stopped
        }

        let _ = self.shutdown_tx.send(());
        if let Some(task) = self.watcher_task.lock().await.take() {
            let _ = task.await;
        }
        debug!("Feed synchronizer stopped");
    }

    /// Observe the feed. The channel always holds the latest fetched
    /// list, newest first.
    pub fn feed(&self) -> watch::Receiver<Vec<Post>> {
        self.feed_tx.subscribe()
    }

    /// The latest fetched feed, newest first.
    pub fn current_feed(&self) -> Vec<Post> {
        self.feed_tx.borrow().clone()
    }

    /// A snapshot of the device ledger.
    pub async fn ledger(&self) -> Ledger {
        self.ledger.lock().await.clone()
    }

    /// Submissions still available today.
    pub async fn remaining_quota(&self) -> u32 {
        let ledger = self.ledger.lock().await;
        quota::remaining_quota(&ledger, today())
    }

    /// Re-fetch the feed from the store and publish it wholesale.
    pub async fn refresh(&self) -> Result<Vec<Post>, FeedError> {
        fetch_and_publish(self.store.as_ref(), &self.feed_tx).await
    }

    /// Submit a new post.
    ///
    /// Validation and the quota gate run before any remote call; the
    /// ledger is only touched once the insert has succeeded. Rewards,
    /// quota, ownership, and the remembered display name are then
    /// persisted as one patch and the feed is re-fetched. Only one
    /// submission may be in flight at a time, and the ledger lock is
    /// never held across the store call, so a slow insert blocks
    /// nothing but the next submission.
    pub async fn submit(
        &self,
        author_name: &str,
        content: &str,
        offering: Option<OfferingKind>,
    ) -> Result<SubmitReceipt, FeedError> {
        if self.submitting.swap(true, Ordering::SeqCst) {
            return Err(FeedError::SubmitInFlight);
        }
        let result = self.submit_inner(author_name, content, offering).await;
        self.submitting.store(false, Ordering::SeqCst);
        result
    }

    async fn submit_inner(
        &self,
        author_name: &str,
        content: &str,
        offering: Option<OfferingKind>,
    ) -> Result<SubmitReceipt, FeedError> {
        let author_name = author_name.trim();
        let content = content.trim();
        if author_name.is_empty() {
            return Err(FeedError::EmptyAuthor);
        }
        if content.is_empty() {
            return Err(FeedError::EmptyContent);
        }

        // Gate checks under a scoped lock, released before the store
        // call so a hung insert blocks no ledger read.
        let today = today();
        {
            let ledger = self.ledger.lock().await;
            if quota::remaining_quota(&ledger, today) == 0 {
                return Err(FeedError::QuotaExhausted);
            }
            if let Some(kind) = offering {
                if ledger.tokens.balance(kind) == 0 {
                    return Err(FeedError::OfferingUnavailable(kind));
                }
            }
        }

        let ai_reply = offering.map(|kind| kind.reply_text().to_string());
        let post = self
            .store
            .insert(NewPost {
                author_name: author_name.to_string(),
                content: content.to_string(),
                ai_reply,
            })
            .await?;

        // The remote write is confirmed; now the local side effects run
        // to completion. The submit guard serializes submissions and the
        // only other ledger writer touches favorites, so the gate verdict
        // above still holds under the retaken lock.
        let mut ledger = self.ledger.lock().await;
        ledger.owned_post_ids.insert(post.id);
        ledger.display_name = author_name.to_string();
        let outcome = reward::apply_submission_reward(&mut ledger, offering);
        let (daily_count, daily_date) = quota::record_post(&ledger, today);
        ledger.daily_post_count = daily_count;
        ledger.daily_post_date = Some(daily_date);

        let patch = LedgerPatch::new()
            .display_name(author_name)
            .owned_post_ids(ledger.owned_post_ids.clone())
            .virtue(ledger.virtue)
            .tokens(ledger.tokens)
            .daily_quota(daily_count, daily_date);
        self.ledger_store.save(&patch).await?;
        drop(ledger);

        info!(
            id = %post_id_to_hex(&post.id),
            virtue = outcome.virtue,
            unlocked = outcome.unlocked.len(),
            "Submitted post"
        );

        // The notification-triggered refresh races this one; both fetch
        // the same canonical list, so whichever lands last is still right.
        if let Err(e) = self.refresh().await {
            warn!(error = %e, "Refresh after submit failed");
        }

        Ok(SubmitReceipt {
            post,
            virtue: outcome.virtue,
            unlocked: outcome.unlocked,
        })
    }

    /// Rewrite one of this device's posts in place.
    ///
    /// The wording is trimmed and must not end up empty; ownership is
    /// checked against the local ledger before the store is called.
    /// Identity, author, reply, and timestamp are untouched, and neither
    /// quota nor virtue moves.
    pub async fn edit(&self, post_id: PostId, new_content: &str) -> Result<(), FeedError> {
        let new_content = new_content.trim();
        if new_content.is_empty() {
            return Err(FeedError::EmptyContent);
        }
        let owns = self.ledger.lock().await.owns(&post_id);
        if !owns {
            return Err(FeedError::NotOwner);
        }

        self.store.update_content(post_id, new_content).await?;
        debug!(id = %post_id_to_hex(&post_id), "Edited post");

        if let Err(e) = self.refresh().await {
            warn!(error = %e, "Refresh after edit failed");
        }
        Ok(())
    }

    /// Flip a post's membership in the local favorites set.
    ///
    /// Purely local: the store is never contacted, any post can be
    /// marked, and the rest of the ledger stays untouched. Returns
    /// whether the post is a favorite afterwards.
    pub async fn toggle_favorite(&self, post_id: PostId) -> Result<bool, FeedError> {
        let mut ledger = self.ledger.lock().await;
        let now_favorite = if ledger.favorite_post_ids.remove(&post_id) {
            false
        } else {
            ledger.favorite_post_ids.insert(post_id);
            true
        };

        let patch = LedgerPatch::new().favorite_post_ids(ledger.favorite_post_ids.clone());
        self.ledger_store.save(&patch).await?;
        trace!(
            id = %post_id_to_hex(&post_id),
            favorite = now_favorite,
            "Toggled favorite"
        );
        Ok(now_favorite)
    }

    /// Spawn the watcher that turns change notices into refreshes.
    fn spawn_watcher(
        store: Arc<dyn PostStore>,
        feed_tx: watch::Sender<Vec<Post>>,
        mut changes: broadcast::Receiver<FeedChange>,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            debug!("Feed watcher started");
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        debug!("Feed watcher shutting down");
                        break;
                    }
                    notice = changes.recv() => match notice {
                        Ok(change) => {
                            trace!(?change, "Change notice");
                            if let Err(e) = fetch_and_publish(store.as_ref(), &feed_tx).await {
                                warn!(error = %e, "Refresh after change notice failed");
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(missed)) => {
                            // Notices carry no payload, so one refresh
                            // resynchronizes no matter how many were missed.
                            debug!(missed, "Change notices lagged; refreshing once");
                            if let Err(e) = fetch_and_publish(store.as_ref(), &feed_tx).await {
                                warn!(error = %e, "Refresh after lag failed");
                            }
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            debug!("Change channel closed; feed watcher exiting");
                            break;
                        }
                    }
                }
            }
        })
    }
}

impl Drop for FeedSynchronizer {
    fn drop(&mut self) {
        // Covers a synchronizer dropped without shutdown().
        if let Some(task) = self.watcher_task.get_mut().take() {
            task.abort();
        }
    }
}

async fn fetch_and_publish(
    store: &dyn PostStore,
    feed_tx: &watch::Sender<Vec<Post>>,
) -> Result<Vec<Post>, FeedError> {
    let posts = store.recent(FEED_LIMIT).await?;
    trace!(count = posts.len(), "Publishing fetched feed");
    feed_tx.send_replace(posts.clone());
    Ok(posts)
}

/// The device's local calendar date.
fn today() -> NaiveDate {
    Local::now().date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryPostStore;
    use kansha_ledger::DAILY_POST_LIMIT;
    use kansha_storage::InMemoryKeyValueStore;

    async fn synchronizer() -> (Arc<InMemoryPostStore>, FeedSynchronizer) {
        let posts = Arc::new(InMemoryPostStore::new());
        let kv = Arc::new(InMemoryKeyValueStore::new());
        let sync = FeedSynchronizer::new(posts.clone(), LedgerStore::new(kv))
            .await
            .unwrap();
        (posts, sync)
    }

    #[tokio::test]
    async fn submit_round_trips_through_the_store() {
        let (posts, sync) = synchronizer().await;

        let receipt = sync.submit("Hana", "ありがとう", None).await.unwrap();
        assert_eq!(receipt.post.author_name, "Hana");
        assert_eq!(receipt.post.content, "ありがとう");
        assert_eq!(receipt.post.ai_reply, None);
        assert_eq!(receipt.virtue, 1);
        assert!(receipt.unlocked.is_empty());
        assert_eq!(posts.len(), 1);

        // The submit already refreshed the published feed
        let feed = sync.current_feed();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].id, receipt.post.id);
    }

    #[tokio::test]
    async fn submit_trims_and_rejects_blank_fields() {
        let (posts, sync) = synchronizer().await;

        assert!(matches!(
            sync.submit("   ", "hello", None).await,
            Err(FeedError::EmptyAuthor)
        ));
        assert!(matches!(
            sync.submit("Hana", " \n\t ", None).await,
            Err(FeedError::EmptyContent)
        ));
        assert!(posts.is_empty());

        // Nothing was recorded locally either
        let ledger = sync.ledger().await;
        assert_eq!(ledger.virtue, 0);
        assert_eq!(ledger.daily_post_count, 0);
    }

    #[tokio::test]
    async fn submit_remembers_the_display_name() {
        let (_posts, sync) = synchronizer().await;
        sync.submit("  Hana  ", "first", None).await.unwrap();

        let ledger = sync.ledger().await;
        assert_eq!(ledger.display_name, "Hana");
        assert_eq!(ledger.owned_post_ids.len(), 1);
    }

    #[tokio::test]
    async fn quota_runs_out_after_the_daily_limit() {
        let (posts, sync) = synchronizer().await;

        for i in 0..DAILY_POST_LIMIT {
            sync.submit("Hana", &format!("post {i}"), None).await.unwrap();
        }
        assert_eq!(sync.remaining_quota().await, 0);

        let err = sync.submit("Hana", "one too many", None).await.unwrap_err();
        assert!(matches!(err, FeedError::QuotaExhausted));
        assert_eq!(posts.len(), DAILY_POST_LIMIT as usize);

        // The rejected attempt earned nothing
        assert_eq!(sync.ledger().await.virtue, u64::from(DAILY_POST_LIMIT));
    }

    #[tokio::test]
    async fn offering_requires_balance() {
        let (posts, sync) = synchronizer().await;

        let err = sync
            .submit("Hana", "with rice", Some(OfferingKind::RiceBall))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            FeedError::OfferingUnavailable(OfferingKind::RiceBall)
        ));
        assert!(posts.is_empty());
    }

    #[tokio::test]
    async fn offering_attaches_the_fixed_reply() {
        let (_posts, sync) = synchronizer().await;

        // Two plain submissions, then the third unlocks a rice ball
        sync.submit("Hana", "one", None).await.unwrap();
        sync.submit("Hana", "two", None).await.unwrap();
        let receipt = sync.submit("Hana", "three", None).await.unwrap();
        assert_eq!(receipt.unlocked, vec![OfferingKind::RiceBall]);

        let receipt = sync
            .submit("Hana", "four", Some(OfferingKind::RiceBall))
            .await
            .unwrap();
        assert_eq!(
            receipt.post.ai_reply.as_deref(),
            Some(OfferingKind::RiceBall.reply_text())
        );
        assert_eq!(sync.ledger().await.tokens.rice_balls, 0);
    }

    #[tokio::test]
    async fn edit_requires_ownership() {
        let (posts, sync) = synchronizer().await;

        // A post someone else wrote, straight into the store
        let foreign = posts
            .insert(NewPost::new("Taro", "someone else's"))
            .await
            .unwrap();

        let err = sync.edit(foreign.id, "hijacked").await.unwrap_err();
        assert!(matches!(err, FeedError::NotOwner));

        let mine = sync.submit("Hana", "mine", None).await.unwrap();
        sync.edit(mine.post.id, "mine, reworded").await.unwrap();

        let feed = sync.refresh().await.unwrap();
        let edited = feed.iter().find(|p| p.id == mine.post.id).unwrap();
        assert_eq!(edited.content, "mine, reworded");
    }

    #[tokio::test]
    async fn edit_moves_neither_quota_nor_virtue() {
        let (_posts, sync) = synchronizer().await;
        let receipt = sync.submit("Hana", "original", None).await.unwrap();
        let before = sync.ledger().await;

        sync.edit(receipt.post.id, "edited").await.unwrap();

        let after = sync.ledger().await;
        assert_eq!(after.virtue, before.virtue);
        assert_eq!(after.daily_post_count, before.daily_post_count);
        assert_eq!(after.tokens, before.tokens);
    }

    #[tokio::test]
    async fn edit_trims_and_rejects_blank_wording() {
        let (_posts, sync) = synchronizer().await;
        let receipt = sync.submit("Hana", "original", None).await.unwrap();

        let err = sync.edit(receipt.post.id, " \n\t ").await.unwrap_err();
        assert!(matches!(err, FeedError::EmptyContent));
        assert_eq!(sync.refresh().await.unwrap()[0].content, "original");

        sync.edit(receipt.post.id, "  reworded  ").await.unwrap();
        assert_eq!(sync.refresh().await.unwrap()[0].content, "reworded");
    }

    #[tokio::test]
    async fn favorites_toggle_and_work_on_any_post() {
        let (posts, sync) = synchronizer().await;
        let foreign = posts.insert(NewPost::new("Taro", "theirs")).await.unwrap();

        assert!(sync.toggle_favorite(foreign.id).await.unwrap());
        assert!(sync.ledger().await.is_favorite(&foreign.id));

        assert!(!sync.toggle_favorite(foreign.id).await.unwrap());
        assert!(!sync.ledger().await.is_favorite(&foreign.id));
    }

    #[tokio::test]
    async fn refresh_caps_the_feed_length() {
        let (posts, sync) = synchronizer().await;
        for i in 0..(FEED_LIMIT + 10) {
            posts
                .insert(NewPost::new("Taro", format!("post {i}")))
                .await
                .unwrap();
        }

        let feed = sync.refresh().await.unwrap();
        assert_eq!(feed.len(), FEED_LIMIT);
    }

    #[tokio::test]
    async fn refresh_is_idempotent() {
        let (posts, sync) = synchronizer().await;
        posts.insert(NewPost::new("Taro", "hello")).await.unwrap();

        let first = sync.refresh().await.unwrap();
        let second = sync.refresh().await.unwrap();
        assert_eq!(first, second);
        assert_eq!(sync.current_feed(), first);
    }
}
