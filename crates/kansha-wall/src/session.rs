//! One device's wall session.
//!
//! Wires storage, ledger, synchronizer, and coordinator together and
//! owns the lifecycle: `start` establishes the realtime subscription and
//! performs the first fetch, `shutdown` tears the subscription down.
//! Frontends keep a session for as long as the wall is on screen.

use std::sync::Arc;

use kansha_feed::{FeedError, FeedSynchronizer, PostStore};
use kansha_ledger::LedgerStore;
use kansha_storage::KeyValueStore;

use crate::coordinator::ViewCoordinator;

/// A running wall session for one device.
pub struct WallSession {
    sync: Arc<FeedSynchronizer>,
    coordinator: ViewCoordinator,
}

impl WallSession {
    /// Build a session over the given local storage and post store.
    ///
    /// Loads the ledger but does not contact the post store yet; call
    /// [`start`](Self::start) for that.
    pub async fn new(
        kv: Arc<dyn KeyValueStore>,
        posts: Arc<dyn PostStore>,
    ) -> Result<Self, FeedError> {
        let ledger_store = LedgerStore::new(kv);
        let sync = Arc::new(FeedSynchronizer::new(posts, ledger_store).await?);
        let coordinator = ViewCoordinator::new(Arc::clone(&sync));
        Ok(Self { sync, coordinator })
    }

    /// Subscribe to change notices and fetch the initial feed.
    pub async fn start(&self) -> Result<(), FeedError> {
        self.sync.start().await
    }

    /// Tear down the realtime subscription. The session remains usable
    /// for manual refreshes; only the notice-driven updates stop.
    pub async fn shutdown(&self) {
        self.sync.shutdown().await;
    }

    /// Feed and ledger operations.
    pub fn sync(&self) -> &Arc<FeedSynchronizer> {
        &self.sync
    }

    /// View-state transitions.
    pub fn coordinator(&self) -> &ViewCoordinator {
        &self.coordinator
    }
}
