//! The view coordinator.
//!
//! Owns the single [`ViewState`] value and applies every transition,
//! wiring the interface to the synchronizer: compose gated on quota,
//! offerings gated on balance, edits gated on ownership, and the
//! one-shot celebration timer that falls back to browsing.
//!
//! Remote failures stop here. A failed submission or edit is logged and
//! the view stays where it was, draft intact; nothing propagates an
//! error the frontend has to re-handle. The `ViewError` values this
//! module does return are local rejections - a frontend renders them as
//! a disabled control, not a dialog.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use kansha_core::{OfferingKind, Post, PostId};
use kansha_feed::FeedSynchronizer;

use crate::error::ViewError;
use crate::view::{BrowseTab, Celebration, Draft, ViewState};

/// How long the celebration stays up before falling back to browse.
pub const CELEBRATION_MILLIS: u64 = 5_000;

/// Owns the view state and applies transitions.
///
/// One coordinator serves one device session. All methods take `&self`;
/// the state lives in a watch channel whose modify hook keeps each
/// transition atomic.
pub struct ViewCoordinator {
    /// Feed and ledger operations
    sync: Arc<FeedSynchronizer>,
    /// The single view-state value; receivers are the frontends
    state_tx: watch::Sender<ViewState>,
    /// The pending celebration fallback timer
    celebration_timer: Mutex<Option<JoinHandle<()>>>,
}

impl ViewCoordinator {
    /// Create a coordinator starting in `Browse { tab: All }`.
    pub fn new(sync: Arc<FeedSynchronizer>) -> Self {
        let (state_tx, _) = watch::channel(ViewState::default());
        Self {
            sync,
            state_tx,
            celebration_timer: Mutex::new(None),
        }
    }

    /// Observe view-state changes.
    pub fn state(&self) -> watch::Receiver<ViewState> {
        self.state_tx.subscribe()
    }

    /// The current view state.
    pub fn current_state(&self) -> ViewState {
        self.state_tx.borrow().clone()
    }

    /// The posts the current browse tab shows: everything, or only the
    /// posts this device owns. Outside browse mode the full feed is
    /// returned, since that is what the wall behind an open editor shows.
    pub async fn visible_posts(&self) -> Vec<Post> {
        let tab = match &*self.state_tx.borrow() {
            ViewState::Browse { tab } => *tab,
            _ => BrowseTab::All,
        };
        let feed = self.sync.current_feed();
        match tab {
            BrowseTab::All => feed,
            BrowseTab::Mine => {
                let ledger = self.sync.ledger().await;
                feed.into_iter().filter(|p| ledger.owns(&p.id)).collect()
            }
        }
    }

    /// Whether the compose entry point should be live.
    pub async fn can_compose(&self) -> bool {
        self.sync.remaining_quota().await > 0
    }

    /// Whether the open draft is currently submittable: both fields
    /// non-blank and quota left. False outside compose mode.
    pub async fn can_submit(&self) -> bool {
        let draft = match &*self.state_tx.borrow() {
            ViewState::Composing { draft } => draft.clone(),
            _ => return false,
        };
        !draft.author_name.trim().is_empty()
            && !draft.content.trim().is_empty()
            && self.sync.remaining_quota().await > 0
    }

    /// Switch the browse tab. Dismisses a live celebration first.
    pub fn select_tab(&self, tab: BrowseTab) -> Result<(), ViewError> {
        self.cancel_celebration();
        self.try_transition(|state| match state {
            ViewState::Browse { tab: current } => {
                *current = tab;
                Ok(())
            }
            _ => Err(ViewError::WrongState),
        })
    }

    /// Open the compose surface, prefilling the author name the ledger
    /// remembers. Refused when the daily quota is spent or another
    /// editor is open.
    pub async fn open_compose(&self) -> Result<(), ViewError> {
        self.cancel_celebration();
        if self.sync.remaining_quota().await == 0 {
            return Err(ViewError::QuotaExhausted);
        }
        let remembered = self.sync.ledger().await.display_name;
        self.try_transition(|state| match state {
            ViewState::Browse { .. } => {
                *state = ViewState::Composing {
                    draft: Draft {
                        author_name: remembered,
                        content: String::new(),
                        offering: None,
                    },
                };
                Ok(())
            }
            s if s.editor_active() => Err(ViewError::EditorActive),
            _ => Err(ViewError::WrongState),
        })
    }

    /// Update the draft's author name.
    pub fn set_draft_author(&self, name: &str) -> Result<(), ViewError> {
        self.try_transition(|state| match state {
            ViewState::Composing { draft } => {
                draft.author_name = name.to_string();
                Ok(())
            }
            _ => Err(ViewError::WrongState),
        })
    }

    /// Update the draft's content.
    pub fn set_draft_content(&self, content: &str) -> Result<(), ViewError> {
        self.try_transition(|state| match state {
            ViewState::Composing { draft } => {
                draft.content = content.to_string();
                Ok(())
            }
            _ => Err(ViewError::WrongState),
        })
    }

    /// Attach an offering to the draft. Only kinds with a positive
    /// balance may be chosen; the balance itself moves at submission.
    pub async fn choose_offering(&self, kind: OfferingKind) -> Result<(), ViewError> {
        if self.sync.ledger().await.tokens.balance(kind) == 0 {
            return Err(ViewError::OfferingUnavailable(kind));
        }
        self.try_transition(|state| match state {
            ViewState::Composing { draft } => {
                draft.offering = Some(kind);
                Ok(())
            }
            _ => Err(ViewError::WrongState),
        })
    }

    /// Detach any offering from the draft.
    pub fn clear_offering(&self) -> Result<(), ViewError> {
        self.try_transition(|state| match state {
            ViewState::Composing { draft } => {
                draft.offering = None;
                Ok(())
            }
            _ => Err(ViewError::WrongState),
        })
    }

    /// Submit the open draft.
    ///
    /// On success the view moves to the timed celebration. On any
    /// failure - validation or remote - the compose surface stays open
    /// with the draft intact and the reason is only logged.
    pub async fn submit_draft(&self) -> Result<(), ViewError> {
        let draft = match &*self.state_tx.borrow() {
            ViewState::Composing { draft } => draft.clone(),
            _ => return Err(ViewError::WrongState),
        };

        match self
            .sync
            .submit(&draft.author_name, &draft.content, draft.offering)
            .await
        {
            Ok(receipt) => {
                let celebration = Celebration {
                    offering: draft.offering,
                    reply_text: receipt.post.ai_reply.clone(),
                    expires_at_millis: Utc::now().timestamp_millis() + CELEBRATION_MILLIS as i64,
                };
                self.state_tx.send_if_modified(|state| {
                    if state.is_composing() {
                        *state = ViewState::Celebrating { celebration };
                        true
                    } else {
                        false
                    }
                });
                self.arm_celebration_timer();
                Ok(())
            }
            Err(e) if e.is_validation() => {
                debug!(error = %e, "Submission rejected; compose stays open");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Submission failed; compose stays open");
                Ok(())
            }
        }
    }

    /// Close the compose surface, discarding the draft.
    pub fn cancel_compose(&self) -> Result<(), ViewError> {
        self.try_transition(|state| match state {
            ViewState::Composing { .. } => {
                *state = ViewState::Browse {
                    tab: BrowseTab::All,
                };
                Ok(())
            }
            _ => Err(ViewError::WrongState),
        })
    }

    /// Start editing one of this device's posts.
    ///
    /// Only reachable from the Mine tab, and only for owned posts. The
    /// edit draft starts from the post's content in the current feed
    /// snapshot.
    pub async fn begin_edit(&self, post_id: PostId) -> Result<(), ViewError> {
        self.cancel_celebration();
        if !self.sync.ledger().await.owns(&post_id) {
            return Err(ViewError::NotOwner);
        }
        let current = self
            .sync
            .current_feed()
            .iter()
            .find(|p| p.id == post_id)
            .map(|p| p.content.clone())
            .unwrap_or_default();
        self.try_transition(|state| match state {
            ViewState::Browse {
                tab: BrowseTab::Mine,
            } => {
                *state = ViewState::Editing {
                    post_id,
                    draft_content: current,
                };
                Ok(())
            }
            s if s.editor_active() => Err(ViewError::EditorActive),
            _ => Err(ViewError::WrongState),
        })
    }

    /// Update the edit draft's content.
    pub fn set_edit_content(&self, content: &str) -> Result<(), ViewError> {
        self.try_transition(|state| match state {
            ViewState::Editing { draft_content, .. } => {
                *draft_content = content.to_string();
                Ok(())
            }
            _ => Err(ViewError::WrongState),
        })
    }

    /// Save the open edit and return to the Mine tab.
    ///
    /// Failure keeps the editor open with the draft intact; the reason
    /// is only logged.
    pub async fn save_edit(&self) -> Result<(), ViewError> {
        let (post_id, draft_content) = match &*self.state_tx.borrow() {
            ViewState::Editing {
                post_id,
                draft_content,
            } => (*post_id, draft_content.clone()),
            _ => return Err(ViewError::WrongState),
        };

        match self.sync.edit(post_id, &draft_content).await {
            Ok(()) => {
                self.state_tx.send_if_modified(|state| {
                    if state.is_editing() {
                        *state = ViewState::Browse {
                            tab: BrowseTab::Mine,
                        };
                        true
                    } else {
                        false
                    }
                });
                Ok(())
            }
            Err(e) if e.is_validation() => {
                debug!(error = %e, "Edit rejected; editor stays open");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Edit failed; editor stays open");
                Ok(())
            }
        }
    }

    /// Close the edit surface without saving, back to the Mine tab.
    pub fn cancel_edit(&self) -> Result<(), ViewError> {
        self.try_transition(|state| match state {
            ViewState::Editing { .. } => {
                *state = ViewState::Browse {
                    tab: BrowseTab::Mine,
                };
                Ok(())
            }
            _ => Err(ViewError::WrongState),
        })
    }

    /// Dismiss a live celebration early. A no-op in any other state;
    /// every other interaction also dismisses it on its way through.
    pub fn dismiss_celebration(&self) {
        self.cancel_celebration();
    }

    /// Apply `f` to the state atomically. Watchers are only notified
    /// when the transition succeeds.
    fn try_transition(
        &self,
        f: impl FnOnce(&mut ViewState) -> Result<(), ViewError>,
    ) -> Result<(), ViewError> {
        let mut result = Ok(());
        self.state_tx.send_if_modified(|state| {
            result = f(state);
            result.is_ok()
        });
        result
    }

    /// Arm the one-shot fallback timer for a fresh celebration,
    /// replacing (and disarming) any previous one.
    fn arm_celebration_timer(&self) {
        let state_tx = self.state_tx.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(CELEBRATION_MILLIS)).await;
            let expired = state_tx.send_if_modified(|state| {
                if state.is_celebrating() {
                    *state = ViewState::Browse {
                        tab: BrowseTab::All,
                    };
                    true
                } else {
                    false
                }
            });
            if expired {
                debug!("Celebration expired back to browse");
            }
        });

        let mut guard = self.lock_timer();
        if let Some(old) = guard.replace(handle) {
            old.abort();
        }
    }

    /// Disarm the timer and leave a live celebration immediately.
    fn cancel_celebration(&self) {
        if let Some(handle) = self.lock_timer().take() {
            handle.abort();
        }
        self.state_tx.send_if_modified(|state| {
            if state.is_celebrating() {
                *state = ViewState::Browse {
                    tab: BrowseTab::All,
                };
                true
            } else {
                false
            }
        });
    }

    fn lock_timer(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        // A poisoned lock only means a panicked timer task; the handle
        // inside is still sound.
        self.celebration_timer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for ViewCoordinator {
    fn drop(&mut self) {
        if let Some(handle) = self.lock_timer().take() {
            handle.abort();
        }
    }
}
