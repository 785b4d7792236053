//! View state for the wall interface.
//!
//! One tagged value covers every mode the interface can be in, so the
//! impossible combinations (composing while editing, two editors at
//! once) cannot even be represented. The coordinator owns the single
//! value of this type and is its only writer; frontends observe it
//! through a watch channel and render whatever it says.

use kansha_core::{OfferingKind, PostId};

/// Which slice of the feed the browse mode shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BrowseTab {
    /// Everyone's posts.
    #[default]
    All,
    /// Only posts this device created.
    Mine,
}

/// A post being written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    /// Author name, prefilled from the ledger's remembered name.
    pub author_name: String,
    /// The gratitude text so far.
    pub content: String,
    /// The offering to spend on submission, if any.
    pub offering: Option<OfferingKind>,
}

/// What the post-submission celebration shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Celebration {
    /// The offering the submission spent, if any.
    pub offering: Option<OfferingKind>,
    /// The fixed reply that offering earned, if any.
    pub reply_text: Option<String>,
    /// When the celebration window closes (Unix millis).
    pub expires_at_millis: i64,
}

/// The single view-state value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewState {
    /// Reading the wall.
    Browse {
        /// The selected tab.
        tab: BrowseTab,
    },
    /// Writing a new post.
    Composing {
        /// The draft under construction.
        draft: Draft,
    },
    /// Rewriting one of this device's posts.
    Editing {
        /// Which post is being rewritten.
        post_id: PostId,
        /// The replacement content so far.
        draft_content: String,
    },
    /// The timed display shown right after a successful submission.
    Celebrating {
        /// What to show.
        celebration: Celebration,
    },
}

impl Default for ViewState {
    fn default() -> Self {
        ViewState::Browse {
            tab: BrowseTab::All,
        }
    }
}

impl ViewState {
    /// True in either browse tab.
    pub fn is_browse(&self) -> bool {
        matches!(self, ViewState::Browse { .. })
    }

    /// True while the compose surface is open.
    pub fn is_composing(&self) -> bool {
        matches!(self, ViewState::Composing { .. })
    }

    /// True while an edit surface is open.
    pub fn is_editing(&self) -> bool {
        matches!(self, ViewState::Editing { .. })
    }

    /// True while the celebration is up.
    pub fn is_celebrating(&self) -> bool {
        matches!(self, ViewState::Celebrating { .. })
    }

    /// True while either writing surface (compose or edit) is open.
    pub fn editor_active(&self) -> bool {
        self.is_composing() || self.is_editing()
    }
}
