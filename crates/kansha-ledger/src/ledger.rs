//! The ledger value and its partial-write patch.
//!
//! Everything the wall remembers about one device: the last-used display
//! name, which posts this device created or marked, the all-time virtue
//! count, offering balances, and today's quota usage. The ledger is
//! private bookkeeping; losing it never corrupts the shared wall.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use kansha_core::{OfferingKind, PostId};

/// Offering token balances, one counter per kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenBalances {
    /// Rice balls on hand.
    pub rice_balls: u32,
    /// Dumplings on hand.
    pub dumplings: u32,
}

impl TokenBalances {
    /// Balance for one kind.
    pub fn balance(&self, kind: OfferingKind) -> u32 {
        match kind {
            OfferingKind::RiceBall => self.rice_balls,
            OfferingKind::Dumpling => self.dumplings,
        }
    }

    /// Add one token of `kind`.
    pub fn grant(&mut self, kind: OfferingKind) {
        match kind {
            OfferingKind::RiceBall => self.rice_balls += 1,
            OfferingKind::Dumpling => self.dumplings += 1,
        }
    }

    /// Remove one token of `kind`.
    ///
    /// Callers must have checked `balance(kind) > 0` before offering;
    /// there is no floor at zero here. The submission path enforces the
    /// check before any remote write.
    pub fn spend(&mut self, kind: OfferingKind) {
        debug_assert!(self.balance(kind) > 0, "offering spent with empty balance");
        match kind {
            OfferingKind::RiceBall => self.rice_balls -= 1,
            OfferingKind::Dumpling => self.dumplings -= 1,
        }
    }

    /// True when no kind has any balance.
    pub fn is_empty(&self) -> bool {
        self.rice_balls == 0 && self.dumplings == 0
    }
}

/// The local, per-device ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    /// Last-used author name; prefills the next compose draft.
    pub display_name: String,
    /// Posts created from this device.
    pub owned_post_ids: BTreeSet<PostId>,
    /// Posts this user marked, their own or anyone else's.
    pub favorite_post_ids: BTreeSet<PostId>,
    /// All-time count of successful submissions from this device.
    pub virtue: u64,
    /// Offering tokens on hand.
    pub tokens: TokenBalances,
    /// Submissions recorded for `daily_post_date`.
    pub daily_post_count: u32,
    /// The calendar date `daily_post_count` belongs to. Any other date
    /// means the count is stale and reads as zero.
    pub daily_post_date: Option<NaiveDate>,
}

impl Ledger {
    /// Whether this device created the given post.
    pub fn owns(&self, id: &PostId) -> bool {
        self.owned_post_ids.contains(id)
    }

    /// Whether the given post is in the favorites set.
    pub fn is_favorite(&self, id: &PostId) -> bool {
        self.favorite_post_ids.contains(id)
    }
}

/// A partial ledger mutation.
///
/// Only the fields set on the patch are written back, each under its own
/// storage key; everything else on disk stays untouched. Built with the
/// same chained setters the rest of the workspace uses.
#[derive(Debug, Clone, Default)]
pub struct LedgerPatch {
    pub(crate) display_name: Option<String>,
    pub(crate) owned_post_ids: Option<BTreeSet<PostId>>,
    pub(crate) favorite_post_ids: Option<BTreeSet<PostId>>,
    pub(crate) virtue: Option<u64>,
    pub(crate) tokens: Option<TokenBalances>,
    pub(crate) daily: Option<(u32, NaiveDate)>,
}

impl LedgerPatch {
    /// Start an empty patch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the remembered display name.
    pub fn display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Replace the owned-post set.
    pub fn owned_post_ids(mut self, ids: BTreeSet<PostId>) -> Self {
        self.owned_post_ids = Some(ids);
        self
    }

    /// Replace the favorites set.
    pub fn favorite_post_ids(mut self, ids: BTreeSet<PostId>) -> Self {
        self.favorite_post_ids = Some(ids);
        self
    }

    /// Set the all-time virtue count.
    pub fn virtue(mut self, virtue: u64) -> Self {
        self.virtue = Some(virtue);
        self
    }

    /// Set both token balances.
    pub fn tokens(mut self, tokens: TokenBalances) -> Self {
        self.tokens = Some(tokens);
        self
    }

    /// Set the daily quota pair (count and the date it belongs to).
    pub fn daily_quota(mut self, count: u32, date: NaiveDate) -> Self {
        self.daily = Some((count, date));
        self
    }

    /// True when the patch names no fields at all.
    pub fn is_unchanged(&self) -> bool {
        self.display_name.is_none()
            && self.owned_post_ids.is_none()
            && self.favorite_post_ids.is_none()
            && self.virtue.is_none()
            && self.tokens.is_none()
            && self.daily.is_none()
    }
}
