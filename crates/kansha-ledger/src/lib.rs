//! # Kansha Ledger
//!
//! The local, per-device ledger for the gratitude wall: remembered
//! identity, ownership and favorites bookkeeping, virtue points,
//! offering token balances, and the daily submission quota.
//!
//! ## Features
//!
//! - **Ledger / TokenBalances**: the in-memory ledger value
//! - **LedgerPatch**: partial write-back, one storage key per field
//! - **LedgerStore**: persistence over any [`kansha_storage::KeyValueStore`]
//! - **quota**: the rolling daily submission limit
//! - **reward**: virtue and token accrual rules
//!
//! Nothing in the ledger is authoritative beyond the one device that
//! wrote it; the shared post store never sees any of these values.

pub mod ledger;
pub mod quota;
pub mod reward;
pub mod store;

// Re-exports
pub use ledger::{Ledger, LedgerPatch, TokenBalances};
pub use quota::{DAILY_POST_LIMIT, record_post, remaining_quota, used_today};
pub use reward::{
    DUMPLING_INTERVAL, RICE_BALL_INTERVAL, RewardOutcome, apply_submission_reward,
};
pub use store::LedgerStore;
