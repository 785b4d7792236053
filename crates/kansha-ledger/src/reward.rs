//! Reward progression for successful submissions.
//!
//! Virtue counts every successful submission from this device, forever;
//! it never decreases and the daily quota does not cap it. Every 3rd
//! submission unlocks a rice ball and every 10th a dumpling. Both checks
//! run on the same submission, so a multiple of 30 grants both at once.
//!
//! When the submission itself spent an offering, that balance drops by
//! one after the grants are applied - spending and earning the same kind
//! on one submission is a normal outcome, not a conflict.

use kansha_core::OfferingKind;

use crate::ledger::Ledger;

/// Every `RICE_BALL_INTERVAL`-th submission grants a rice ball.
pub const RICE_BALL_INTERVAL: u64 = 3;

/// Every `DUMPLING_INTERVAL`-th submission grants a dumpling.
pub const DUMPLING_INTERVAL: u64 = 10;

/// What one submission earned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewardOutcome {
    /// The virtue count after this submission.
    pub virtue: u64,
    /// Tokens unlocked by this submission, in grant order.
    pub unlocked: Vec<OfferingKind>,
}

/// Apply one successful submission to the ledger.
///
/// Runs to completion on the in-memory ledger: increment virtue, grant
/// any tokens the new count unlocks, then consume `spent` (if any).
/// Balances are not floored at zero; the submission path only accepts an
/// offering while its balance is positive (see
/// [`TokenBalances::spend`](crate::ledger::TokenBalances::spend)).
pub fn apply_submission_reward(ledger: &mut Ledger, spent: Option<OfferingKind>) -> RewardOutcome {
    ledger.virtue += 1;

    let mut unlocked = Vec::new();
    if ledger.virtue % RICE_BALL_INTERVAL == 0 {
        ledger.tokens.grant(OfferingKind::RiceBall);
        unlocked.push(OfferingKind::RiceBall);
    }
    if ledger.virtue % DUMPLING_INTERVAL == 0 {
        ledger.tokens.grant(OfferingKind::Dumpling);
        unlocked.push(OfferingKind::Dumpling);
    }

    if let Some(kind) = spent {
        ledger.tokens.spend(kind);
    }

    RewardOutcome {
        virtue: ledger.virtue,
        unlocked,
    }
}
