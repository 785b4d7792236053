//! Daily submission quota.
//!
//! The wall allows a fixed number of posts per device per local calendar
//! day. The ledger stores a count and the date it belongs to; a date
//! mismatch means a fresh day and the count reads as zero. The tracker
//! only ever moves forward - edits and favorites never give quota back,
//! and nothing decrements the count.
//!
//! `today` is always passed in by the caller (taken from the device
//! clock at the call site), which keeps these functions pure. A device
//! clock rolled backwards can reset or inflate the count; that weak
//! guarantee is accepted.

use chrono::NaiveDate;

use crate::ledger::Ledger;

/// Posts allowed per device per calendar day.
pub const DAILY_POST_LIMIT: u32 = 5;

/// How many submissions the ledger has recorded for `today`.
pub fn used_today(ledger: &Ledger, today: NaiveDate) -> u32 {
    if ledger.daily_post_date == Some(today) {
        ledger.daily_post_count
    } else {
        0
    }
}

/// Submissions still available for `today`.
pub fn remaining_quota(ledger: &Ledger, today: NaiveDate) -> u32 {
    DAILY_POST_LIMIT.saturating_sub(used_today(ledger, today))
}

/// The count/date pair to record after one more successful submission.
///
/// A stale date starts the fresh day at 1.
pub fn record_post(ledger: &Ledger, today: NaiveDate) -> (u32, NaiveDate) {
    if ledger.daily_post_date == Some(today) {
        (ledger.daily_post_count + 1, today)
    } else {
        (1, today)
    }
}
