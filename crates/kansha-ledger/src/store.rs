//! Field-per-key persistence for the ledger.
//!
//! Every ledger field lives under its own storage key as plain text:
//! counters in decimal, id sets as JSON arrays of hex ids, the quota
//! date as `YYYY-MM-DD`. A value that fails to parse degrades to that
//! field's zero value instead of failing the whole load, so one corrupt
//! key never takes the rest of the ledger with it.

use std::collections::BTreeSet;
use std::str::FromStr;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, warn};

use kansha_core::PostId;
use kansha_core::post::{post_id_from_hex, post_id_to_hex};
use kansha_storage::{KeyValueStore, StorageError};

use crate::ledger::{Ledger, LedgerPatch, TokenBalances};

/// Storage keys, one per ledger field.
pub mod keys {
    /// Last-used display name.
    pub const DISPLAY_NAME: &str = "wall.display_name";
    /// JSON array of hex ids created from this device.
    pub const OWNED_POSTS: &str = "wall.owned_posts";
    /// JSON array of hex ids marked as favorites.
    pub const FAVORITE_POSTS: &str = "wall.favorite_posts";
    /// All-time virtue count, decimal.
    pub const VIRTUE: &str = "wall.virtue";
    /// Rice ball balance, decimal.
    pub const RICE_BALLS: &str = "wall.tokens.rice_ball";
    /// Dumpling balance, decimal.
    pub const DUMPLINGS: &str = "wall.tokens.dumpling";
    /// Submissions recorded for the stored date, decimal.
    pub const DAILY_COUNT: &str = "wall.daily_post_count";
    /// Date the daily count belongs to, `YYYY-MM-DD`.
    pub const DAILY_DATE: &str = "wall.daily_post_date";
}

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Loads and saves the ledger over any [`KeyValueStore`].
#[derive(Clone)]
pub struct LedgerStore {
    kv: Arc<dyn KeyValueStore>,
}

impl LedgerStore {
    /// Wrap a key-value store.
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// Read every ledger field, substituting each missing or unparseable
    /// value with its default independently.
    pub async fn load(&self) -> Result<Ledger, StorageError> {
        let display_name = self.kv.get(keys::DISPLAY_NAME).await?.unwrap_or_default();
        let owned_post_ids = parse_id_set(self.kv.get(keys::OWNED_POSTS).await?, keys::OWNED_POSTS);
        let favorite_post_ids = parse_id_set(
            self.kv.get(keys::FAVORITE_POSTS).await?,
            keys::FAVORITE_POSTS,
        );
        let virtue = parse_number(self.kv.get(keys::VIRTUE).await?, keys::VIRTUE);
        let tokens = TokenBalances {
            rice_balls: parse_number(self.kv.get(keys::RICE_BALLS).await?, keys::RICE_BALLS),
            dumplings: parse_number(self.kv.get(keys::DUMPLINGS).await?, keys::DUMPLINGS),
        };
        let daily_post_count = parse_number(self.kv.get(keys::DAILY_COUNT).await?, keys::DAILY_COUNT);
        let daily_post_date = parse_date(self.kv.get(keys::DAILY_DATE).await?, keys::DAILY_DATE);

        let ledger = Ledger {
            display_name,
            owned_post_ids,
            favorite_post_ids,
            virtue,
            tokens,
            daily_post_count,
            daily_post_date,
        };
        debug!(
            virtue = ledger.virtue,
            owned = ledger.owned_post_ids.len(),
            favorites = ledger.favorite_post_ids.len(),
            "Loaded ledger"
        );
        Ok(ledger)
    }

    /// Write back only the fields the patch names, each under its own key.
    pub async fn save(&self, patch: &LedgerPatch) -> Result<(), StorageError> {
        if let Some(name) = &patch.display_name {
            self.kv.set(keys::DISPLAY_NAME, name).await?;
        }
        if let Some(ids) = &patch.owned_post_ids {
            self.kv.set(keys::OWNED_POSTS, &encode_id_set(ids)).await?;
        }
        if let Some(ids) = &patch.favorite_post_ids {
            self.kv
                .set(keys::FAVORITE_POSTS, &encode_id_set(ids))
                .await?;
        }
        if let Some(virtue) = patch.virtue {
            self.kv.set(keys::VIRTUE, &virtue.to_string()).await?;
        }
        if let Some(tokens) = patch.tokens {
            self.kv
                .set(keys::RICE_BALLS, &tokens.rice_balls.to_string())
                .await?;
            self.kv
                .set(keys::DUMPLINGS, &tokens.dumplings.to_string())
                .await?;
        }
        if let Some((count, date)) = patch.daily {
            self.kv.set(keys::DAILY_COUNT, &count.to_string()).await?;
            self.kv
                .set(keys::DAILY_DATE, &date.format(DATE_FORMAT).to_string())
                .await?;
        }
        Ok(())
    }
}

fn parse_number<T: FromStr + Default>(raw: Option<String>, key: &str) -> T {
    let Some(raw) = raw else {
        return T::default();
    };
    match raw.trim().parse() {
        Ok(value) => value,
        Err(_) => {
            warn!(key, raw, "Discarding unparseable counter");
            T::default()
        }
    }
}

fn parse_date(raw: Option<String>, key: &str) -> Option<NaiveDate> {
    let raw = raw?;
    match NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT) {
        Ok(date) => Some(date),
        Err(_) => {
            warn!(key, raw, "Discarding unparseable date");
            None
        }
    }
}

fn parse_id_set(raw: Option<String>, key: &str) -> BTreeSet<PostId> {
    let Some(raw) = raw else {
        return BTreeSet::new();
    };
    let entries: Vec<String> = match serde_json::from_str(&raw) {
        Ok(entries) => entries,
        Err(_) => {
            warn!(key, "Discarding unparseable id set");
            return BTreeSet::new();
        }
    };
    let total = entries.len();
    let ids: BTreeSet<PostId> = entries.iter().filter_map(|s| post_id_from_hex(s)).collect();
    if ids.len() < total {
        warn!(key, dropped = total - ids.len(), "Dropped malformed ids");
    }
    ids
}

fn encode_id_set(ids: &BTreeSet<PostId>) -> String {
    let hex: Vec<String> = ids.iter().map(post_id_to_hex).collect();
    // Serializing a Vec<String> cannot fail
    serde_json::to_string(&hex).unwrap_or_else(|_| "[]".to_string())
}
