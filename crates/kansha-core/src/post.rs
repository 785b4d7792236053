//! Post - a single gratitude note on the shared wall.
//!
//! Posts live in the shared post store and are visible to every device.
//! The store assigns both the identity and the creation timestamp;
//! clients only ever supply the text fields (see [`NewPost`]).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for a post (16 bytes).
pub type PostId = [u8; 16];

/// Generate a new unique post ID.
pub fn generate_post_id() -> PostId {
    use std::time::{SystemTime, UNIX_EPOCH};

    let mut id = [0u8; 16];

    // Use timestamp for first 8 bytes (uniqueness over time)
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64;
    id[..8].copy_from_slice(&timestamp.to_le_bytes());

    // Use random bytes for the rest (uniqueness within the same nanosecond)
    let noise: u64 = rand::random();
    id[8..].copy_from_slice(&noise.to_le_bytes());

    id
}

/// Encode a post ID as lowercase hex for text-facing surfaces.
pub fn post_id_to_hex(id: &PostId) -> String {
    hex::encode(id)
}

/// Parse a post ID back from its hex form. Returns `None` for anything
/// that is not exactly 16 hex-encoded bytes.
pub fn post_id_from_hex(s: &str) -> Option<PostId> {
    let bytes = hex::decode(s.trim()).ok()?;
    bytes.try_into().ok()
}

/// A post - one gratitude note on the shared wall.
///
/// `id` and `created_at_millis` are immutable once assigned. `content`
/// may be rewritten in place by the owning device; everything else is
/// fixed at creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Post {
    /// Unique identifier, assigned by the store at creation.
    pub id: PostId,
    /// Display name the author chose for this post.
    pub author_name: String,
    /// The gratitude text.
    pub content: String,
    /// Fixed reply attached at creation when the submission spent an
    /// offering. `None` means no offering was made.
    pub ai_reply: Option<String>,
    /// When the store created the post (Unix timestamp in milliseconds).
    pub created_at_millis: i64,
}

impl Post {
    /// The creation instant as a UTC datetime.
    pub fn created_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.created_at_millis).unwrap_or_default()
    }
}

/// The client-supplied fields of a post about to be created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewPost {
    /// Display name to publish with the post.
    pub author_name: String,
    /// The gratitude text.
    pub content: String,
    /// Fixed reply to attach, when the submission spent an offering.
    pub ai_reply: Option<String>,
}

impl NewPost {
    /// Create a new post payload without an offering reply.
    pub fn new(author_name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            author_name: author_name.into(),
            content: content.into(),
            ai_reply: None,
        }
    }
}
