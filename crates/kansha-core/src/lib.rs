//! # Kansha Core
//!
//! Shared domain types for the Kansha gratitude wall.
//!
//! This crate defines the vocabulary the other kansha crates speak:
//!
//! - **Post**: one gratitude note on the shared wall, with its identifier
//! - **OfferingKind**: the consumable tokens a submission can attach, and
//!   the fixed reply text each one earns
//!
//! Everything here is plain data. Storage, synchronization, and view
//! concerns live in the crates above this one.

pub mod offering;
pub mod post;

pub use offering::OfferingKind;
pub use post::{NewPost, Post, PostId, generate_post_id};
