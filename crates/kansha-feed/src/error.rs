//! Error types for kansha-feed

use kansha_core::OfferingKind;
use kansha_storage::StorageError;
use thiserror::Error;

/// Errors that can occur while synchronizing the shared feed.
#[derive(Debug, Error)]
pub enum FeedError {
    /// Author name was empty after trimming
    #[error("Author name is empty")]
    EmptyAuthor,

    /// Post content was empty after trimming
    #[error("Post content is empty")]
    EmptyContent,

    /// Today's submission allowance is used up
    #[error("Daily post quota exhausted")]
    QuotaExhausted,

    /// The chosen offering has no balance to spend
    #[error("No {0} tokens to offer")]
    OfferingUnavailable(OfferingKind),

    /// Another submission from this session is still in flight
    #[error("A submission is already in flight")]
    SubmitInFlight,

    /// The post does not belong to this device
    #[error("Post is not owned by this device")]
    NotOwner,

    /// No post with the given id exists in the store
    #[error("Post not found: {0}")]
    PostNotFound(String),

    /// The post store failed or rejected an operation
    #[error("Post store error: {0}")]
    Backend(String),

    /// Local ledger storage failed
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl FeedError {
    /// Create a backend error with a message
    pub fn backend(message: impl Into<String>) -> Self {
        FeedError::Backend(message.into())
    }

    /// True for rejections decided locally, before any remote call.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            FeedError::EmptyAuthor
                | FeedError::EmptyContent
                | FeedError::QuotaExhausted
                | FeedError::OfferingUnavailable(_)
                | FeedError::SubmitInFlight
                | FeedError::NotOwner
        )
    }
}
