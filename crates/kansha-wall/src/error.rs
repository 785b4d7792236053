//! Error types for kansha-wall

use kansha_core::OfferingKind;
use thiserror::Error;

/// Rejected view transitions.
///
/// These are the locally-decided rejections a frontend renders as a
/// disabled control or a quiet refusal. Remote failures never surface
/// here; the coordinator logs them and leaves the view where it was.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ViewError {
    /// Today's submission allowance is used up
    #[error("Daily post quota exhausted")]
    QuotaExhausted,

    /// A compose or edit surface is already open
    #[error("An editor is already open")]
    EditorActive,

    /// The transition is not allowed from the current view
    #[error("Transition not allowed from the current view")]
    WrongState,

    /// The post does not belong to this device
    #[error("Post is not owned by this device")]
    NotOwner,

    /// The chosen offering has no balance to spend
    #[error("No {0} tokens to offer")]
    OfferingUnavailable(OfferingKind),
}
