//! Offering kinds and their fixed replies.
//!
//! An offering is a consumable token a device earns through steady
//! posting. Spending one on a submission attaches that kind's fixed
//! thank-you reply to the created post, visible to everyone.

use serde::{Deserialize, Serialize};

/// The two offering kinds a device can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OfferingKind {
    /// Rice ball (おにぎり) - the common offering.
    RiceBall,
    /// Dumpling (おだんご) - the rarer offering.
    Dumpling,
}

impl OfferingKind {
    /// Every kind, in unlock order.
    pub const ALL: [OfferingKind; 2] = [OfferingKind::RiceBall, OfferingKind::Dumpling];

    /// The fixed reply attached to a post when this kind is offered.
    ///
    /// One canonical string per kind; the reply is chosen at submission
    /// time and never changes afterwards.
    pub fn reply_text(&self) -> &'static str {
        match self {
            OfferingKind::RiceBall => {
                "おにぎりのお供え、ありがとうございます。あなたの感謝の心が、あたたかく伝わってきます。"
            }
            OfferingKind::Dumpling => {
                "おだんごのお供え、ありがとうございます。その優しい気持ちが、きっと誰かを照らしています。"
            }
        }
    }

    /// Short English label, used by terminal frontends.
    pub fn label(&self) -> &'static str {
        match self {
            OfferingKind::RiceBall => "rice ball",
            OfferingKind::Dumpling => "dumpling",
        }
    }

    /// The emoji glyph frontends draw for this kind.
    pub fn glyph(&self) -> &'static str {
        match self {
            OfferingKind::RiceBall => "🍙",
            OfferingKind::Dumpling => "🍡",
        }
    }
}

impl std::fmt::Display for OfferingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replies_are_fixed_and_distinct() {
        let rice = OfferingKind::RiceBall.reply_text();
        let dumpling = OfferingKind::Dumpling.reply_text();
        assert!(!rice.is_empty());
        assert!(!dumpling.is_empty());
        assert_ne!(rice, dumpling);
        // Same kind always yields the same reply
        assert_eq!(rice, OfferingKind::RiceBall.reply_text());
    }

    #[test]
    fn display_uses_label() {
        assert_eq!(OfferingKind::RiceBall.to_string(), "rice ball");
        assert_eq!(OfferingKind::Dumpling.to_string(), "dumpling");
    }

    #[test]
    fn all_lists_every_kind() {
        assert_eq!(OfferingKind::ALL.len(), 2);
        assert!(OfferingKind::ALL.contains(&OfferingKind::RiceBall));
        assert!(OfferingKind::ALL.contains(&OfferingKind::Dumpling));
    }
}
