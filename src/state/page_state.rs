//! Page state definitions for tracking crawl outcomes
//!
//! Every URL dispatched to a worker ends in exactly one of these states.
use std::fmt;

/// Final state of a visited page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PageState {
    // ===== Terminal Success States =====
    /// Page was fetched and matched a detection rule
    Classified,

    /// Page was fetched but no detection rule matched
    Unmatched,

    // ===== Terminal Error States =====
    /// Page returned HTTP 404 or 410
    DeadLink,

    /// Page returned HTTP 429
    RateLimited,

    /// Page could not be reached (DNS failure, connection refused, timeout)
    Unreachable,

    /// Page fetch failed for other reasons (other HTTP errors, unreadable body)
    Failed,
}

impl PageState {
    /// Every state, in display order
    pub const ALL: [PageState; 6] = [
        Self::Classified,
        Self::Unmatched,
        Self::DeadLink,
        Self::RateLimited,
        Self::Unreachable,
        Self::Failed,
    ];

    /// Returns true if the page was fetched successfully
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Classified | Self::Unmatched)
    }

    /// Returns true if this represents an error state
    pub fn is_error(&self) -> bool {
        !self.is_success()
    }

    /// Converts this state to its string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Classified => "classified",
            Self::Unmatched => "unmatched",
            Self::DeadLink => "dead_link",
            Self::RateLimited => "rate_limited",
            Self::Unreachable => "unreachable",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for PageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
