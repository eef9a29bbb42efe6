/// Page status definitions for tracking crawl progress
///
/// Every URL moves through `pending → crawling → {completed | error}` exactly
/// once. Terminal states are final; there are no retries.
use serde::Serialize;
use std::fmt;

/// Represents the current status of a page in the crawl process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PageStatus {
    /// Page is known but has not been dequeued yet
    Pending,

    /// Page is being fetched and parsed
    Crawling,

    /// Page was fetched and processed
    Completed,

    /// Page could not be fetched, or robots.txt disallowed it
    Error,
}

impl PageStatus {
    /// Returns true if this is a terminal status
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }

    /// Returns true if moving from `self` to `next` is a legal transition
    ///
    /// `pending → error` covers pages rejected before any fetch starts
    /// (robots.txt disallow, cancellation).
    pub fn can_transition_to(&self, next: PageStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Crawling)
                | (Self::Pending, Self::Error)
                | (Self::Crawling, Self::Completed)
                | (Self::Crawling, Self::Error)
        )
    }

    /// Returns the wire representation of the status
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Crawling => "crawling",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for PageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
