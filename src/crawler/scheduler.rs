//! Scheduler for managing the crawl frontier and pacing
//!
//! This module handles:
//! - The FIFO frontier of `(url, depth, parent)` entries
//! - The visited-set that deduplicates URLs at dequeue time
//! - Depth and page-budget enforcement
//! - The cancellable pause between requests

use crate::state::NodeId;
use std::collections::{HashSet, VecDeque};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

/// A URL waiting in the frontier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedUrl {
    /// Normalized URL to fetch
    pub url: Url,

    /// BFS depth the page will have
    pub depth: u32,

    /// Node the page was discovered on; None for the seed
    pub parent: Option<NodeId>,
}

/// Breadth-first frontier with global dedup
///
/// Duplicates may be enqueued freely; only the first dequeue of a URL wins.
#[derive(Debug)]
pub struct Scheduler {
    /// Pending entries in discovery order
    frontier: VecDeque<QueuedUrl>,

    /// Normalized URLs already dequeued
    visited: HashSet<String>,

    max_depth: u32,
    max_pages: usize,
}

impl Scheduler {
    /// Creates a scheduler whose frontier holds only the seed
    pub fn new(seed: Url, max_depth: u32, max_pages: usize) -> Self {
        let mut frontier = VecDeque::new();
        frontier.push_back(QueuedUrl {
            url: seed,
            depth: 0,
            parent: None,
        });

        Self {
            frontier,
            visited: HashSet::new(),
            max_depth,
            max_pages,
        }
    }

    /// Appends a discovered link to the back of the frontier
    ///
    /// Links to already-visited URLs are dropped here; anything else is
    /// rechecked on dequeue.
    pub fn enqueue(&mut self, url: Url, depth: u32, parent: NodeId) {
        if self.is_visited(&url) {
            tracing::trace!("Dropping already visited link {}", url);
            return;
        }
        self.frontier.push_back(QueuedUrl {
            url,
            depth,
            parent: Some(parent),
        });
    }

    /// Pops the next URL to process and marks it visited
    ///
    /// Returns None once the frontier is empty or the page budget is spent.
    /// Entries already visited, or deeper than the depth bound, are skipped.
    pub fn next_url(&mut self) -> Option<QueuedUrl> {
        while self.visited.len() < self.max_pages {
            let queued = self.frontier.pop_front()?;

            if queued.depth > self.max_depth {
                tracing::trace!("Skipping {} beyond max depth", queued.url);
                continue;
            }
            if !self.visited.insert(queued.url.as_str().to_string()) {
                tracing::trace!("Skipping already visited {}", queued.url);
                continue;
            }

            return Some(queued);
        }
        None
    }

    /// True if further links discovered at `depth` may be followed
    pub fn can_expand(&self, depth: u32) -> bool {
        depth < self.max_depth
    }

    pub fn is_visited(&self, url: &Url) -> bool {
        self.visited.contains(url.as_str())
    }

    /// Number of URLs dequeued so far
    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    /// Number of entries still waiting, duplicates included
    pub fn frontier_len(&self) -> usize {
        self.frontier.len()
    }

    pub fn max_pages(&self) -> usize {
        self.max_pages
    }
}

/// Sleeps for `delay` unless the token is cancelled first
///
/// Returns false if the pause was cut short by cancellation.
pub async fn pause(delay: Duration, cancel: &CancellationToken) -> bool {
    if delay.is_zero() {
        return !cancel.is_cancelled();
    }

    tokio::select! {
        biased;
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(delay) => true,
    }
}
