//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `PageStatus`: the per-URL state machine (pending, crawling, completed, error)
//! - `SiteTree`: the arena of page nodes built by the crawl

mod page_status;
mod site_tree;

// Re-export main types
pub use page_status::PageStatus;
pub use site_tree::{NodeId, NodeView, PageNode, PreOrder, SiteTree};
