//! URL handling module for Sitemapper
//!
//! This module provides URL normalization and the internal-link rule that
//! decides which discovered links join the crawl frontier.

mod domain;
mod normalize;

use url::Url;

// Re-export main functions
pub use domain::same_site;
pub use normalize::{normalize_parsed, normalize_url};

/// Classification of a link found on a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkKind {
    /// Same scheme and host as the page it was found on
    Internal,
    /// Resolves to an http(s) URL on another site
    External,
    /// Anchors, `javascript:`, `mailto:`, other schemes, malformed hrefs
    Ignored,
}

/// Returns true if the raw href is never a crawlable page link
fn is_non_navigational(candidate: &str) -> bool {
    let lower = candidate.trim_start().to_ascii_lowercase();
    lower.starts_with('#') || lower.starts_with("javascript:") || lower.starts_with("mailto:")
}

/// Resolves a candidate href relative to a base URL
///
/// Returns None if the href is empty or cannot be resolved.
pub fn resolve_link(candidate: &str, base: &Url) -> Option<Url> {
    let candidate = candidate.trim();
    if candidate.is_empty() {
        return None;
    }
    base.join(candidate).ok()
}

/// Classifies a candidate href found on a page
///
/// # Arguments
///
/// * `candidate` - The raw href value
/// * `base` - The URL of the page the href was found on
pub fn classify_link(candidate: &str, base: &Url) -> LinkKind {
    if is_non_navigational(candidate) {
        return LinkKind::Ignored;
    }

    let Some(resolved) = resolve_link(candidate, base) else {
        return LinkKind::Ignored;
    };

    if same_site(&resolved, base) {
        LinkKind::Internal
    } else if matches!(resolved.scheme(), "http" | "https") {
        LinkKind::External
    } else {
        LinkKind::Ignored
    }
}

/// Decides whether a candidate href is an internal page link
///
/// The candidate is resolved relative to `base_url`. Resolution failures,
/// scheme or hostname mismatches, fragment-only links, `javascript:` and
/// `mailto:` links all yield false. This never fails.
///
/// # Examples
///
/// ```
/// use sitemapper::url::is_internal_link;
///
/// assert!(is_internal_link("/about", "https://example.com/"));
/// assert!(!is_internal_link("https://other.com/", "https://example.com/"));
/// assert!(!is_internal_link("#top", "https://example.com/"));
/// assert!(!is_internal_link("http://example.com/", "https://example.com/"));
/// ```
pub fn is_internal_link(candidate: &str, base_url: &str) -> bool {
    match Url::parse(base_url) {
        Ok(base) => classify_link(candidate, &base) == LinkKind::Internal,
        Err(_) => false,
    }
}
