//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with cooperative cancellation
//! - HTML parsing and metadata extraction
//! - The breadth-first frontier and pacing
//! - Per-crawl session orchestration

mod extractor;
mod fetcher;
mod scheduler;
mod session;

pub use extractor::{
    extract, is_html_content_type, url_title, ContentStats, MetaTags, PageFields, UNTITLED_PAGE,
};
pub use fetcher::{
    build_http_client, fetch_page, normalize_content_type, FetchError, FetchedPage,
    DEFAULT_CONTENT_TYPE,
};
pub use scheduler::{pause, QueuedUrl, Scheduler};
pub use session::{CrawlProgress, CrawlSession, Crawler, SitemapData, ROBOTS_DISALLOWED};
