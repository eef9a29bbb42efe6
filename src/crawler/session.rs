//! Crawl orchestration
//!
//! [`Crawler`] is the long-lived handle a caller keeps: it owns the HTTP
//! client and the stop signal. Every call to [`Crawler::crawl`] builds a
//! fresh [`CrawlSession`] that owns the frontier, the visited-set and the
//! node tree for exactly one crawl.

use crate::analysis::{analyze_meta, analyze_structure, MetaAnalysis, StructureAnalysis};
use crate::config::{validate, Config, CrawlOptions, MAX_DELAY_MS};
use crate::crawler::extractor::{extract, is_html_content_type, url_title, UNTITLED_PAGE};
use crate::crawler::fetcher::{build_http_client, fetch_page, FetchError, FetchedPage};
use crate::crawler::scheduler::{pause, QueuedUrl, Scheduler};
use crate::robots::{fetch_robots, RobotsPolicy};
use crate::state::{NodeId, PageStatus, SiteTree};
use crate::url::normalize_url;
use crate::SitemapError;
use chrono::{SecondsFormat, Utc};
use reqwest::Client;
use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Error message recorded for pages blocked by robots.txt
pub const ROBOTS_DISALLOWED: &str = "Disallowed by robots.txt";

/// Snapshot emitted after every dequeue and once at natural completion
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlProgress {
    /// URL being processed; empty in the final event
    pub current_url: String,
    pub current_depth: u32,
    /// Pages dequeued so far, the current one included
    pub pages_crawled: usize,
    /// The page budget
    pub total_pages: usize,
    pub is_complete: bool,
}

/// Result of one crawl
#[derive(Debug, Clone)]
pub struct SitemapData {
    pub tree: SiteTree,
    pub total_pages: usize,
    pub total_images: usize,
    pub total_external_links: usize,
    /// Wall-clock duration in milliseconds
    pub crawl_time: u64,
    /// RFC 3339 timestamp
    pub generated_at: String,
    pub meta_analysis: MetaAnalysis,
    pub structure_analysis: StructureAnalysis,
    /// True when the crawl ended because `stop()` was called
    pub stopped_early: bool,
}

impl Serialize for SitemapData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("SitemapData", 9)?;
        state.serialize_field("nodes", &[self.tree.view(self.tree.root_id())])?;
        state.serialize_field("totalPages", &self.total_pages)?;
        state.serialize_field("totalImages", &self.total_images)?;
        state.serialize_field("totalExternalLinks", &self.total_external_links)?;
        state.serialize_field("crawlTime", &self.crawl_time)?;
        state.serialize_field("generatedAt", &self.generated_at)?;
        state.serialize_field("metaAnalysis", &self.meta_analysis)?;
        state.serialize_field("structureAnalysis", &self.structure_analysis)?;
        state.serialize_field("stoppedEarly", &self.stopped_early)?;
        state.end()
    }
}

/// Resets the crawler's active flag when a crawl ends, however it ends
struct ActiveGuard<'a>(&'a AtomicBool);

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Entry point for crawling one site at a time
pub struct Crawler {
    config: Config,
    client: Client,
    robots_policy: Option<Arc<dyn RobotsPolicy>>,
    active: AtomicBool,
    cancel: Mutex<CancellationToken>,
}

impl Crawler {
    /// Creates a crawler from a validated configuration
    ///
    /// # Errors
    ///
    /// Fails if the configuration is out of bounds or the HTTP client cannot
    /// be built.
    pub fn new(config: Config) -> crate::Result<Self> {
        validate(&config)?;
        let client = build_http_client(&config)?;

        Ok(Self {
            config,
            client,
            robots_policy: None,
            active: AtomicBool::new(false),
            cancel: Mutex::new(CancellationToken::new()),
        })
    }

    /// Replaces the robots.txt lookup with a caller-supplied policy
    pub fn with_robots_policy(mut self, policy: Arc<dyn RobotsPolicy>) -> Self {
        self.robots_policy = Some(policy);
        self
    }

    pub fn options(&self) -> &CrawlOptions {
        &self.config.crawler
    }

    /// True while a crawl is running on this crawler
    pub fn is_crawling(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Asks the running crawl to stop
    ///
    /// Safe to call from any task, any number of times. No fetch starts after
    /// the signal is observed and the in-flight one fails as cancelled.
    pub fn stop(&self) {
        if self.is_crawling() {
            tracing::info!("Stop requested");
        }
        self.token().cancel();
    }

    fn token(&self) -> MutexGuard<'_, CancellationToken> {
        self.cancel.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Crawls the site rooted at `seed`
    ///
    /// Progress events go to `progress` when given. Per-page failures are
    /// recorded on their nodes; only setup errors are returned.
    ///
    /// # Errors
    ///
    /// * [`SitemapError::AlreadyCrawling`] if a crawl is running on this crawler
    /// * [`SitemapError::InvalidSeedUrl`] if `seed` is not an http(s) URL
    pub async fn crawl(
        &self,
        seed: &str,
        progress: Option<UnboundedSender<CrawlProgress>>,
    ) -> crate::Result<SitemapData> {
        // The flag and the fresh token change under one lock so a concurrent
        // stop() always reaches the token of the crawl it observed
        let cancel = {
            let mut token = self.token();
            if self
                .active
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                return Err(SitemapError::AlreadyCrawling);
            }
            *token = CancellationToken::new();
            token.clone()
        };
        let _guard = ActiveGuard(&self.active);

        let seed = normalize_url(seed).map_err(|e| SitemapError::InvalidSeedUrl {
            url: seed.to_string(),
            reason: e.to_string(),
        })?;

        let options = &self.config.crawler;
        tracing::info!(
            "Starting crawl of {} (max depth {}, max pages {})",
            seed,
            options.max_depth,
            options.max_pages
        );

        let robots = if options.respect_robots_txt {
            let policy: Arc<dyn RobotsPolicy> = match &self.robots_policy {
                Some(policy) => Arc::clone(policy),
                None => Arc::new(
                    fetch_robots(
                        &self.client,
                        &seed,
                        &self.config.user_agent.crawler_name,
                        &cancel,
                    )
                    .await,
                ),
            };
            Some(policy)
        } else {
            None
        };

        let crawl_delay = robots.as_ref().and_then(|r| r.crawl_delay());
        let delay = effective_delay(options.delay, crawl_delay);

        let session = CrawlSession {
            client: &self.client,
            options,
            robots,
            cancel,
            progress,
            delay,
            scheduler: Scheduler::new(seed.clone(), options.max_depth, options.max_pages),
            tree: SiteTree::new(seed.as_str(), fallback_title(&seed)),
        };

        let data = session.run().await?;
        tracing::info!(
            "Crawl {}: {} pages in {} ms",
            if data.stopped_early { "stopped" } else { "completed" },
            data.total_pages,
            data.crawl_time
        );
        Ok(data)
    }
}

/// Pause between requests: the larger of the configured delay and the
/// robots.txt crawl delay, capped at [`MAX_DELAY_MS`]
fn effective_delay(configured_ms: u64, crawl_delay: Option<Duration>) -> Duration {
    let configured = Duration::from_millis(configured_ms);
    let Some(crawl_delay) = crawl_delay.filter(|d| *d > configured) else {
        return configured;
    };

    let cap = Duration::from_millis(MAX_DELAY_MS);
    if crawl_delay > cap {
        tracing::warn!(
            "robots.txt crawl delay of {:?} exceeds the maximum, using {:?}",
            crawl_delay,
            cap
        );
        cap
    } else {
        tracing::info!("Using robots.txt crawl delay of {:?}", crawl_delay);
        crawl_delay
    }
}

/// Title for nodes that never got an extracted one
fn fallback_title(url: &Url) -> String {
    url_title(url).unwrap_or_else(|| "Error".to_string())
}

/// State owned by one crawl invocation
pub struct CrawlSession<'a> {
    client: &'a Client,
    options: &'a CrawlOptions,
    robots: Option<Arc<dyn RobotsPolicy>>,
    cancel: CancellationToken,
    progress: Option<UnboundedSender<CrawlProgress>>,
    delay: Duration,
    scheduler: Scheduler,
    tree: SiteTree,
}

impl CrawlSession<'_> {
    /// Runs the BFS loop until the frontier drains, the budget is spent or
    /// the crawl is stopped
    async fn run(mut self) -> crate::Result<SitemapData> {
        let start = Instant::now();
        let mut stopped_early = false;

        loop {
            if self.cancel.is_cancelled() {
                stopped_early = true;
                break;
            }

            let Some(queued) = self.scheduler.next_url() else {
                break;
            };

            self.emit(CrawlProgress {
                current_url: queued.url.to_string(),
                current_depth: queued.depth,
                pages_crawled: self.scheduler.visited_count(),
                total_pages: self.scheduler.max_pages(),
                is_complete: false,
            });

            self.process(&queued).await?;

            if self.scheduler.frontier_len() > 0
                && self.scheduler.visited_count() < self.scheduler.max_pages()
                && !pause(self.delay, &self.cancel).await
            {
                stopped_early = true;
                break;
            }
        }

        if !stopped_early {
            self.emit(CrawlProgress {
                current_url: String::new(),
                current_depth: 0,
                pages_crawled: self.scheduler.visited_count(),
                total_pages: self.scheduler.max_pages(),
                is_complete: true,
            });
        }

        self.tree.finalize_root();

        let meta_analysis = analyze_meta(&self.tree);
        let structure_analysis = analyze_structure(&self.tree);

        Ok(SitemapData {
            total_pages: self.scheduler.visited_count(),
            total_images: structure_analysis.image_count,
            total_external_links: structure_analysis.external_link_count,
            crawl_time: u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            meta_analysis,
            structure_analysis,
            stopped_early,
            tree: self.tree,
        })
    }

    fn emit(&self, event: CrawlProgress) {
        if let Some(tx) = &self.progress {
            if tx.send(event).is_err() {
                tracing::trace!("Progress receiver dropped");
            }
        }
    }

    /// Attaches the node for a dequeued URL and drives it to a terminal state
    async fn process(&mut self, queued: &QueuedUrl) -> crate::Result<()> {
        let id = match queued.parent {
            None => self.tree.root_id(),
            Some(parent) => {
                self.tree
                    .add_child(parent, queued.url.as_str(), fallback_title(&queued.url))
            }
        };

        tracing::debug!("Processing {} at depth {}", queued.url, queued.depth);

        if let Some(reason) = self.robots_block(&queued.url) {
            tracing::warn!("Skipping {}: {}", queued.url, reason);
            return self.tree.fail(id, reason);
        }

        self.tree.transition(id, PageStatus::Crawling)?;

        match fetch_page(self.client, &queued.url, &self.cancel).await {
            Ok(page) => self.record_page(id, queued, page),
            Err(FetchError::Cancelled) => {
                tracing::debug!("Fetch of {} cancelled", queued.url);
                self.tree.fail(id, FetchError::Cancelled.to_string())
            }
            Err(e) => {
                tracing::warn!("Failed to fetch {}: {}", queued.url, e);
                self.tree.fail(id, e.to_string())
            }
        }
    }

    /// Returns the error message if robots.txt forbids the URL
    fn robots_block(&self, url: &Url) -> Option<String> {
        let robots = self.robots.as_ref()?;
        match robots.is_allowed(url) {
            Ok(true) => None,
            Ok(false) => Some(ROBOTS_DISALLOWED.to_string()),
            Err(e) => Some(format!("{} ({})", ROBOTS_DISALLOWED, e)),
        }
    }

    fn record_page(&mut self, id: NodeId, queued: &QueuedUrl, page: FetchedPage) -> crate::Result<()> {
        if page.final_url != queued.url {
            tracing::debug!("{} redirected to {}", queued.url, page.final_url);
        }
        tracing::debug!(
            "{} returned {} ({})",
            queued.url,
            page.status_code,
            page.content_type
        );
        let html = is_html_content_type(&page.content_type);

        {
            let node = self.tree.node_mut(id);
            node.content_type = Some(page.content_type.clone());
            node.last_modified = page.last_modified;
        }

        if !html {
            tracing::debug!(
                "{} is {}, recording without extraction",
                queued.url,
                page.content_type
            );
            let node = self.tree.node_mut(id);
            node.title = url_title(&queued.url).unwrap_or_else(|| UNTITLED_PAGE.to_string());
            return self.tree.transition(id, PageStatus::Completed);
        }

        let fields = extract(&page.body, &queued.url, self.options);

        {
            let node = self.tree.node_mut(id);
            node.title = fields.title;

            if let Some(meta) = &fields.meta_tags {
                node.language = meta.language.clone();
                node.charset = meta.charset.clone();
                node.canonical_url = meta.canonical.clone();
                node.robots_meta = meta.robots.clone();
            }
            node.meta_tags = fields.meta_tags;

            if let Some(stats) = fields.content {
                node.word_count = Some(stats.word_count);
                node.internal_links = Some(stats.internal_links);
                node.external_links = Some(stats.external_links);
                node.images = Some(stats.images);
                node.h1_tags = Some(stats.h1_tags);
                node.h2_tags = Some(stats.h2_tags);
                node.h3_tags = Some(stats.h3_tags);
            }

            node.image_urls = fields.image_urls;
            node.external_urls = fields.external_urls;
            node.schema_types = fields.schema_types;
        }

        self.tree.transition(id, PageStatus::Completed)?;

        if self.scheduler.can_expand(queued.depth) {
            for link in fields.links {
                tracing::debug!("Discovered {} on {}", link, queued.url);
                self.scheduler.enqueue(link, queued.depth + 1, id);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::robots::RobotsError;

    #[tokio::test]
    async fn test_invalid_seed_rejected() {
        let crawler = Crawler::new(Config::default()).unwrap();
        for seed in ["not a url", "ftp://example.com/", "mailto:x@example.com"] {
            let result = crawler.crawl(seed, None).await;
            assert!(
                matches!(result, Err(SitemapError::InvalidSeedUrl { .. })),
                "{} accepted",
                seed
            );
        }
        assert!(!crawler.is_crawling());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = Config::default();
        config.crawler.max_pages = 0;
        assert!(matches!(Crawler::new(config), Err(SitemapError::Config(_))));
    }

    #[test]
    fn test_effective_delay() {
        assert_eq!(effective_delay(100, None), Duration::from_millis(100));
        assert_eq!(
            effective_delay(100, Some(Duration::from_millis(50))),
            Duration::from_millis(100)
        );
        assert_eq!(
            effective_delay(100, Some(Duration::from_secs(2))),
            Duration::from_secs(2)
        );
        assert_eq!(
            effective_delay(0, Some(Duration::from_secs(86_400))),
            Duration::from_millis(MAX_DELAY_MS)
        );
    }

    #[test]
    fn test_stop_when_idle_is_noop() {
        let crawler = Crawler::new(Config::default()).unwrap();
        crawler.stop();
        crawler.stop();
        assert!(!crawler.is_crawling());
    }

    struct DenyAll;

    impl RobotsPolicy for DenyAll {
        fn is_allowed(&self, _url: &Url) -> Result<bool, RobotsError> {
            Ok(false)
        }
    }

    #[tokio::test]
    async fn test_disallowed_seed_becomes_error_root() {
        let crawler = Crawler::new(Config::default())
            .unwrap()
            .with_robots_policy(Arc::new(DenyAll));
        let data = crawler
            .crawl("https://example.invalid/start", None)
            .await
            .unwrap();

        let root = data.tree.root();
        assert_eq!(root.status(), PageStatus::Error);
        assert_eq!(root.error.as_deref(), Some(ROBOTS_DISALLOWED));
        assert_eq!(root.title, "Start");
        assert_eq!(data.total_pages, 1);
        assert!(!data.stopped_early);
    }

    #[tokio::test]
    async fn test_stop_before_crawl_does_not_cancel_it() {
        let crawler = Crawler::new(Config::default())
            .unwrap()
            .with_robots_policy(Arc::new(DenyAll));
        crawler.stop();

        let data = crawler
            .crawl("https://example.invalid/", None)
            .await
            .unwrap();
        assert!(!data.stopped_early);
        assert!(!crawler.is_crawling());
    }

    #[tokio::test]
    async fn test_serialized_shape() {
        let crawler = Crawler::new(Config::default())
            .unwrap()
            .with_robots_policy(Arc::new(DenyAll));
        let data = crawler.crawl("https://example.invalid/", None).await.unwrap();
        let json = serde_json::to_value(&data).unwrap();

        assert_eq!(json["nodes"].as_array().unwrap().len(), 1);
        assert_eq!(json["nodes"][0]["status"], "error");
        assert_eq!(json["nodes"][0]["title"], "Error");
        assert_eq!(json["totalPages"], 1);
        assert_eq!(json["stoppedEarly"], false);
        assert!(json["metaAnalysis"]["seoScore"].is_number());
        assert!(json["structureAnalysis"]["orphanedPages"].is_array());
    }
}
