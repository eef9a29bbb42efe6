use crate::output::ExportFormat;
use serde::Deserialize;

/// Main configuration structure for Sitemapper
///
/// Every section is optional; an empty file yields the defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlOptions,
    pub fetch: FetchConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
}

/// Options for one crawl
///
/// Immutable once a crawl starts; the session holds its own copy.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlOptions {
    /// Maximum BFS distance from the seed (seed = 0)
    pub max_depth: u32,

    /// Maximum number of pages visited, seed included
    pub max_pages: usize,

    /// Pause between requests (milliseconds)
    pub delay: u64,

    /// Consult robots.txt before each fetch
    pub respect_robots_txt: bool,

    /// Extract SEO, Open Graph and Twitter meta tags
    pub extract_meta_tags: bool,

    /// Compute word, link, image and heading counts
    pub analyze_content: bool,

    /// Record absolute image URLs per page
    pub include_images: bool,

    /// Record absolute external link URLs per page
    pub include_external_links: bool,

    /// Extract Open Graph and Twitter card tags
    pub include_social_media: bool,

    /// Record JSON-LD schema types per page
    pub include_schema_markup: bool,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            max_depth: 3,
            max_pages: 100,
            delay: 100,
            respect_robots_txt: true,
            extract_meta_tags: true,
            analyze_content: true,
            include_images: false,
            include_external_links: false,
            include_social_media: true,
            include_schema_markup: false,
        }
    }
}

/// HTTP fetch configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct FetchConfig {
    /// Per-request timeout (seconds)
    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self { timeout_secs: 10 }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct UserAgentConfig {
    /// Product token, also used for robots.txt group matching
    pub crawler_name: String,

    /// Version of the crawler
    pub crawler_version: String,

    /// URL with information about the crawler
    pub contact_url: Option<String>,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "SitemapGenerator".to_string(),
            crawler_version: "1.0".to_string(),
            contact_url: None,
        }
    }
}

impl UserAgentConfig {
    /// Formats the User-Agent header value
    ///
    /// Format: `CrawlerName/Version` or `CrawlerName/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        match &self.contact_url {
            Some(contact) => format!(
                "{}/{} (+{})",
                self.crawler_name, self.crawler_version, contact
            ),
            None => format!("{}/{}", self.crawler_name, self.crawler_version),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Export format written after the crawl
    pub format: ExportFormat,

    /// Destination file; stdout when absent
    pub path: Option<String>,
}
