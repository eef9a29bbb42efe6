//! HTML content extractor
//!
//! Turns one fetched HTML body into [`PageFields`]:
//! - Display title (with the URL-based fallback chain)
//! - Meta tags from a fixed rule table
//! - Content statistics (words, links, images, headings)
//! - Internal links for the frontier
//!
//! Extraction never fails. Malformed markup yields whatever the parser
//! recovered, which may be nothing at all.

use crate::config::CrawlOptions;
use crate::url::{classify_link, normalize_parsed, resolve_link, LinkKind};
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use std::collections::HashSet;
use url::Url;

/// Title used when neither the document nor the URL offers one
pub const UNTITLED_PAGE: &str = "Untitled Page";

/// Elements whose text is never counted
const STRIPPED_ELEMENTS: [&str; 3] = ["script", "style", "noscript"];

/// Extracted meta tag values for one page
///
/// Absent values mean the page did not carry the tag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaTags {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewport: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub robots: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canonical: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub og_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub og_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub og_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub og_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub og_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter_card: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter_image: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub charset: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh: Option<String>,

    // Parsed from `robots`
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub noindex: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub nofollow: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub noarchive: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub nosnippet: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub noimageindex: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unavailable_after: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referrer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_scheme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msapplication_tile_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apple_mobile_web_app_title: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub apple_mobile_web_app_capable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apple_mobile_web_app_status_bar_style: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format_detection: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mobile_optimized: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub handheld_friendly: bool,
}

impl MetaTags {
    /// True if the page carries an Open Graph title or description
    pub fn has_open_graph(&self) -> bool {
        self.og_title.is_some() || self.og_description.is_some()
    }

    fn apply_robots_flags(&mut self) {
        let Some(robots) = self.robots.as_deref() else {
            return;
        };
        let lower = robots.to_ascii_lowercase();
        self.noindex = lower.contains("noindex");
        self.nofollow = lower.contains("nofollow");
        self.noarchive = lower.contains("noarchive");
        self.nosnippet = lower.contains("nosnippet");
        self.noimageindex = lower.contains("noimageindex");

        if let Some(pos) = lower.find("unavailable_after:") {
            let rest = &robots[pos + "unavailable_after:".len()..];
            let value = rest.split(',').next().unwrap_or("").trim();
            if !value.is_empty() {
                self.unavailable_after = Some(value.to_string());
            }
        }
    }
}

/// Content statistics for one page
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentStats {
    pub word_count: usize,
    pub internal_links: usize,
    pub external_links: usize,
    pub images: usize,
    pub h1_tags: usize,
    pub h2_tags: usize,
    pub h3_tags: usize,
}

/// Everything the extractor learned from one page
#[derive(Debug, Clone, Default)]
pub struct PageFields {
    /// Display title after the fallback chain, never empty
    pub title: String,

    /// Present when meta extraction is enabled
    pub meta_tags: Option<MetaTags>,

    /// Present when content analysis is enabled
    pub content: Option<ContentStats>,

    /// Normalized internal links in discovery order, without duplicates
    pub links: Vec<Url>,

    pub image_urls: Vec<String>,
    pub external_urls: Vec<String>,
    pub schema_types: Vec<String>,
}

/// Where a meta rule looks for its value
#[derive(Debug, Clone, Copy)]
enum MetaKey {
    Name(&'static str),
    Property(&'static str),
    HttpEquiv(&'static str),
}

impl MetaKey {
    fn matches(&self, element: &ElementRef<'_>) -> bool {
        let (attr, expected) = match self {
            MetaKey::Name(v) => ("name", v),
            MetaKey::Property(v) => ("property", v),
            MetaKey::HttpEquiv(v) => ("http-equiv", v),
        };
        element
            .value()
            .attr(attr)
            .is_some_and(|actual| actual.trim().eq_ignore_ascii_case(expected))
    }
}

/// One `<meta>` extraction rule
struct MetaRule {
    key: MetaKey,
    social: bool,
    /// A tag whose content fails this check does not fill the rule
    usable: fn(&str) -> bool,
    assign: fn(&mut MetaTags, String),
}

fn any_content(_: &str) -> bool {
    true
}

const fn rule(key: MetaKey, assign: fn(&mut MetaTags, String)) -> MetaRule {
    MetaRule {
        key,
        social: false,
        usable: any_content,
        assign,
    }
}

const fn social(key: MetaKey, assign: fn(&mut MetaTags, String)) -> MetaRule {
    MetaRule {
        key,
        social: true,
        usable: any_content,
        assign,
    }
}

use MetaKey::{HttpEquiv, Name, Property};

static META_RULES: &[MetaRule] = &[
    rule(Name("description"), |m, v| m.description = Some(v)),
    MetaRule {
        key: Name("keywords"),
        social: false,
        usable: |v| !split_keywords(v).is_empty(),
        assign: |m, v| m.keywords = split_keywords(&v),
    },
    rule(Name("author"), |m, v| m.author = Some(v)),
    rule(Name("viewport"), |m, v| m.viewport = Some(v)),
    rule(Name("robots"), |m, v| m.robots = Some(v)),
    social(Property("og:title"), |m, v| m.og_title = Some(v)),
    social(Property("og:description"), |m, v| m.og_description = Some(v)),
    social(Property("og:image"), |m, v| m.og_image = Some(v)),
    social(Property("og:type"), |m, v| m.og_type = Some(v)),
    social(Property("og:url"), |m, v| m.og_url = Some(v)),
    social(Name("twitter:card"), |m, v| m.twitter_card = Some(v)),
    social(Name("twitter:title"), |m, v| m.twitter_title = Some(v)),
    social(Name("twitter:description"), |m, v| {
        m.twitter_description = Some(v)
    }),
    social(Name("twitter:image"), |m, v| m.twitter_image = Some(v)),
    rule(HttpEquiv("content-language"), |m, v| m.language = Some(v)),
    rule(HttpEquiv("content-type"), |m, v| m.charset = Some(v)),
    rule(HttpEquiv("refresh"), |m, v| m.refresh = Some(v)),
    rule(Name("rating"), |m, v| m.rating = Some(v)),
    rule(Name("referrer"), |m, v| m.referrer = Some(v)),
    rule(Name("generator"), |m, v| m.generator = Some(v)),
    rule(Name("theme-color"), |m, v| m.theme_color = Some(v)),
    rule(Name("color-scheme"), |m, v| m.color_scheme = Some(v)),
    rule(Name("msapplication-TileColor"), |m, v| {
        m.msapplication_tile_color = Some(v)
    }),
    rule(Name("apple-mobile-web-app-title"), |m, v| {
        m.apple_mobile_web_app_title = Some(v)
    }),
    rule(Name("apple-mobile-web-app-capable"), |m, v| {
        m.apple_mobile_web_app_capable = v.eq_ignore_ascii_case("yes")
    }),
    rule(Name("apple-mobile-web-app-status-bar-style"), |m, v| {
        m.apple_mobile_web_app_status_bar_style = Some(v)
    }),
    rule(Name("format-detection"), |m, v| m.format_detection = Some(v)),
    rule(Name("MobileOptimized"), |m, v| m.mobile_optimized = Some(v)),
    rule(Name("HandheldFriendly"), |m, v| {
        m.handheld_friendly = v.eq_ignore_ascii_case("true")
    }),
];

fn split_keywords(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}

/// Returns true if content types of this kind should be parsed as HTML
pub fn is_html_content_type(content_type: &str) -> bool {
    content_type.contains("html")
}

/// Extracts all fields from an HTML page
///
/// # Arguments
///
/// * `html` - The page body
/// * `page_url` - The URL the page was fetched from, used to resolve links
/// * `options` - The crawl options gating optional extraction branches
///
/// # Example
///
/// ```
/// use sitemapper::config::CrawlOptions;
/// use sitemapper::crawler::extract;
/// use url::Url;
///
/// let html = r#"<html><head><title>Home</title></head><body><a href="/a">A</a></body></html>"#;
/// let url = Url::parse("https://example.com/").unwrap();
/// let fields = extract(html, &url, &CrawlOptions::default());
/// assert_eq!(fields.title, "Home");
/// assert_eq!(fields.links[0].as_str(), "https://example.com/a");
/// ```
pub fn extract(html: &str, page_url: &Url, options: &CrawlOptions) -> PageFields {
    let document = Html::parse_document(html);

    let title = document_title(&document)
        .or_else(|| first_text(&document, "h1"))
        .or_else(|| url_title(page_url))
        .unwrap_or_else(|| UNTITLED_PAGE.to_string());

    let meta_tags = options
        .extract_meta_tags
        .then(|| extract_meta_tags(&document, options.include_social_media));

    let content = options
        .analyze_content
        .then(|| content_stats(&document, page_url));

    let mut fields = PageFields {
        title,
        meta_tags,
        content,
        links: internal_links(&document, page_url),
        ..PageFields::default()
    };

    if options.include_images {
        fields.image_urls = image_urls(&document, page_url);
    }
    if options.include_external_links {
        fields.external_urls = external_urls(&document, page_url);
    }
    if options.include_schema_markup {
        fields.schema_types = schema_types(&document);
    }

    fields
}

/// Derives a display title from the last non-empty path segment of a URL
///
/// `-` and `_` become spaces, a trailing extension is stripped and the first
/// letter is capitalized. Returns None when the path has no usable segment.
///
/// ```
/// use sitemapper::crawler::url_title;
/// use url::Url;
///
/// let url = Url::parse("https://example.com/about-us.html").unwrap();
/// assert_eq!(url_title(&url).as_deref(), Some("About us"));
/// ```
pub fn url_title(url: &Url) -> Option<String> {
    let segment = url
        .path_segments()?
        .filter(|s| !s.is_empty())
        .last()?;

    let decoded = segment.replace(['-', '_'], " ");
    let stem = match decoded.rfind('.') {
        Some(pos) if pos > 0 => &decoded[..pos],
        _ => decoded.as_str(),
    };

    let stem = stem.trim();
    let mut chars = stem.chars();
    let first = chars.next()?;
    Some(first.to_uppercase().chain(chars).collect())
}

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

fn document_title(document: &Html) -> Option<String> {
    first_text(document, "title")
}

fn first_text(document: &Html, css: &str) -> Option<String> {
    let sel = selector(css)?;
    document
        .select(&sel)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn first_attr(document: &Html, css: &str, attr: &str) -> Option<String> {
    let sel = selector(css)?;
    document
        .select(&sel)
        .filter_map(|element| element.value().attr(attr))
        .map(str::trim)
        .find(|v| !v.is_empty())
        .map(str::to_string)
}

fn extract_meta_tags(document: &Html, include_social: bool) -> MetaTags {
    let mut tags = MetaTags {
        title: document_title(document),
        ..MetaTags::default()
    };

    let mut filled = vec![false; META_RULES.len()];
    if let Some(meta) = selector("meta[content]") {
        for element in document.select(&meta) {
            let Some(content) = element.value().attr("content").map(str::trim) else {
                continue;
            };
            if content.is_empty() {
                continue;
            }
            for (i, rule) in META_RULES.iter().enumerate() {
                if filled[i]
                    || (rule.social && !include_social)
                    || !rule.key.matches(&element)
                    || !(rule.usable)(content)
                {
                    continue;
                }
                (rule.assign)(&mut tags, content.to_string());
                filled[i] = true;
            }
        }
    }

    tags.canonical = first_attr(document, r#"link[rel~="canonical"]"#, "href");

    if let Some(lang) = first_attr(document, "html[lang]", "lang") {
        tags.language = Some(lang);
    }
    if let Some(charset) = first_attr(document, "meta[charset]", "charset") {
        tags.charset = Some(charset);
    }

    tags.apply_robots_flags();
    tags
}

/// True if the element sits inside script, style or noscript
fn is_stripped(element: &ElementRef<'_>) -> bool {
    element.ancestors().any(|node| {
        node.value()
            .as_element()
            .is_some_and(|e| STRIPPED_ELEMENTS.contains(&e.name()))
    })
}

fn count(document: &Html, css: &str) -> usize {
    selector(css)
        .map(|sel| document.select(&sel).filter(|e| !is_stripped(e)).count())
        .unwrap_or(0)
}

/// Words in the body text with scripts and styles removed
///
/// Text nodes are concatenated before splitting, so inline markup inside a
/// word does not split it.
fn word_count(document: &Html) -> usize {
    let body = selector("body").and_then(|sel| document.select(&sel).next());
    let root = body.unwrap_or_else(|| document.root_element());

    let text: String = root
        .descendants()
        .filter(|node| {
            !node.ancestors().any(|a| {
                a.value()
                    .as_element()
                    .is_some_and(|e| STRIPPED_ELEMENTS.contains(&e.name()))
            })
        })
        .filter_map(|node| node.value().as_text().map(|t| &**t))
        .collect();
    text.split_whitespace().count()
}

fn hrefs<'a>(document: &'a Html) -> impl Iterator<Item = &'a str> + 'a {
    let sel = selector("a[href]");
    sel.into_iter().flat_map(move |sel| {
        document
            .select(&sel)
            .filter(|e| !is_stripped(e))
            .filter_map(|e| e.value().attr("href"))
            .collect::<Vec<_>>()
    })
}

fn content_stats(document: &Html, page_url: &Url) -> ContentStats {
    let mut stats = ContentStats {
        word_count: word_count(document),
        images: count(document, "img"),
        h1_tags: count(document, "h1"),
        h2_tags: count(document, "h2"),
        h3_tags: count(document, "h3"),
        ..ContentStats::default()
    };

    for href in hrefs(document) {
        match classify_link(href, page_url) {
            LinkKind::Internal => stats.internal_links += 1,
            LinkKind::External => stats.external_links += 1,
            LinkKind::Ignored => {}
        }
    }

    stats
}

fn internal_links(document: &Html, page_url: &Url) -> Vec<Url> {
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for href in hrefs(document) {
        if classify_link(href, page_url) != LinkKind::Internal {
            continue;
        }
        let Some(normalized) =
            resolve_link(href, page_url).and_then(|url| normalize_parsed(url).ok())
        else {
            continue;
        };
        if seen.insert(normalized.as_str().to_string()) {
            links.push(normalized);
        }
    }

    links
}

fn external_urls(document: &Html, page_url: &Url) -> Vec<String> {
    let mut seen = HashSet::new();
    hrefs(document)
        .filter(|href| classify_link(href, page_url) == LinkKind::External)
        .filter_map(|href| resolve_link(href, page_url))
        .map(|url| url.to_string())
        .filter(|url| seen.insert(url.clone()))
        .collect()
}

fn image_urls(document: &Html, page_url: &Url) -> Vec<String> {
    let Some(sel) = selector("img[src]") else {
        return Vec::new();
    };
    let mut seen = HashSet::new();
    document
        .select(&sel)
        .filter(|e| !is_stripped(e))
        .filter_map(|e| e.value().attr("src"))
        .filter(|src| !src.trim_start().starts_with("data:"))
        .filter_map(|src| resolve_link(src, page_url))
        .filter(|url| matches!(url.scheme(), "http" | "https"))
        .map(|url| url.to_string())
        .filter(|url| seen.insert(url.clone()))
        .collect()
}

fn schema_types(document: &Html) -> Vec<String> {
    let Some(sel) = selector(r#"script[type="application/ld+json"]"#) else {
        return Vec::new();
    };

    let mut types = Vec::new();
    for script in document.select(&sel) {
        let raw = script.text().collect::<String>();
        let Ok(value) = serde_json::from_str::<serde_json::Value>(&raw) else {
            tracing::debug!("Skipping unparseable JSON-LD block");
            continue;
        };
        collect_schema_types(&value, &mut types);
    }
    types
}

fn collect_schema_types(value: &serde_json::Value, out: &mut Vec<String>) {
    use serde_json::Value;

    match value {
        Value::Array(items) => items.iter().for_each(|v| collect_schema_types(v, out)),
        Value::Object(map) => {
            match map.get("@type") {
                Some(Value::String(t)) => push_unique(out, t),
                Some(Value::Array(ts)) => ts
                    .iter()
                    .filter_map(Value::as_str)
                    .for_each(|t| push_unique(out, t)),
                _ => {}
            }
            if let Some(graph) = map.get("@graph") {
                collect_schema_types(graph, out);
            }
        }
        _ => {}
    }
}

fn push_unique(out: &mut Vec<String>, value: &str) {
    if !out.iter().any(|v| v == value) {
        out.push(value.to_string());
    }
}
