//! XML sitemap generation
//!
//! Emits a sitemaps.org 0.9 `urlset` with one `<url>` per completed page, in
//! tree pre-order.

use crate::crawler::SitemapData;
use crate::state::PageNode;
use chrono::DateTime;
use quick_xml::escape::escape;

const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";
const IMAGE_NS: &str = "http://www.google.com/schemas/sitemap-image/1.1";

/// Priority hint for a page at `depth`, formatted to one decimal
pub fn priority(depth: u32) -> String {
    if depth == 0 {
        return "1.0".to_string();
    }
    let value = (1.0 - f64::from(depth) * 0.1).max(0.1);
    format!("{:.1}", value)
}

/// Change frequency hint for a page at `depth`
pub fn change_frequency(depth: u32) -> &'static str {
    match depth {
        0 => "daily",
        1 => "weekly",
        2 => "monthly",
        _ => "yearly",
    }
}

/// Converts an HTTP `Last-Modified` value to W3C datetime when it parses
fn lastmod(raw: &str) -> String {
    match DateTime::parse_from_rfc2822(raw) {
        Ok(date) => date.to_rfc3339(),
        Err(_) => escape(raw).into_owned(),
    }
}

fn element(xml: &mut String, name: &str, value: &str) {
    xml.push_str(&format!("    <{name}>{}</{name}>\n", escape(value)));
}

fn count_element(xml: &mut String, name: &str, value: Option<usize>) {
    if let Some(count) = value.filter(|c| *c > 0) {
        xml.push_str(&format!("    <{name}>{count}</{name}>\n"));
    }
}

fn url_entry(xml: &mut String, node: &PageNode) {
    xml.push_str("  <url>\n");
    element(xml, "loc", &node.url);
    element(xml, "title", &node.title);
    if let Some(modified) = &node.last_modified {
        xml.push_str(&format!("    <lastmod>{}</lastmod>\n", lastmod(modified)));
    }
    xml.push_str(&format!("    <priority>{}</priority>\n", priority(node.depth)));
    xml.push_str(&format!(
        "    <changefreq>{}</changefreq>\n",
        change_frequency(node.depth)
    ));

    if let Some(meta) = &node.meta_tags {
        if let Some(description) = &meta.description {
            element(xml, "description", description);
        }
        if !meta.keywords.is_empty() {
            element(xml, "keywords", &meta.keywords.join(", "));
        }
    }
    if let Some(canonical) = &node.canonical_url {
        element(xml, "canonical", canonical);
    }
    if let Some(robots) = &node.robots_meta {
        element(xml, "robots", robots);
    }
    if let Some(content_type) = &node.content_type {
        element(xml, "content-type", content_type);
    }

    count_element(xml, "word-count", node.word_count);
    count_element(xml, "internal-links", node.internal_links);
    count_element(xml, "external-links", node.external_links);
    count_element(xml, "images", node.images);
    count_element(xml, "h1-tags", node.h1_tags);
    count_element(xml, "h2-tags", node.h2_tags);
    count_element(xml, "h3-tags", node.h3_tags);

    for image in &node.image_urls {
        xml.push_str("    <image:image>\n");
        xml.push_str(&format!("      <image:loc>{}</image:loc>\n", escape(image.as_str())));
        xml.push_str("    </image:image>\n");
    }

    xml.push_str("  </url>\n");
}

/// Renders the completed pages of a crawl as an XML sitemap
pub fn generate_xml(data: &SitemapData) -> String {
    let mut xml = String::new();
    xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str(&format!(
        "<urlset xmlns=\"{}\" xmlns:image=\"{}\">\n",
        SITEMAP_NS, IMAGE_NS
    ));

    for node in data.tree.completed() {
        url_entry(&mut xml, node);
    }

    xml.push_str("</urlset>\n");
    xml
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::fixtures::sample_data;
    use quick_xml::escape::unescape;

    #[test]
    fn test_priority() {
        assert_eq!(priority(0), "1.0");
        assert_eq!(priority(1), "0.9");
        assert_eq!(priority(3), "0.7");
        assert_eq!(priority(9), "0.1");
        assert_eq!(priority(12), "0.1");
    }

    #[test]
    fn test_change_frequency() {
        assert_eq!(change_frequency(0), "daily");
        assert_eq!(change_frequency(1), "weekly");
        assert_eq!(change_frequency(2), "monthly");
        assert_eq!(change_frequency(3), "yearly");
        assert_eq!(change_frequency(7), "yearly");
    }

    #[test]
    fn test_lastmod_conversion() {
        assert_eq!(
            lastmod("Wed, 21 Oct 2015 07:28:00 GMT"),
            "2015-10-21T07:28:00+00:00"
        );
        assert_eq!(lastmod("yesterday & today"), "yesterday &amp; today");
    }

    #[test]
    fn test_only_completed_pages_emitted() {
        let xml = generate_xml(&sample_data());
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains("xmlns:image="));
        assert_eq!(xml.matches("<url>").count(), 2);
        assert!(xml.contains("<loc>https://example.com/</loc>"));
        assert!(xml.contains("<loc>https://example.com/about</loc>"));
        assert!(!xml.contains("https://example.com/broken"));
    }

    #[test]
    fn test_url_fields() {
        let xml = generate_xml(&sample_data());
        assert!(xml.contains("<priority>1.0</priority>"));
        assert!(xml.contains("<changefreq>daily</changefreq>"));
        assert!(xml.contains("<priority>0.9</priority>"));
        assert!(xml.contains("<changefreq>weekly</changefreq>"));
        assert!(xml.contains("<keywords>rust, crawler</keywords>"));
        assert!(xml.contains("<word-count>120</word-count>"));
        assert!(xml.contains("<content-type>text/html</content-type>"));
        assert!(xml.contains("<image:loc>https://example.com/logo.png</image:loc>"));
        assert!(xml.contains("<h1-tags>1</h1-tags>"));
        assert!(xml.contains("<h3-tags>4</h3-tags>"));
        // Zero counts are left out
        assert!(!xml.contains("<external-links>"));
        assert!(!xml.contains("<h2-tags>"));
    }

    #[test]
    fn test_title_escaping_round_trips() {
        let title = "Fish & Chips <\"best\"> 'ever'";
        let mut data = sample_data();
        let root = data.tree.root_id();
        data.tree.node_mut(root).title = title.to_string();

        let xml = generate_xml(&data);
        let start = xml.find("<title>").unwrap() + "<title>".len();
        let end = xml[start..].find("</title>").unwrap() + start;
        let escaped = &xml[start..end];

        assert!(!escaped.contains('<'));
        assert!(!escaped.contains('"'));
        assert!(!escaped.contains('\''));
        assert_eq!(unescape(escaped).unwrap(), title);
    }
}
