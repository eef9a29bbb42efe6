//! Markdown report generation
//!
//! This module generates a human-readable SEO and structure report from a
//! finished crawl: meta tag coverage, keyword usage, depth and content type
//! breakdowns, orphaned pages and failed pages.

use crate::crawler::SitemapData;
use crate::state::PageStatus;

/// Maximum number of orphaned or failed pages listed before truncating
const LIST_LIMIT: usize = 50;

fn percent(fraction: f64) -> String {
    format!("{:.1}%", fraction * 100.0)
}

/// Formats a crawl result as a markdown report
pub fn format_markdown_report(data: &SitemapData) -> String {
    let mut md = String::new();
    let meta = &data.meta_analysis;
    let structure = &data.structure_analysis;

    // Title
    md.push_str(&format!("# Sitemap Report: {}\n\n", data.tree.root().url));

    // Overview
    md.push_str("## Overview\n\n");
    md.push_str(&format!("- **Generated**: {}\n", data.generated_at));
    md.push_str(&format!(
        "- **Crawl Time**: {} ms ({:.2} seconds)\n",
        data.crawl_time,
        data.crawl_time as f64 / 1000.0
    ));
    md.push_str(&format!("- **Pages Visited**: {}\n", data.total_pages));
    md.push_str(&format!(
        "- **Pages Completed**: {}\n",
        data.tree.completed().count()
    ));
    md.push_str(&format!("- **Total Images**: {}\n", data.total_images));
    md.push_str(&format!(
        "- **Total External Links**: {}\n",
        data.total_external_links
    ));
    md.push_str(&format!("- **SEO Score**: {}/100\n", meta.seo_score));
    if data.stopped_early {
        md.push_str("- **Note**: crawl was stopped before completion\n");
    }
    md.push('\n');

    // Meta tag coverage
    md.push_str("## Meta Tag Coverage\n\n");
    if meta.total_pages == 0 {
        md.push_str("No pages with meta tags were analyzed.\n\n");
    } else {
        md.push_str(&format!("Analyzed pages: {}\n\n", meta.total_pages));
        md.push_str("| Tag | Pages | Coverage |\n");
        md.push_str("|-----|-------|----------|\n");
        for (name, count, coverage) in [
            ("Title", meta.pages_with_title, meta.title_coverage()),
            (
                "Description",
                meta.pages_with_description,
                meta.description_coverage(),
            ),
            ("Keywords", meta.pages_with_keywords, meta.keywords_coverage()),
            (
                "Open Graph",
                meta.pages_with_open_graph,
                meta.open_graph_coverage(),
            ),
            (
                "Twitter Card",
                meta.pages_with_twitter_cards,
                meta.twitter_coverage(),
            ),
            (
                "Canonical",
                meta.pages_with_canonical,
                meta.canonical_coverage(),
            ),
            ("Robots", meta.pages_with_robots_meta, meta.robots_coverage()),
        ] {
            md.push_str(&format!("| {} | {} | {} |\n", name, count, percent(coverage)));
        }
        md.push('\n');
        md.push_str(&format!(
            "- **Average Title Length**: {:.1} characters\n",
            meta.average_title_length
        ));
        md.push_str(&format!(
            "- **Average Description Length**: {:.1} characters\n\n",
            meta.average_description_length
        ));
    }

    // Missing tags
    if !meta.missing_meta_tags.is_empty() {
        md.push_str("## Missing Meta Tags\n\n");
        for tag in &meta.missing_meta_tags {
            md.push_str(&format!("- {}\n", tag));
        }
        md.push('\n');
    }

    // Keywords
    if !meta.common_keywords.is_empty() {
        md.push_str("## Common Keywords\n\n");
        md.push_str("| Keyword | Pages |\n");
        md.push_str("|---------|-------|\n");
        for keyword in &meta.common_keywords {
            md.push_str(&format!("| {} | {} |\n", keyword.keyword, keyword.count));
        }
        md.push('\n');
    }

    // Structure
    md.push_str("## Site Structure\n\n");
    md.push_str(&format!("- **Max Depth**: {}\n", structure.max_depth));
    md.push_str(&format!(
        "- **Average Depth**: {:.2}\n",
        structure.average_depth
    ));
    md.push_str(&format!(
        "- **Internal Links**: {}\n",
        structure.internal_link_count
    ));
    md.push_str(&format!(
        "- **Headings**: {} h1, {} h2, {} h3\n",
        structure.h1_tag_count, structure.h2_tag_count, structure.h3_tag_count
    ));
    md.push_str(&format!(
        "- **Words**: {} total, {:.1} per page\n\n",
        structure.total_word_count, structure.average_word_count
    ));

    if !structure.depth_distribution.is_empty() {
        md.push_str("## Depth Distribution\n\n");
        md.push_str("| Depth | Pages |\n");
        md.push_str("|-------|-------|\n");
        for (depth, count) in &structure.depth_distribution {
            md.push_str(&format!("| {} | {} |\n", depth, count));
        }
        md.push('\n');
    }

    if !structure.content_type_distribution.is_empty() {
        md.push_str("## Content Types\n\n");
        md.push_str("| Content Type | Pages |\n");
        md.push_str("|--------------|-------|\n");
        for (content_type, count) in &structure.content_type_distribution {
            md.push_str(&format!("| {} | {} |\n", content_type, count));
        }
        md.push('\n');
    }

    if !structure.orphaned_pages.is_empty() {
        md.push_str("## Orphaned Pages\n\n");
        for url in structure.orphaned_pages.iter().take(LIST_LIMIT) {
            md.push_str(&format!("- {}\n", url));
        }
        if structure.orphaned_pages.len() > LIST_LIMIT {
            md.push_str(&format!(
                "\n... and {} more\n",
                structure.orphaned_pages.len() - LIST_LIMIT
            ));
        }
        md.push('\n');
    }

    // Failed pages
    let failed: Vec<_> = data
        .tree
        .iter()
        .filter(|node| node.status() == PageStatus::Error)
        .collect();
    if !failed.is_empty() {
        md.push_str("## Failed Pages\n\n");
        md.push_str("| URL | Error |\n");
        md.push_str("|-----|-------|\n");
        for node in failed.iter().take(LIST_LIMIT) {
            md.push_str(&format!(
                "| {} | {} |\n",
                node.url,
                node.error.as_deref().unwrap_or("Unknown error")
            ));
        }
        if failed.len() > LIST_LIMIT {
            md.push_str(&format!("\n... and {} more\n", failed.len() - LIST_LIMIT));
        }
        md.push('\n');
    }

    md
}
