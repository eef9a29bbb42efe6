//! Console summary of a finished crawl

use crate::crawler::SitemapData;
use crate::state::PageStatus;

/// Page counts by status for one crawl
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlStatistics {
    /// Nodes in the tree
    pub total_pages: usize,

    /// Count of pages by status, in lifecycle order, zero counts omitted
    pub pages_by_status: Vec<(PageStatus, usize)>,

    pub total_images: usize,
    pub total_external_links: usize,
    pub seo_score: u32,
    pub crawl_time: u64,
    pub stopped_early: bool,
}

impl CrawlStatistics {
    pub fn from_data(data: &SitemapData) -> Self {
        let pages_by_status = [
            PageStatus::Pending,
            PageStatus::Crawling,
            PageStatus::Completed,
            PageStatus::Error,
        ]
        .into_iter()
        .map(|status| {
            let count = data.tree.iter().filter(|n| n.status() == status).count();
            (status, count)
        })
        .filter(|(_, count)| *count > 0)
        .collect();

        Self {
            total_pages: data.tree.len(),
            pages_by_status,
            total_images: data.total_images,
            total_external_links: data.total_external_links,
            seo_score: data.meta_analysis.seo_score,
            crawl_time: data.crawl_time,
            stopped_early: data.stopped_early,
        }
    }

    /// Percentage of pages that completed
    pub fn success_rate(&self) -> f64 {
        if self.total_pages == 0 {
            return 0.0;
        }
        let completed = self
            .pages_by_status
            .iter()
            .find(|(status, _)| *status == PageStatus::Completed)
            .map_or(0, |(_, count)| *count);
        completed as f64 / self.total_pages as f64 * 100.0
    }
}

/// Formats the summary shown after a crawl
pub fn format_summary(data: &SitemapData) -> String {
    let stats = CrawlStatistics::from_data(data);
    let mut out = String::new();

    out.push_str("=== Crawl Summary ===\n\n");
    out.push_str(&format!("  Seed: {}\n", data.tree.root().url));
    out.push_str(&format!(
        "  Duration: {:.2}s{}\n",
        stats.crawl_time as f64 / 1000.0,
        if stats.stopped_early { " (stopped early)" } else { "" }
    ));
    out.push_str(&format!("  Pages: {}\n", stats.total_pages));
    for (status, count) in &stats.pages_by_status {
        out.push_str(&format!("    {}: {}\n", status, count));
    }
    out.push_str(&format!("  Images: {}\n", stats.total_images));
    out.push_str(&format!("  External links: {}\n", stats.total_external_links));
    out.push_str(&format!("  SEO score: {}/100\n", stats.seo_score));
    out.push_str(&format!(
        "  Success rate: {:.1}%\n",
        stats.success_rate()
    ));

    if !data.meta_analysis.missing_meta_tags.is_empty() {
        out.push_str(&format!(
            "  Missing meta tags: {}\n",
            data.meta_analysis.missing_meta_tags.join(", ")
        ));
    }

    out
}

/// Prints the summary to stderr so stdout stays clean for the export
pub fn print_summary(data: &SitemapData) {
    eprint!("{}", format_summary(data));
}
