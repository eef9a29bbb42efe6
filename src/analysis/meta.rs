//! SEO meta tag coverage report

use crate::state::{PageNode, SiteTree};
use serde::Serialize;
use std::collections::HashMap;

/// Number of keywords kept in [`MetaAnalysis::common_keywords`]
const TOP_KEYWORDS: usize = 10;

/// Coverage below which a tag is reported as missing
const MISSING_THRESHOLDS: [(&str, f64); 5] = [
    ("description", 0.8),
    ("keywords", 0.5),
    ("Open Graph", 0.6),
    ("canonical", 0.7),
    ("robots", 0.5),
];

/// A keyword and the number of pages declaring it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeywordCount {
    pub keyword: String,
    pub count: usize,
}

/// Meta tag coverage over completed pages that carry meta tags
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaAnalysis {
    pub total_pages: usize,
    pub pages_with_title: usize,
    pub pages_with_description: usize,
    pub pages_with_keywords: usize,
    pub pages_with_open_graph: usize,
    pub pages_with_twitter_cards: usize,
    pub pages_with_canonical: usize,
    pub pages_with_robots_meta: usize,
    pub average_title_length: f64,
    pub average_description_length: f64,
    pub common_keywords: Vec<KeywordCount>,
    pub missing_meta_tags: Vec<String>,
    /// Weighted coverage score in 0..=100
    pub seo_score: u32,
}

impl MetaAnalysis {
    /// Fraction of analyzed pages with a given count
    fn coverage(&self, count: usize) -> f64 {
        if self.total_pages == 0 {
            0.0
        } else {
            count as f64 / self.total_pages as f64
        }
    }

    pub fn title_coverage(&self) -> f64 {
        self.coverage(self.pages_with_title)
    }

    pub fn description_coverage(&self) -> f64 {
        self.coverage(self.pages_with_description)
    }

    pub fn keywords_coverage(&self) -> f64 {
        self.coverage(self.pages_with_keywords)
    }

    pub fn open_graph_coverage(&self) -> f64 {
        self.coverage(self.pages_with_open_graph)
    }

    pub fn twitter_coverage(&self) -> f64 {
        self.coverage(self.pages_with_twitter_cards)
    }

    pub fn canonical_coverage(&self) -> f64 {
        self.coverage(self.pages_with_canonical)
    }

    pub fn robots_coverage(&self) -> f64 {
        self.coverage(self.pages_with_robots_meta)
    }
}

fn average(lengths: &[usize]) -> f64 {
    if lengths.is_empty() {
        0.0
    } else {
        lengths.iter().sum::<usize>() as f64 / lengths.len() as f64
    }
}

/// Counts keywords, most frequent first, ties in first-seen order
fn common_keywords<'a>(pages: impl Iterator<Item = &'a [String]>) -> Vec<KeywordCount> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<KeywordCount> = Vec::new();

    for keyword in pages.flatten() {
        match index.get(keyword.as_str()) {
            Some(&i) => counts[i].count += 1,
            None => {
                index.insert(keyword.as_str(), counts.len());
                counts.push(KeywordCount {
                    keyword: keyword.clone(),
                    count: 1,
                });
            }
        }
    }

    // sort_by is stable, so equal counts keep discovery order
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts.truncate(TOP_KEYWORDS);
    counts
}

/// Reduces the tree to a meta tag coverage report
///
/// Only completed nodes with extracted meta tags are analyzed. With none, the
/// report is all zeros.
pub fn analyze(tree: &SiteTree) -> MetaAnalysis {
    let tags: Vec<_> = tree
        .completed()
        .filter_map(|node: &PageNode| node.meta_tags.as_ref())
        .collect();

    if tags.is_empty() {
        return MetaAnalysis::default();
    }

    let title_lengths: Vec<usize> = tags
        .iter()
        .filter_map(|t| t.title.as_deref())
        .map(|t| t.chars().count())
        .collect();
    let description_lengths: Vec<usize> = tags
        .iter()
        .filter_map(|t| t.description.as_deref())
        .map(|d| d.chars().count())
        .collect();

    let mut report = MetaAnalysis {
        total_pages: tags.len(),
        pages_with_title: title_lengths.len(),
        pages_with_description: description_lengths.len(),
        pages_with_keywords: tags.iter().filter(|t| !t.keywords.is_empty()).count(),
        pages_with_open_graph: tags.iter().filter(|t| t.has_open_graph()).count(),
        pages_with_twitter_cards: tags.iter().filter(|t| t.twitter_card.is_some()).count(),
        pages_with_canonical: tags.iter().filter(|t| t.canonical.is_some()).count(),
        pages_with_robots_meta: tags.iter().filter(|t| t.robots.is_some()).count(),
        average_title_length: average(&title_lengths),
        average_description_length: average(&description_lengths),
        common_keywords: common_keywords(tags.iter().map(|t| t.keywords.as_slice())),
        ..MetaAnalysis::default()
    };

    let coverages = [
        report.description_coverage(),
        report.keywords_coverage(),
        report.open_graph_coverage(),
        report.canonical_coverage(),
        report.robots_coverage(),
    ];
    report.missing_meta_tags = MISSING_THRESHOLDS
        .iter()
        .zip(coverages)
        .filter(|((_, threshold), coverage)| coverage < threshold)
        .map(|((name, _), _)| name.to_string())
        .collect();

    let score = 20.0 * report.title_coverage()
        + 20.0 * report.description_coverage()
        + 15.0 * report.keywords_coverage()
        + 15.0 * report.open_graph_coverage()
        + 15.0 * report.canonical_coverage()
        + 15.0 * report.robots_coverage();
    report.seo_score = (score.round() as u32).min(100);

    report
}
