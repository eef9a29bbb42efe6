//! Site structure report

use crate::state::{PageNode, SiteTree};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

/// Structural statistics over completed pages
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureAnalysis {
    /// Same value as `max_depth`
    pub total_depth: u32,
    pub average_depth: f64,
    pub max_depth: u32,
    pub depth_distribution: BTreeMap<u32, usize>,
    pub internal_link_count: usize,
    pub external_link_count: usize,
    pub image_count: usize,
    pub content_type_distribution: BTreeMap<String, usize>,
    pub h1_tag_count: usize,
    pub h2_tag_count: usize,
    pub h3_tag_count: usize,
    pub total_word_count: usize,
    pub average_word_count: f64,
    /// Completed pages that no completed page lists as a child
    pub orphaned_pages: Vec<String>,
    /// Always empty; the tree cannot represent cycles
    pub circular_references: Vec<String>,
    /// Always empty; failed pages are reported on their nodes
    pub broken_links: Vec<String>,
}

/// Reduces the tree to structural statistics
///
/// The seed is always reported as orphaned since nothing lists the root as
/// a child.
pub fn analyze(tree: &SiteTree) -> StructureAnalysis {
    let completed: Vec<&PageNode> = tree.completed().collect();
    if completed.is_empty() {
        return StructureAnalysis::default();
    }

    let mut report = StructureAnalysis::default();
    let sum = |f: fn(&PageNode) -> Option<usize>| -> usize {
        completed.iter().filter_map(|n| f(n)).sum()
    };

    report.max_depth = completed.iter().map(|n| n.depth).max().unwrap_or(0);
    report.total_depth = report.max_depth;
    report.average_depth =
        completed.iter().map(|n| n.depth as f64).sum::<f64>() / completed.len() as f64;

    for node in &completed {
        *report.depth_distribution.entry(node.depth).or_insert(0) += 1;
        if let Some(content_type) = &node.content_type {
            *report
                .content_type_distribution
                .entry(content_type.clone())
                .or_insert(0) += 1;
        }
    }

    report.internal_link_count = sum(|n| n.internal_links);
    report.external_link_count = sum(|n| n.external_links);
    report.image_count = sum(|n| n.images);
    report.h1_tag_count = sum(|n| n.h1_tags);
    report.h2_tag_count = sum(|n| n.h2_tags);
    report.h3_tag_count = sum(|n| n.h3_tags);
    report.total_word_count = sum(|n| n.word_count);
    report.average_word_count = report.total_word_count as f64 / completed.len() as f64;

    let linked: HashSet<&str> = completed
        .iter()
        .flat_map(|n| tree.children(n.id()))
        .map(|child| child.url.as_str())
        .collect();
    report.orphaned_pages = completed
        .iter()
        .filter(|n| !linked.contains(n.url.as_str()))
        .map(|n| n.url.clone())
        .collect();

    report
}
