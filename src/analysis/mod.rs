//! Post-crawl aggregation
//!
//! Both reports are pure reductions over a finished [`SiteTree`](crate::state::SiteTree).
//! They are recomputed for every crawl and never mutated afterwards.

pub mod meta;
pub mod structure;

pub use meta::{analyze as analyze_meta, KeywordCount, MetaAnalysis};
pub use structure::{analyze as analyze_structure, StructureAnalysis};
