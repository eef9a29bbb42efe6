//! Output module for rendering crawl results
//!
//! This module handles:
//! - Exporting the sitemap as XML, JSON or CSV
//! - Generating a markdown SEO and structure report
//! - Printing a console summary after a crawl

mod csv;
mod json;
mod markdown;
pub mod stats;
mod xml;

pub use self::csv::generate_csv;
pub use json::generate_json;
pub use markdown::format_markdown_report;
pub use stats::{format_summary, print_summary};
pub use xml::{change_frequency, generate_xml, priority};

use crate::crawler::SitemapData;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while rendering or writing output
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to format output: {0}")]
    Format(String),

    #[error("CSV error: {0}")]
    Csv(#[from] ::csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Export formats for a finished crawl
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// sitemaps.org XML sitemap
    #[default]
    Xml,
    /// Full JSON dump of the result
    Json,
    /// One row per node
    Csv,
    /// SEO and structure report
    Markdown,
}

impl ExportFormat {
    /// Renders the crawl result in this format
    pub fn render(&self, data: &SitemapData) -> OutputResult<String> {
        match self {
            ExportFormat::Xml => Ok(generate_xml(data)),
            ExportFormat::Json => generate_json(data),
            ExportFormat::Csv => generate_csv(data),
            ExportFormat::Markdown => Ok(format_markdown_report(data)),
        }
    }

    /// Conventional file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Xml => "xml",
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
            ExportFormat::Markdown => "md",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExportFormat::Xml => "xml",
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
            ExportFormat::Markdown => "markdown",
        };
        f.write_str(name)
    }
}

/// Writes rendered output to a file, or to stdout when no path is given
pub fn write_output(content: &str, path: Option<&Path>) -> OutputResult<()> {
    match path {
        Some(path) => {
            let mut file = File::create(path)?;
            file.write_all(content.as_bytes())?;
            tracing::info!("Wrote {} bytes to {}", content.len(), path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(content.as_bytes())?;
            if !content.ends_with('\n') {
                stdout.write_all(b"\n")?;
            }
        }
    }
    Ok(())
}
