//! JSON export

use super::OutputResult;
use crate::crawler::SitemapData;

/// Pretty-printed dump of the whole crawl result
pub fn generate_json(data: &SitemapData) -> OutputResult<String> {
    Ok(serde_json::to_string_pretty(data)?)
}
