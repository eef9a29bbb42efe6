//! CSV export of every node in the tree

use super::{OutputError, OutputResult};
use crate::crawler::SitemapData;
use ::csv::{QuoteStyle, Terminator, WriterBuilder};

const HEADER: &str = "URL,Title,Depth,Status,Last Modified\n";

/// Renders one quoted row per node, in tree pre-order
pub fn generate_csv(data: &SitemapData) -> OutputResult<String> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    for node in data.tree.iter() {
        let depth = node.depth.to_string();
        writer.write_record([
            node.url.as_str(),
            node.title.as_str(),
            depth.as_str(),
            node.status().as_str(),
            node.last_modified.as_deref().unwrap_or(""),
        ])?;
    }

    let rows = writer
        .into_inner()
        .map_err(|e| OutputError::Format(e.to_string()))?;
    let rows = String::from_utf8(rows).map_err(|e| OutputError::Format(e.to_string()))?;

    Ok(format!("{}{}", HEADER, rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::fixtures::sample_data;

    #[test]
    fn test_header_and_rows() {
        let csv = generate_csv(&sample_data()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "URL,Title,Depth,Status,Last Modified");
        assert_eq!(lines.len(), 4);
        assert_eq!(
            lines[1],
            "\"https://example.com/\",\"Home\",\"0\",\"completed\",\"\""
        );
        assert_eq!(
            lines[2],
            "\"https://example.com/about\",\"About\",\"1\",\"completed\",\"Wed, 21 Oct 2015 07:28:00 GMT\""
        );
        assert!(lines[3].contains("\"error\""));
    }

    #[test]
    fn test_embedded_quotes_doubled() {
        let mut data = sample_data();
        let root = data.tree.root_id();
        data.tree.node_mut(root).title = "The \"best\" page".into();

        let csv = generate_csv(&data).unwrap();
        assert!(csv.contains("\"The \"\"best\"\" page\""));
    }
}
