//! Core types for vault data structures.

use std::path::PathBuf;

use super::metadata::FrontMatter;

/// One markdown file after parsing, rewriting and tag extraction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Document {
    /// Absolute path to the markdown file
    pub path: PathBuf,
    /// File name without extension; the node id in the graph
    pub id: String,
    pub metadata: FrontMatter,
    /// Body as written, front matter removed
    pub raw_body: String,
    /// Body with every relative reference relocated to the output directory
    pub body: String,
    /// Distinct inline tags in first-occurrence order
    pub tags: Vec<String>,
    /// References that existed neither next to the document nor under the project root
    pub broken_links: Vec<String>,
}

impl Document {
    pub fn label(&self) -> String {
        self.metadata.title().unwrap_or_else(|| self.id.clone())
    }

    pub fn primary_tag(&self) -> Option<&str> {
        self.tags.first().map(String::as_str)
    }
}
