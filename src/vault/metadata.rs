use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

/// A front matter value: either a plain string or a `[a, b, c]` list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MetaValue {
    Text(String),
    List(Vec<String>),
}

impl MetaValue {
    fn parse(raw: &str) -> MetaValue {
        match raw
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
        {
            Some(inner) => MetaValue::List(inner.split(',').map(|s| s.trim().to_string()).collect()),
            None => MetaValue::Text(raw.to_string()),
        }
    }

    /// Renders the value as a single string; lists are joined with `", "`.
    pub fn as_text(&self) -> String {
        match self {
            MetaValue::Text(text) => text.clone(),
            MetaValue::List(items) => items.join(", "),
        }
    }
}

/// Parsed key/value metadata from a leading `---` block.
///
/// This is a line-oriented reader, not YAML: each line containing a colon is
/// split on its first colon and both halves are trimmed. Lines without a colon
/// are skipped and a repeated key keeps its last value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FrontMatter(BTreeMap<String, MetaValue>);

impl FrontMatter {
    /// Splits `text` into its front matter and the body that follows it.
    ///
    /// The block closes at the first line consisting of `---`. Without a
    /// well-formed block the metadata is empty and the body is `text` itself.
    pub fn split(text: &str) -> (FrontMatter, &str) {
        static RE: Lazy<Regex> = Lazy::new(|| {
            Regex::new(r"(?s)\A---[ \t]*\r?\n(?<metadata>.*?)\r?\n---[ \t]*(?:\r?\n|\z)").unwrap()
        });

        let Some(captures) = RE.captures(text) else {
            return (FrontMatter::default(), text);
        };
        let (Some(full), Some(block)) = (captures.get(0), captures.name("metadata")) else {
            return (FrontMatter::default(), text);
        };

        let entries = block
            .as_str()
            .lines()
            .filter_map(|line| line.split_once(':'))
            .map(|(key, value)| (key.trim().to_string(), MetaValue::parse(value.trim())))
            .collect();

        (FrontMatter(entries), &text[full.end()..])
    }

    pub fn get(&self, key: &str) -> Option<&MetaValue> {
        self.0.get(key)
    }

    pub fn title(&self) -> Option<String> {
        self.get("title").map(MetaValue::as_text)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}
