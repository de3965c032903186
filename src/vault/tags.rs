//! Inline `#tag` extraction.
//!
//! Tag names are made of ASCII letters, digits, `_`, `-` and CJK unified
//! ideographs. Two boundary policies exist, see [`TagStyle`]:
//!
//! - `Boundary`: the `#` must start the text or follow whitespace, so
//!   `word#tag` and `[#tag]` are not tags.
//! - `Guarded`: the `#` may follow anything except `#`, `&`, `(` or `[`,
//!   which keeps anchors, HTML entities and link syntax out while accepting
//!   `word#tag`.

use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::TagStyle;

/// Returns the distinct tags of `text` in first-occurrence order.
pub fn extract_tags(text: &str, style: TagStyle) -> Vec<String> {
    static BOUNDARY_RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?:\A|\s)\#(?<tag>[0-9A-Za-z_\x{4E00}-\x{9FA5}-]+)").unwrap()
    });
    static GUARDED_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"\#(?<tag>[0-9A-Za-z_\x{4E00}-\x{9FA5}-]+)").unwrap());

    let tags: Vec<&str> = match style {
        TagStyle::Boundary => BOUNDARY_RE
            .captures_iter(text)
            .filter_map(|c| c.name("tag"))
            .map(|tag| tag.as_str())
            .collect(),
        TagStyle::Guarded => GUARDED_RE
            .captures_iter(text)
            .filter(|c| {
                c.get(0).is_some_and(|full| {
                    !matches!(
                        text[..full.start()].chars().next_back(),
                        Some('#' | '&' | '(' | '[')
                    )
                })
            })
            .filter_map(|c| c.name("tag"))
            .map(|tag| tag.as_str())
            .collect(),
    };

    tags.into_iter().unique().map(String::from).collect()
}

#[cfg(test)]
mod tests {
    use super::extract_tags;
    use crate::config::TagStyle::{Boundary, Guarded};

    #[test]
    fn test_tags_in_first_occurrence_order() {
        let tags = extract_tags("#beta intro #alpha\n#beta again #gamma", Boundary);
        assert_eq!(tags, vec!["beta", "alpha", "gamma"]);
    }

    #[test]
    fn test_tags_are_case_sensitive() {
        assert_eq!(extract_tags("#Rust #rust", Boundary), vec!["Rust", "rust"]);
    }

    #[test]
    fn test_cjk_and_hyphenated_tags() {
        assert_eq!(
            extract_tags("笔记 #标签 and #my-note", Boundary),
            vec!["标签", "my-note"]
        );
    }

    #[test]
    fn test_boundary_requires_whitespace_before_hash() {
        assert!(extract_tags("see page#section and [#x](y)", Boundary).is_empty());
        assert!(extract_tags("## Heading", Boundary).is_empty());
    }

    #[test]
    fn test_guarded_rejects_anchor_entity_and_link_prefixes() {
        let text = "&#38; (#anchor) [#link] ##double word#inline";
        assert_eq!(extract_tags(text, Guarded), vec!["inline"]);
    }

    #[test]
    fn test_guarded_accepts_line_start_and_whitespace() {
        assert_eq!(extract_tags("#one two #three", Guarded), vec!["one", "three"]);
    }

    #[test]
    fn test_tag_stops_at_punctuation() {
        assert_eq!(extract_tags("end #done.", Boundary), vec!["done"]);
    }
}
