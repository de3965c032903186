//! Locating and rewriting references inside a document body.
//!
//! Markdown links are found with a small bracket-balancing scanner instead of
//! a regex. Link text may nest square brackets to any depth; a link target may
//! contain at most one level of parentheses, so `(a (1).png)` is a target
//! while `(a (b (c)).png)` is not. Targets ending in a configured attachment
//! extension are allowed to break that rule, see [`LinkScanner::new`].

use std::ops::Range;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::debug;

use crate::resolve::{FileSystem, PathResolver, RefParts, Resolution};

/// A `[text](target)` or `![alt](target)` occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MDLink<'a> {
    /// Byte range of the whole construct, including the leading `!` of images.
    pub range: Range<usize>,
    pub is_image: bool,
    pub text: &'a str,
    pub target: &'a str,
}

#[derive(Debug, Clone)]
pub struct LinkScanner {
    attachment_re: Option<Regex>,
}

impl LinkScanner {
    /// `attachment_extensions` are matched case-insensitively and without the
    /// leading dot. A target ending in one of them may contain unbalanced or
    /// deeply nested parentheses; the target then runs to the first `.ext)`
    /// (optionally with a title before the `)`), but never across `](` or a
    /// `)` followed by whitespace, which would belong to surrounding text.
    pub fn new(attachment_extensions: &[String]) -> LinkScanner {
        let attachment_re = (!attachment_extensions.is_empty()).then(|| {
            let alternatives = attachment_extensions
                .iter()
                .map(|ext| regex::escape(ext))
                .collect::<Vec<_>>()
                .join("|");
            Regex::new(&format!(
                r#"(?i)\A(?<target>(?<path>[^\n]*?\.(?:{alternatives}))(?:\s+"[^"\n]*")?)\)"#
            ))
            .expect("escaped attachment extensions form a valid pattern")
        });

        LinkScanner { attachment_re }
    }

    /// All non-overlapping links of `text`, left to right.
    pub fn links<'s, 'a>(&'s self, text: &'a str) -> impl Iterator<Item = MDLink<'a>> + 's
    where
        'a: 's,
    {
        let mut pos = 0;
        std::iter::from_fn(move || {
            while let Some(offset) = text.get(pos..)?.find('[') {
                let open = pos + offset;
                match self.link_at(text, open) {
                    Some(link) => {
                        pos = link.range.end;
                        return Some(link);
                    }
                    None => pos = open + 1,
                }
            }
            None
        })
    }

    /// Parses a link whose text opens with the `[` at byte `open`.
    pub fn link_at<'a>(&self, text: &'a str, open: usize) -> Option<MDLink<'a>> {
        let bytes = text.as_bytes();
        if bytes.get(open) != Some(&b'[') || (open > 0 && bytes[open - 1] == b'\\') {
            return None;
        }
        let is_image = open > 0 && bytes[open - 1] == b'!';

        let close = Self::closing_bracket(bytes, open + 1)?;
        if bytes.get(close + 1) != Some(&b'(') {
            return None;
        }
        let target_start = close + 2;

        let target_end = match Self::closing_paren(bytes, target_start) {
            Some(end) => end,
            None => {
                let captures = self
                    .attachment_re
                    .as_ref()?
                    .captures(&text[target_start..])?;
                if crosses_construct(captures.name("path")?.as_str()) {
                    return None;
                }
                target_start + captures.name("target")?.end()
            }
        };

        Some(MDLink {
            range: if is_image { open - 1 } else { open }..target_end + 1,
            is_image,
            text: &text[open + 1..close],
            target: &text[target_start..target_end],
        })
    }

    fn closing_bracket(bytes: &[u8], from: usize) -> Option<usize> {
        let mut depth = 0usize;
        let mut i = from;
        while let Some(&b) = bytes.get(i) {
            match b {
                b'\\' => i += 1,
                b'\n' => return None,
                b'[' => depth += 1,
                b']' if depth == 0 => return Some(i),
                b']' => depth -= 1,
                _ => {}
            }
            i += 1;
        }
        None
    }

    fn closing_paren(bytes: &[u8], from: usize) -> Option<usize> {
        let mut depth = 0usize;
        let mut i = from;
        while let Some(&b) = bytes.get(i) {
            match b {
                b'\\' => i += 1,
                b'\n' => return None,
                b'(' if depth == 1 => return None,
                b'(' => depth += 1,
                b')' if depth == 0 => return Some(i),
                b')' => depth -= 1,
                _ => {}
            }
            i += 1;
        }
        None
    }

    /// Escapes bare `[` and `]` in link text. Already escaped brackets and
    /// whole nested link constructs are copied unchanged.
    pub fn escape_brackets(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut i = 0;
        while let Some(c) = text[i..].chars().next() {
            match c {
                '\\' => {
                    out.push(c);
                    if let Some(next) = text[i + 1..].chars().next() {
                        out.push(next);
                        i += next.len_utf8();
                    }
                }
                '[' => match self.link_at(text, i) {
                    Some(link) => {
                        out.push_str(&text[i..link.range.end]);
                        i = link.range.end;
                        continue;
                    }
                    None => out.push_str("\\["),
                },
                ']' => out.push_str("\\]"),
                _ => out.push(c),
            }
            i += c.len_utf8();
        }
        out
    }
}

/// Whether an attachment path spills over into a following link or into prose.
fn crosses_construct(path: &str) -> bool {
    path.contains("](")
        || path
            .match_indices(')')
            .any(|(i, _)| path[i + 1..].starts_with(char::is_whitespace))
}

/// The rewritten body plus the references that exist nowhere on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rewritten {
    pub body: String,
    pub broken: Vec<String>,
}

pub struct LinkRewriter<'a, F: FileSystem> {
    resolver: PathResolver<'a, F>,
    scanner: &'a LinkScanner,
}

impl<'a, F: FileSystem> LinkRewriter<'a, F> {
    pub fn new(resolver: PathResolver<'a, F>, scanner: &'a LinkScanner) -> Self {
        LinkRewriter { resolver, scanner }
    }

    /// Rewrites HTML `src`/`href` attributes, then markdown links and images.
    pub fn rewrite(&self, body: &str, document: &Path) -> Rewritten {
        let mut broken = vec![];
        let body = self.rewrite_html(body, document, &mut broken);
        let body = self.rewrite_markdown(&body, document, &mut broken);
        Rewritten { body, broken }
    }

    fn rewrite_html(&self, text: &str, document: &Path, broken: &mut Vec<String>) -> String {
        static ATTR_RE: Lazy<Regex> = Lazy::new(|| {
            Regex::new(
                r#"(?i)(?<lead>[\s<])(?<attr>src|href)(?<eq>\s*=\s*)(?:"(?<dq>[^"]*)"|'(?<sq>[^']*)')"#,
            )
            .unwrap()
        });

        ATTR_RE
            .replace_all(text, |c: &Captures| {
                let (quote, value) = match (c.name("dq"), c.name("sq")) {
                    (Some(value), _) => ('"', value.as_str()),
                    (None, Some(value)) => ('\'', value.as_str()),
                    (None, None) => return c[0].to_string(),
                };
                let relocated = self.relocate(value, document, broken);
                format!(
                    "{}{}{}{quote}{relocated}{quote}",
                    &c["lead"], &c["attr"], &c["eq"]
                )
            })
            .into_owned()
    }

    fn rewrite_markdown(&self, text: &str, document: &Path, broken: &mut Vec<String>) -> String {
        let mut out = String::with_capacity(text.len());
        let mut last = 0;

        for link in self.scanner.links(text) {
            out.push_str(&text[last..link.range.start]);
            let target = self.relocate(link.target, document, broken);
            if link.is_image {
                out.push_str(&format!("![{}]({target})", link.text));
            } else {
                let inner = self.rewrite_markdown(link.text, document, broken);
                out.push_str(&format!(
                    "[{}]({target})",
                    self.scanner.escape_brackets(&inner)
                ));
            }
            last = link.range.end;
        }

        out.push_str(&text[last..]);
        out
    }

    fn relocate(&self, reference: &str, document: &Path, broken: &mut Vec<String>) -> String {
        let trimmed = reference.trim();
        if let Some(inner) = trimmed
            .strip_prefix('<')
            .and_then(|rest| rest.strip_suffix('>'))
        {
            return format!("<{}>", self.relocate(inner, document, broken));
        }

        let resolved = self.resolver.resolve(trimmed, document);

        match resolved.resolution {
            Resolution::Untouched => return reference.to_string(),
            Resolution::Unresolved => broken.push(RefParts::split(trimmed).path.to_string()),
            Resolution::Local | Resolution::RootFallback => {}
        }
        if resolved.reference != trimmed {
            debug!("rewrote '{trimmed}' -> '{}'", resolved.reference);
        }

        resolved.reference
    }
}
