//! Relocation of references found inside documents.
//!
//! A document may live in any subdirectory of the posts tree, but its
//! rewritten body is served from the artifact's directory. [`PathResolver`]
//! turns a reference written relative to the document into one relative to
//! that directory, trying the document's own directory first and the project
//! root second.
//!
//! Existence checks go through [`FileSystem`] so tests can resolve against
//! an in-memory set of paths.

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use once_cell::sync::Lazy;
use pathdiff::diff_paths;
use regex::Regex;

/// The only filesystem query resolution needs.
pub trait FileSystem {
    fn exists(&self, path: &Path) -> bool;
}

/// Queries the real filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealFs;

impl FileSystem for RealFs {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

impl FileSystem for HashSet<PathBuf> {
    fn exists(&self, path: &Path) -> bool {
        self.contains(path)
    }
}

/// How a reference was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Absolute URL, scheme, rooted path or bare fragment; left as written.
    Untouched,
    /// Found relative to the referencing document.
    Local,
    /// Missing next to the document but found under the project root.
    RootFallback,
    /// Found in neither place; relocated as if it were local.
    Unresolved,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub reference: String,
    pub resolution: Resolution,
}

/// A reference split into the relocatable path and the parts reattached verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefParts<'a> {
    pub path: &'a str,
    /// `#fragment` or `?query`, starting at whichever comes first.
    pub suffix: &'a str,
    /// A markdown link title including its leading whitespace, e.g. ` "Title"`.
    pub title: &'a str,
}

impl<'a> RefParts<'a> {
    pub fn split(reference: &'a str) -> RefParts<'a> {
        static TITLE_RE: Lazy<Regex> =
            Lazy::new(|| Regex::new(r#"\s+"[^"]*"\s*\z"#).unwrap());

        let (rest, title) = match TITLE_RE.find(reference) {
            Some(title) if title.start() > 0 => {
                (&reference[..title.start()], &reference[title.start()..])
            }
            _ => (reference, ""),
        };

        let (path, suffix) = match rest.find(['#', '?']) {
            Some(at) => rest.split_at(at),
            None => (rest, ""),
        };

        RefParts {
            path,
            suffix,
            title,
        }
    }
}

/// Whether `reference` points somewhere that must never be relocated.
pub fn is_absolute_reference(reference: &str) -> bool {
    static SCHEME_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"\A[A-Za-z][A-Za-z0-9+.\-]+:").unwrap());

    const PREFIXES: &[&str] = &[
        "http://",
        "https://",
        "//",
        "mailto:",
        "javascript:",
        "data:",
        "tel:",
        "ftp://",
        "/",
        "\\",
    ];

    let lowered = reference.to_ascii_lowercase();
    PREFIXES.iter().any(|prefix| lowered.starts_with(prefix)) || SCHEME_RE.is_match(reference)
}

/// Percent-decodes `text`, falling back to the input when it is not valid UTF-8 once decoded.
pub fn decode(text: &str) -> String {
    urlencoding::decode(text).map_or_else(|_| text.to_string(), |d| d.into_owned())
}

/// Lexically resolves `.` and `..` without touching the filesystem.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();

    for component in path.components() {
        match component {
            Component::CurDir => continue,
            Component::ParentDir => {
                if matches!(
                    result.components().next_back(),
                    Some(Component::Normal(_))
                ) {
                    result.pop();
                } else if !result.has_root() {
                    result.push("..");
                }
            }
            other => result.push(other.as_os_str()),
        }
    }

    result
}

fn to_web_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/").replace(' ', "%20")
}

pub struct PathResolver<'a, F: FileSystem> {
    fs: &'a F,
    project_root: &'a Path,
    output_dir: &'a Path,
}

impl<'a, F: FileSystem> PathResolver<'a, F> {
    pub fn new(fs: &'a F, project_root: &'a Path, output_dir: &'a Path) -> Self {
        PathResolver {
            fs,
            project_root,
            output_dir,
        }
    }

    /// Rewrites `reference`, found in the document at `document`, so it is
    /// valid relative to the output directory.
    pub fn resolve(&self, reference: &str, document: &Path) -> Resolved {
        let untouched = || Resolved {
            reference: reference.to_string(),
            resolution: Resolution::Untouched,
        };

        let parts = RefParts::split(reference);
        if parts.path.is_empty() || is_absolute_reference(parts.path) {
            return untouched();
        }

        let decoded = decode(parts.path);
        let document_dir = document.parent().unwrap_or(self.project_root);

        let local = normalize_path(&document_dir.join(&decoded));
        let (candidate, resolution) = if self.fs.exists(&local) {
            (local, Resolution::Local)
        } else {
            let from_root = normalize_path(&self.project_root.join(&decoded));
            if self.fs.exists(&from_root) {
                (from_root, Resolution::RootFallback)
            } else {
                (local, Resolution::Unresolved)
            }
        };

        let relocated = match diff_paths(&candidate, self.output_dir) {
            Some(relative) if relative.as_os_str().is_empty() => "./".to_string(),
            Some(relative) => to_web_path(&relative),
            None => decoded.replace(' ', "%20"),
        };

        Resolved {
            reference: format!("{relocated}{}{}", parts.suffix, parts.title),
            resolution,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::path::{Path, PathBuf};

    use super::{
        is_absolute_reference, normalize_path, PathResolver, RefParts, Resolution, Resolved,
    };

    fn fake_fs(paths: &[&str]) -> HashSet<PathBuf> {
        paths.iter().map(PathBuf::from).collect()
    }

    fn resolve(fs: &HashSet<PathBuf>, reference: &str, document: &str) -> Resolved {
        PathResolver::new(fs, Path::new("/blog"), Path::new("/blog")).resolve(
            reference,
            Path::new(document),
        )
    }

    #[test]
    fn test_split_title_and_suffix() {
        let parts = RefParts::split(r#"img/a.png#frag "A title""#);
        assert_eq!(parts.path, "img/a.png");
        assert_eq!(parts.suffix, "#frag");
        assert_eq!(parts.title, r#" "A title""#);

        let parts = RefParts::split("page.md?v=1#top");
        assert_eq!(parts.path, "page.md");
        assert_eq!(parts.suffix, "?v=1#top");
        assert_eq!(parts.title, "");
    }

    #[test]
    fn test_absolute_prefixes() {
        for reference in [
            "http://x.org/a.png",
            "HTTPS://x.org",
            "//cdn.org/a.js",
            "mailto:me@x.org",
            "javascript:void(0)",
            "data:image/png;base64,AAAA",
            "/static/a.png",
            "ssh://host",
        ] {
            assert!(is_absolute_reference(reference), "{reference}");
        }
        assert!(!is_absolute_reference("img/a.png"));
        assert!(!is_absolute_reference("../a.md"));
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(
            normalize_path(Path::new("/blog/posts/tech/../img/./a.png")),
            Path::new("/blog/posts/img/a.png")
        );
        assert_eq!(normalize_path(Path::new("/../a")), Path::new("/a"));
    }

    #[test]
    fn test_local_reference_is_relocated_to_output_dir() {
        let fs = fake_fs(&["/blog/posts/tech/img/a.png"]);
        let resolved = resolve(&fs, "img/a.png", "/blog/posts/tech/post.md");
        assert_eq!(resolved.reference, "posts/tech/img/a.png");
        assert_eq!(resolved.resolution, Resolution::Local);
    }

    #[test]
    fn test_root_fallback_when_local_missing() {
        let fs = fake_fs(&["/blog/assets/logo.png"]);
        let resolved = resolve(&fs, "assets/logo.png", "/blog/posts/tech/post.md");
        assert_eq!(resolved.reference, "assets/logo.png");
        assert_eq!(resolved.resolution, Resolution::RootFallback);
    }

    #[test]
    fn test_local_preferred_when_both_exist() {
        let fs = fake_fs(&["/blog/posts/assets/logo.png", "/blog/assets/logo.png"]);
        let resolved = resolve(&fs, "assets/logo.png", "/blog/posts/post.md");
        assert_eq!(resolved.reference, "posts/assets/logo.png");
        assert_eq!(resolved.resolution, Resolution::Local);
    }

    #[test]
    fn test_unresolved_degrades_to_local_candidate() {
        let fs = fake_fs(&[]);
        let resolved = resolve(&fs, "../missing.png", "/blog/posts/tech/post.md");
        assert_eq!(resolved.reference, "posts/missing.png");
        assert_eq!(resolved.resolution, Resolution::Unresolved);
    }

    #[test]
    fn test_percent_decoding_and_space_encoding() {
        let fs = fake_fs(&["/blog/posts/my file (1).png"]);
        let resolved = resolve(&fs, "my%20file%20(1).png", "/blog/posts/post.md");
        assert_eq!(resolved.reference, "posts/my%20file%20(1).png");
        assert_eq!(resolved.resolution, Resolution::Local);
    }

    #[test]
    fn test_suffix_and_title_reattached() {
        let fs = fake_fs(&["/blog/posts/b.md"]);
        let resolved = resolve(&fs, r#"b.md#intro "Read B""#, "/blog/posts/a.md");
        assert_eq!(resolved.reference, r#"posts/b.md#intro "Read B""#);
    }

    #[test]
    fn test_untouched_references() {
        let fs = fake_fs(&[]);
        for reference in ["https://example.com/x.png", "#section", "/abs.png", ""] {
            let resolved = resolve(&fs, reference, "/blog/posts/a.md");
            assert_eq!(resolved.reference, reference);
            assert_eq!(resolved.resolution, Resolution::Untouched);
        }
    }

    #[test]
    fn test_output_dir_below_document() {
        let fs = fake_fs(&["/blog/posts/img/a.png"]);
        let resolver = PathResolver::new(&fs, Path::new("/blog"), Path::new("/blog/site"));
        let resolved = resolver.resolve("img/a.png", Path::new("/blog/posts/p.md"));
        assert_eq!(resolved.reference, "../posts/img/a.png");
    }

    #[test]
    fn test_reference_to_output_dir_itself() {
        let fs = fake_fs(&["/blog"]);
        let resolver = PathResolver::new(&fs, Path::new("/blog"), Path::new("/blog"));

        let resolved = resolver.resolve("../../", Path::new("/blog/posts/tech/p.md"));
        assert_eq!(resolved.reference, "./");
        assert_eq!(resolved.resolution, Resolution::Local);

        let resolved = resolver.resolve("../../#top", Path::new("/blog/posts/tech/p.md"));
        assert_eq!(resolved.reference, "./#top");
    }
}
