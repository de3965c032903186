use std::path::{Path, PathBuf};

use anyhow::anyhow;
use config::{Config, File};
use serde::Deserialize;

#[derive(Deserialize, Debug, Clone)]
pub struct Settings {
    /// Directory holding the markdown posts, relative to the project root
    pub posts_dir: String,
    /// Artifact location, relative to the project root
    pub output_file: String,
    /// Directory names skipped during the walk, matched against the bare name
    pub ignored_dirs: Vec<String>,
    pub tag_style: TagStyle,
    /// Emit `wiki` edges for `[[Target]]` references
    pub wiki_links: bool,
    /// Extensions (without the dot) whose links may contain unbalanced brackets
    pub attachment_extensions: Vec<String>,
    pub write_attempts: u32,
    pub write_retry_delay_ms: u64,
    pub pretty: bool,
}

/// Which characters may precede the `#` of an inline tag.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
pub enum TagStyle {
    /// `#` must follow whitespace or start the text.
    Boundary,
    /// `#` must not follow `#`, `&`, `(` or `[`.
    Guarded,
}

/// Overrides taken from the command line. `None` leaves the layered value alone.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub posts_dir: Option<String>,
    pub output_file: Option<String>,
    pub wiki_links: Option<bool>,
    pub tag_style: Option<TagStyle>,
    pub pretty: Option<bool>,
}

const DEFAULT_IGNORED_DIRS: &[&str] = &[
    ".git",
    ".svn",
    ".hg",
    ".idea",
    ".vscode",
    "node_modules",
    "__pycache__",
    ".venv",
    "target",
    "dist",
    "build",
];

impl Settings {
    pub fn new(root_dir: &Path, overrides: &Overrides) -> anyhow::Result<Settings> {
        let expanded = shellexpand::tilde("~/.config/postgraph/settings");
        let settings = Config::builder()
            .add_source(File::with_name(&expanded).required(false))
            .add_source(
                File::with_name(&format!(
                    "{}/.postgraph",
                    root_dir
                        .to_str()
                        .ok_or(anyhow!("Can't convert root_dir to str"))?
                ))
                .required(false),
            )
            .set_default("posts_dir", "posts")?
            .set_default("output_file", "posts_data.json")?
            .set_default(
                "ignored_dirs",
                DEFAULT_IGNORED_DIRS
                    .iter()
                    .map(|dir| dir.to_string())
                    .collect::<Vec<_>>(),
            )?
            .set_default("tag_style", "Boundary")?
            .set_default("wiki_links", false)?
            .set_default("attachment_extensions", vec!["pdf".to_string()])?
            .set_default("write_attempts", 3)?
            .set_default("write_retry_delay_ms", 200)?
            .set_default("pretty", true)?
            .set_override_option("posts_dir", overrides.posts_dir.clone())?
            .set_override_option("output_file", overrides.output_file.clone())?
            .set_override_option("wiki_links", overrides.wiki_links)?
            .set_override_option(
                "tag_style",
                overrides.tag_style.map(|style| match style {
                    TagStyle::Boundary => "Boundary",
                    TagStyle::Guarded => "Guarded",
                }),
            )?
            .set_override_option("pretty", overrides.pretty)?
            .build()
            .map_err(|err| anyhow!("Build err: {err}"))?;

        let settings = settings.try_deserialize::<Settings>()?;

        anyhow::Ok(settings)
    }

    pub fn is_ignored_dir(&self, name: &str) -> bool {
        self.ignored_dirs.iter().any(|dir| dir == name)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            posts_dir: "posts".to_string(),
            output_file: "posts_data.json".to_string(),
            ignored_dirs: DEFAULT_IGNORED_DIRS
                .iter()
                .map(|dir| dir.to_string())
                .collect(),
            tag_style: TagStyle::Boundary,
            wiki_links: false,
            attachment_extensions: vec!["pdf".to_string()],
            write_attempts: 3,
            write_retry_delay_ms: 200,
            pretty: true,
        }
    }
}

/// Absolute locations for one build, resolved once from the project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub project_root: PathBuf,
    pub posts_dir: PathBuf,
    pub output_file: PathBuf,
}

impl Layout {
    pub fn new(project_root: &Path, settings: &Settings) -> Layout {
        Layout {
            project_root: project_root.to_path_buf(),
            posts_dir: project_root.join(&settings.posts_dir),
            output_file: project_root.join(&settings.output_file),
        }
    }

    /// Directory every rewritten reference is made relative to.
    pub fn output_dir(&self) -> &Path {
        self.output_file.parent().unwrap_or(&self.project_root)
    }
}
