mod helpers;
mod metadata;
mod tags;
mod types;

pub mod graph;


pub use helpers::{file_id, link_target_key, IdentifierMap};
pub use metadata::{FrontMatter, MetaValue};
pub use tags::extract_tags;
pub use types::Document;

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use itertools::Itertools;
use rayon::prelude::*;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::{Layout, Settings};
use crate::error::BuildError;
use crate::resolve::{FileSystem, PathResolver, RealFs};
use crate::rewrite::{LinkRewriter, LinkScanner};

/// Every successfully parsed document of one build, in discovery order.
///
/// Construction is the first of two phases: documents are parsed in parallel
/// and need nothing from each other. Edges are only built afterwards, from the
/// complete [`IdentifierMap`], by [`graph::GraphBuilder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vault {
    documents: Vec<Document>,
    id_map: IdentifierMap,
    skipped: Vec<PathBuf>,
}

impl Vault {
    pub fn construct_vault(settings: &Settings, layout: &Layout) -> Result<Vault, BuildError> {
        Self::construct_vault_with(settings, layout, &RealFs)
    }

    pub fn construct_vault_with<F: FileSystem + Sync>(
        settings: &Settings,
        layout: &Layout,
        fs: &F,
    ) -> Result<Vault, BuildError> {
        let md_file_paths = discover(settings, &layout.posts_dir)?;
        debug!("discovered {} markdown files", md_file_paths.len());

        let scanner = LinkScanner::new(&settings.attachment_extensions);

        let parsed: Vec<Result<Document, BuildError>> = md_file_paths
            .par_iter()
            .map(|path| -> Result<Document, BuildError> {
                let text = std::fs::read_to_string(path).map_err(|source| BuildError::Read {
                    path: path.clone(),
                    source,
                })?;
                let resolver = PathResolver::new(fs, &layout.project_root, layout.output_dir());
                let rewriter = LinkRewriter::new(resolver, &scanner);

                Ok(Document::new(settings, &rewriter, &text, path.clone()))
            })
            .collect();

        let mut vault = Vault {
            documents: vec![],
            id_map: IdentifierMap::default(),
            skipped: vec![],
        };
        let mut positions: HashMap<String, usize> = HashMap::new();

        for result in parsed {
            let document = match result {
                Ok(document) => document,
                Err(err) => {
                    warn!("skipping document: {err}");
                    if let BuildError::Read { path, .. } = err {
                        vault.skipped.push(path);
                    }
                    continue;
                }
            };

            if let Some(file_name) = document.path.file_name().and_then(|name| name.to_str()) {
                vault.id_map.register(file_name, &document.id);
            }

            match positions.get(&document.id) {
                Some(&at) => {
                    warn!(
                        "id '{}' of {} collides with {}; keeping the later file",
                        document.id,
                        document.path.display(),
                        vault.documents[at].path.display()
                    );
                    vault.documents[at] = document;
                }
                None => {
                    positions.insert(document.id.clone(), vault.documents.len());
                    vault.documents.push(document);
                }
            }
        }

        Ok(vault)
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn get_document(&self, id: &str) -> Option<&Document> {
        self.documents.iter().find(|document| document.id == id)
    }

    pub fn id_map(&self) -> &IdentifierMap {
        &self.id_map
    }

    /// Files that were found but could not be read.
    pub fn skipped(&self) -> &[PathBuf] {
        &self.skipped
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    /// Tag to carrying document ids, both in discovery order.
    pub fn tag_index(&self) -> Vec<(&str, Vec<&str>)> {
        let mut index: Vec<(&str, Vec<&str>)> = vec![];
        let mut positions: HashMap<&str, usize> = HashMap::new();

        for document in &self.documents {
            for tag in &document.tags {
                let at = *positions.entry(tag.as_str()).or_insert_with(|| {
                    index.push((tag.as_str(), vec![]));
                    index.len() - 1
                });
                index[at].1.push(document.id.as_str());
            }
        }

        index
    }
}

/// Sorted `.md` files below `posts_dir`, skipping ignored directory names.
fn discover(settings: &Settings, posts_dir: &Path) -> Result<Vec<PathBuf>, BuildError> {
    if !posts_dir.is_dir() {
        return Err(BuildError::MissingInput(posts_dir.to_path_buf()));
    }

    let md_file_paths = WalkDir::new(posts_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            e.depth() == 0
                || !e.file_type().is_dir()
                || !e
                    .file_name()
                    .to_str()
                    .map(|name| settings.is_ignored_dir(name))
                    .unwrap_or(false)
        })
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!("skipping unreadable entry: {err}");
                None
            }
        })
        .filter(|f| f.file_type().is_file())
        .filter(|f| f.path().extension().and_then(|e| e.to_str()) == Some("md"))
        .map(|f| f.into_path())
        .collect_vec();

    Ok(md_file_paths)
}

impl Document {
    fn new<F: FileSystem>(
        settings: &Settings,
        rewriter: &LinkRewriter<'_, F>,
        text: &str,
        path: PathBuf,
    ) -> Document {
        let (metadata, raw_body) = FrontMatter::split(text);
        let rewritten = rewriter.rewrite(raw_body, &path);
        let tags = extract_tags(&rewritten.body, settings.tag_style);
        let id = file_id(&path).unwrap_or_default();

        Document {
            path,
            id,
            metadata,
            raw_body: raw_body.to_string(),
            body: rewritten.body,
            tags,
            broken_links: rewritten.broken,
        }
    }
}
