//! Helper types and utilities for the vault module.

use std::collections::HashMap;
use std::path::Path;

use crate::resolve::{decode, is_absolute_reference, RefParts};

/// Maps every file name, with and without its extension, to a document id.
///
/// Entries keep insertion order so that lookups scanning all keys (wiki
/// references) are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentifierMap {
    entries: Vec<(String, String)>,
    index: HashMap<String, usize>,
}

impl IdentifierMap {
    pub fn insert(&mut self, key: String, id: String) {
        match self.index.get(&key) {
            Some(&at) => self.entries[at].1 = id,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, id));
            }
        }
    }

    /// Registers `file_name` (e.g. `note.md`) and its stem for `id`.
    pub fn register(&mut self, file_name: &str, id: &str) {
        self.insert(file_name.to_string(), id.to_string());
        self.insert(id.to_string(), id.to_string());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.index.get(key).map(|&at| self.entries[at].1.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// First entry, in insertion order, whose key equals `key` ignoring case.
    pub fn find_ignore_case(&self, key: &str) -> Option<&str> {
        let key = key.to_lowercase();
        self.entries
            .iter()
            .find(|(candidate, _)| candidate.to_lowercase() == key)
            .map(|(_, id)| id.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The document id a file path reduces to: its file name without extension.
pub fn file_id(path: &Path) -> Option<String> {
    path.file_stem()?.to_str().map(String::from)
}

/// The id-map key a markdown link target points at, if it can point at a document.
///
/// The title and fragment/query are dropped, the rest is percent-decoded and
/// reduced to its last path segment without extension. Absolute URLs yield `None`.
pub fn link_target_key(target: &str) -> Option<String> {
    let target = target.trim();
    let target = target
        .strip_prefix('<')
        .and_then(|rest| rest.strip_suffix('>'))
        .unwrap_or(target);
    let parts = RefParts::split(target);
    if parts.path.is_empty() || is_absolute_reference(parts.path) {
        return None;
    }

    let decoded = decode(parts.path);
    let last = decoded.rsplit(['/', '\\']).next()?;
    file_id(Path::new(last)).filter(|id| !id.is_empty())
}
