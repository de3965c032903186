//! Graph artifact assembled from a constructed [`Vault`].
//!
//! Every document becomes a [`Node`]. Edges come from three sources:
//!
//! | Kind | Wire name | Origin |
//! |------|-----------|--------|
//! | [`EdgeKind::Explicit`] | `md` | `[text](target.md)` in the rewritten body |
//! | [`EdgeKind::Wiki`] | `wiki` | `[[Target]]` / `[[Target\|alias]]`, when enabled |
//! | [`EdgeKind::TagChain`] | `tag_group` | consecutive documents sharing a tag |
//!
//! Documents sharing a tag are chained in discovery order (A-B, B-C, ...)
//! rather than all linked to one hub, so a tag contributes at most one
//! incoming and one outgoing chain edge per document.
//!
//! Self-edges are never emitted and the final edge list holds each
//! `(source, target, kind)` triple once, in first-seen order.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use super::{link_target_key, Document, Vault};
use crate::config::Settings;
use crate::rewrite::LinkScanner;

/// Group assigned to documents without any tag.
pub const DEFAULT_GROUP: &str = "default";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Node {
    pub id: String,
    pub label: String,
    pub group: String,
    pub all_tags: Vec<String>,
    pub content: String,
    pub val: u32,
}

impl From<&Document> for Node {
    fn from(document: &Document) -> Self {
        Node {
            id: document.id.clone(),
            label: document.label(),
            group: document.primary_tag().unwrap_or(DEFAULT_GROUP).to_string(),
            all_tags: document.tags.clone(),
            content: document.body.clone(),
            val: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EdgeKind {
    #[serde(rename = "md")]
    Explicit,
    #[serde(rename = "tag_group")]
    TagChain,
    #[serde(rename = "wiki")]
    Wiki,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub kind: EdgeKind,
}

/// The serialized artifact: `{"nodes": [...], "links": [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Graph {
    pub nodes: Vec<Node>,
    pub links: Vec<Edge>,
}

impl Graph {
    pub fn edges_of_kind(&self, kind: EdgeKind) -> impl Iterator<Item = &Edge> {
        self.links.iter().filter(move |edge| edge.kind == kind)
    }
}

pub struct GraphBuilder<'a> {
    vault: &'a Vault,
    scanner: LinkScanner,
    wiki_links: bool,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(vault: &'a Vault, settings: &Settings) -> Self {
        GraphBuilder {
            vault,
            scanner: LinkScanner::new(&settings.attachment_extensions),
            wiki_links: settings.wiki_links,
        }
    }

    pub fn build(&self) -> Graph {
        let nodes = self.vault.documents().iter().map(Node::from).collect();

        let mut links = vec![];
        for document in self.vault.documents() {
            links.extend(self.explicit_links(document));
            if self.wiki_links {
                links.extend(self.wiki_links(document));
            }
        }
        links.extend(self.tag_chain_links());

        Graph {
            nodes,
            links: dedup_edges(links),
        }
    }

    fn explicit_links(&self, document: &Document) -> Vec<Edge> {
        let id_map = self.vault.id_map();

        self.scanner
            .links(&document.body)
            .filter_map(|link| link_target_key(link.target))
            .filter_map(|key| id_map.get(&key))
            .filter(|target| *target != document.id)
            .map(|target| Edge {
                source: document.id.clone(),
                target: target.to_string(),
                kind: EdgeKind::Explicit,
            })
            .collect()
    }

    fn wiki_links(&self, document: &Document) -> Vec<Edge> {
        static WIKI_LINK_RE: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"\[\[(?<inner>[^\[\]\n]+?)\]\]").unwrap());

        let id_map = self.vault.id_map();

        WIKI_LINK_RE
            .captures_iter(&document.body)
            .filter_map(|c| c.name("inner"))
            .map(|inner| inner.as_str().split('|').next().unwrap_or_default().trim())
            .filter(|target| !target.is_empty())
            .filter_map(|target| id_map.find_ignore_case(target))
            .filter(|target| *target != document.id)
            .map(|target| Edge {
                source: document.id.clone(),
                target: target.to_string(),
                kind: EdgeKind::Wiki,
            })
            .collect()
    }

    fn tag_chain_links(&self) -> Vec<Edge> {
        self.vault
            .tag_index()
            .into_iter()
            .filter(|(_, ids)| ids.len() >= 2)
            .flat_map(|(_, ids)| {
                ids.windows(2)
                    .map(|pair| Edge {
                        source: pair[0].to_string(),
                        target: pair[1].to_string(),
                        kind: EdgeKind::TagChain,
                    })
                    .collect::<Vec<_>>()
            })
            .filter(|edge| edge.source != edge.target)
            .collect()
    }
}

/// Keeps the first occurrence of every `(source, target, kind)` triple.
pub fn dedup_edges(edges: Vec<Edge>) -> Vec<Edge> {
    let mut seen = HashSet::new();
    edges
        .into_iter()
        .filter(|edge| seen.insert(edge.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{dedup_edges, Edge, EdgeKind, Graph, Node};

    fn edge(source: &str, target: &str, kind: EdgeKind) -> Edge {
        Edge {
            source: source.into(),
            target: target.into(),
            kind,
        }
    }

    #[test]
    fn test_dedup_keeps_first_occurrence_per_kind() {
        let edges = vec![
            edge("a", "b", EdgeKind::Explicit),
            edge("a", "b", EdgeKind::TagChain),
            edge("b", "c", EdgeKind::Explicit),
            edge("a", "b", EdgeKind::Explicit),
        ];
        assert_eq!(
            dedup_edges(edges),
            vec![
                edge("a", "b", EdgeKind::Explicit),
                edge("a", "b", EdgeKind::TagChain),
                edge("b", "c", EdgeKind::Explicit),
            ]
        );
    }

    #[test]
    fn test_serialized_shape() {
        let graph = Graph {
            nodes: vec![Node {
                id: "笔记".into(),
                label: "笔记".into(),
                group: "default".into(),
                all_tags: vec![],
                content: "正文".into(),
                val: 1,
            }],
            links: vec![edge("a", "b", EdgeKind::TagChain)],
        };
        let json = serde_json::to_string(&graph).unwrap();
        assert_eq!(
            json,
            r#"{"nodes":[{"id":"笔记","label":"笔记","group":"default","all_tags":[],"content":"正文","val":1}],"links":[{"source":"a","target":"b","type":"tag_group"}]}"#
        );
    }
}
