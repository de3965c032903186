//! postgraph: turns a tree of markdown posts into a node-link graph artifact.
//!
//! # Overview
//!
//! Each run is a full rebuild in two phases:
//!
//! 1. Every `.md` file under the posts directory is parsed on its own: front
//!    matter is split off, relative links and images are relocated so they
//!    stay valid from the artifact's directory, and inline `#tags` are
//!    collected.
//! 2. Once every document exists, explicit links, optional wiki references
//!    and tag chains are resolved into deduplicated edges.
//!
//! The result is serialized as `{"nodes": [...], "links": [...]}` JSON.
//!
//! # Architecture
//!
//! - [`vault`]: documents, front matter, tags and graph construction
//! - [`resolve`]: relocation of a single reference, with local-then-root fallback
//! - [`rewrite`]: the link scanner and the body rewriter built on it
//! - [`pipeline`]: orchestration and artifact writing
//! - [`config`]: layered settings and the absolute layout of a build
//!
//! # Usage
//!
//! ```ignore
//! use postgraph::config::{Layout, Settings};
//!
//! let settings = Settings::default();
//! let layout = Layout::new(&project_root, &settings);
//! let report = postgraph::pipeline::run(&settings, &layout)?;
//! ```

pub mod config;
pub mod error;
pub mod pipeline;
pub mod resolve;
pub mod rewrite;
pub mod vault;

// Test utilities (only available in test builds)
#[cfg(test)]
pub mod test_utils;
