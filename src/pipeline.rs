//! One full rebuild: walk, parse, rewrite, tag, build the graph, write it.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use tempfile::NamedTempFile;
use tracing::{info, warn};

use crate::config::{Layout, Settings};
use crate::error::BuildError;
use crate::vault::graph::{Graph, GraphBuilder};
use crate::vault::Vault;

/// What a successful run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    pub output: PathBuf,
    pub nodes: usize,
    pub links: usize,
    pub skipped: usize,
    pub broken_links: usize,
}

/// Builds the graph for `layout` without writing anything.
pub fn build_graph(settings: &Settings, layout: &Layout) -> Result<(Vault, Graph), BuildError> {
    let vault = Vault::construct_vault(settings, layout)?;

    for document in vault.documents() {
        for reference in &document.broken_links {
            warn!(
                "unresolved reference '{reference}' in {}",
                document.path.display()
            );
        }
    }

    let graph = GraphBuilder::new(&vault, settings).build();
    Ok((vault, graph))
}

/// Runs the whole pipeline and replaces the artifact at `layout.output_file`.
pub fn run(settings: &Settings, layout: &Layout) -> Result<BuildReport, BuildError> {
    info!("building from {}", layout.posts_dir.display());

    let (vault, graph) = build_graph(settings, layout)?;
    let bytes = serialize(&graph, settings.pretty)?;
    write_artifact(
        &layout.output_file,
        &bytes,
        settings.write_attempts,
        Duration::from_millis(settings.write_retry_delay_ms),
    )?;

    let report = BuildReport {
        output: layout.output_file.clone(),
        nodes: graph.nodes.len(),
        links: graph.links.len(),
        skipped: vault.skipped().len(),
        broken_links: vault
            .documents()
            .iter()
            .map(|document| document.broken_links.len())
            .sum(),
    };
    info!(
        "generated {} nodes and {} links into {}",
        report.nodes,
        report.links,
        report.output.display()
    );

    Ok(report)
}

pub fn serialize(graph: &Graph, pretty: bool) -> Result<Vec<u8>, BuildError> {
    let bytes = match pretty {
        true => serde_json::to_vec_pretty(graph)?,
        false => serde_json::to_vec(graph)?,
    };
    Ok(bytes)
}

/// Writes `bytes` to a temporary sibling of `path` and renames it into place,
/// retrying up to `attempts` times.
pub fn write_artifact(
    path: &Path,
    bytes: &[u8],
    attempts: u32,
    delay: Duration,
) -> Result<(), BuildError> {
    let attempts = attempts.max(1);
    let mut attempt = 1;

    loop {
        match write_atomically(path, bytes) {
            Ok(()) => return Ok(()),
            Err(source) if attempt >= attempts => {
                return Err(BuildError::Write {
                    path: path.to_path_buf(),
                    attempts,
                    source,
                })
            }
            Err(err) => {
                warn!(
                    "writing {} failed (attempt {attempt}/{attempts}): {err}",
                    path.display()
                );
                attempt += 1;
                thread::sleep(delay);
            }
        }
    }
}

fn write_atomically(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(bytes)?;
    file.flush()?;
    file.persist(path).map_err(|err| err.error)?;
    Ok(())
}
