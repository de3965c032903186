//! Shared test utilities.
//!
//! This module provides common helpers used across multiple test modules.
//! It is only compiled when running tests.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::config::{Layout, Settings};
use crate::vault::Vault;

/// Creates a temporary project directory with an empty `posts/` folder.
///
/// Returns a tuple of (TempDir, PathBuf) where:
/// - TempDir: The temp directory handle (must be kept alive for the test duration)
/// - PathBuf: The project root
///
/// The project root is a non-hidden `project` subdirectory, so a temp dir
/// created under something like `/tmp/.tmpXXXXX` never looks like an
/// ignored directory.
pub fn create_test_project_dir() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let project_dir = temp_dir.path().join("project");
    fs::create_dir_all(project_dir.join("posts")).expect("Failed to create posts directory");
    (temp_dir, project_dir)
}

/// Writes `content` to `posts/<relative>`, creating parent directories.
pub fn write_post(project_dir: &Path, relative: &str, content: &str) {
    let path = project_dir.join("posts").join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create post directory");
    }
    fs::write(&path, content).expect("Failed to write post");
}

/// Creates a project, lets `setup_fn` populate it, and constructs the vault.
///
/// # Example
///
/// ```ignore
/// let (_temp_dir, layout, vault) = create_test_vault(&Settings::default(), |dir| {
///     write_post(dir, "a.md", "#topic");
/// });
/// ```
pub fn create_test_vault<F>(settings: &Settings, setup_fn: F) -> (TempDir, Layout, Vault)
where
    F: FnOnce(&PathBuf),
{
    let (temp_dir, project_dir) = create_test_project_dir();
    setup_fn(&project_dir);
    let layout = Layout::new(&project_dir, settings);
    let vault = Vault::construct_vault(settings, &layout).expect("Failed to construct test vault");
    (temp_dir, layout, vault)
}
