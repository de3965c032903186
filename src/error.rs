use std::{io, path::PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Posts directory not found: {}", .0.display())]
    MissingInput(PathBuf),
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to write {} after {attempts} attempts: {source}", path.display())]
    Write {
        path: PathBuf,
        attempts: u32,
        #[source]
        source: io::Error,
    },
    #[error("(De)Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl BuildError {
    /// Whether the run could not even start, as opposed to failing midway.
    pub fn is_missing_input(&self) -> bool {
        matches!(self, BuildError::MissingInput(_))
    }
}
