//! Error types for registry loading

use std::path::PathBuf;

/// Errors raised while building a registry from external data
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// Registry document is not valid JSON or has the wrong shape
    #[error("invalid registry document: {0}")]
    Decode(#[from] serde_json::Error),

    /// Registry file could not be read
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RegistryError {
    /// Create IO error for path
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
