//! Error types for the performance cache
//!
//! Cache operations never fail a compilation; these errors surface only in
//! logs and from the fallible helpers.

use blueprint_spec::HashError;
use std::path::PathBuf;

/// Errors raised by cache hashing and persistence
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Cache key could not be derived
    #[error("hash error: {0}")]
    Hash(#[from] HashError),

    /// Snapshot could not be encoded or decoded
    #[error("snapshot encoding error: {0}")]
    Snapshot(#[from] serde_json::Error),

    /// Snapshot was written by an incompatible version
    #[error("unsupported snapshot version {0}")]
    SnapshotVersion(u32),

    /// Snapshot file or directory could not be accessed
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CacheError {
    /// Create IO error for path
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
