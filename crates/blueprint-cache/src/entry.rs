//! Cache entry variants

use crate::store::Timestamped;
use blueprint_registry::Resolution;
use blueprint_spec::ContentHash;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Cached component resolution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentEntry {
    /// Hash of the node's canonical projection
    pub hash: ContentHash,
    pub timestamp: i64,
    pub resolution: Resolution,
    /// Keys that invalidate this entry (type names or file paths)
    pub dependencies: Vec<String>,
}

/// Cached template render
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateEntry {
    /// Hash of the render context
    pub hash: ContentHash,
    pub timestamp: i64,
    pub template_path: PathBuf,
    pub output: String,
    /// Source modification time at render, if the file existed
    pub source_modified: Option<i64>,
}

/// Metadata about a path on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    pub path: PathBuf,
    pub exists: bool,
    pub is_dir: bool,
    pub size: u64,
    /// Modification time in milliseconds since the epoch
    pub modified: Option<i64>,
}

impl FileInfo {
    /// Record for a path that does not exist
    #[must_use]
    pub fn missing(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            exists: false,
            is_dir: false,
            size: 0,
            modified: None,
        }
    }

    /// Probe the filesystem
    pub async fn probe(path: &Path) -> Self {
        match tokio::fs::metadata(path).await {
            Ok(meta) => Self {
                path: path.to_path_buf(),
                exists: true,
                is_dir: meta.is_dir(),
                size: meta.len(),
                modified: meta.modified().ok().map(system_time_ms),
            },
            Err(_) => Self::missing(path),
        }
    }
}

/// Cached file metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub timestamp: i64,
    pub info: FileInfo,
}

impl Timestamped for ComponentEntry {
    fn timestamp(&self) -> i64 {
        self.timestamp
    }
}

impl Timestamped for TemplateEntry {
    fn timestamp(&self) -> i64 {
        self.timestamp
    }
}

impl Timestamped for FileEntry {
    fn timestamp(&self) -> i64 {
        self.timestamp
    }
}

/// Milliseconds since the epoch for a filesystem timestamp
#[must_use]
pub fn system_time_ms(time: SystemTime) -> i64 {
    chrono::DateTime::<chrono::Utc>::from(time).timestamp_millis()
}

/// Current time in milliseconds since the epoch
#[must_use]
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
