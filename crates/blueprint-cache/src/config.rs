//! Cache configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Shared configuration of the three cache stores
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum component resolutions kept
    pub max_components: usize,
    /// Maximum rendered templates kept
    pub max_templates: usize,
    /// Maximum file metadata records kept
    pub max_files: usize,
    /// Time-to-live of every entry, in milliseconds
    pub ttl_ms: u64,
    /// Load on `initialize` and allow `save_to_disk`
    pub persist: bool,
    /// Directory holding the snapshot file
    pub cache_dir: PathBuf,
}

impl CacheConfig {
    /// Default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Same capacity for all stores
    #[must_use]
    pub fn with_capacity(mut self, max_entries: usize) -> Self {
        self.max_components = max_entries;
        self.max_templates = max_entries;
        self.max_files = max_entries;
        self
    }

    /// Set the entry time-to-live
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Enable disk persistence under `dir`
    #[must_use]
    pub fn persisted_in(mut self, dir: impl Into<PathBuf>) -> Self {
        self.persist = true;
        self.cache_dir = dir.into();
        self
    }

    /// Entry time-to-live
    #[must_use]
    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_components: 500,
            max_templates: 200,
            max_files: 1000,
            ttl_ms: 60 * 60 * 1000,
            persist: false,
            cache_dir: PathBuf::from(".blueprint-cache"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides() {
        let config = CacheConfig::new()
            .with_capacity(10)
            .with_ttl(Duration::from_secs(2))
            .persisted_in("/tmp/bp");
        assert_eq!(config.max_templates, 10);
        assert_eq!(config.ttl_ms, 2000);
        assert!(config.persist);
    }

    #[test]
    fn partial_document_keeps_defaults() {
        let config: CacheConfig = serde_json::from_str(r#"{"max_files": 3}"#).unwrap();
        assert_eq!(config.max_files, 3);
        assert_eq!(config.max_components, 500);
        assert!(!config.persist);
    }
}
