//! Performance cache
//!
//! Three independent stores share one [`CacheConfig`]:
//!
//! - component resolutions, keyed by the hash of the node's canonical
//!   projection `{type, props, children, conditions}`
//! - template renders, keyed by `templatePath:contextHash` and additionally
//!   guarded by the template file's modification time
//! - file metadata, keyed by the raw path and guarded by the current
//!   modification time (or continued absence for negative entries)
//!
//! Every read checks the TTL first; stale entries are evicted on the spot and
//! reported as a miss. The cache is an explicitly constructed object meant to
//! be shared behind an `Arc`. The stores sit behind one mutex, which is never
//! held across an await point; filesystem probes happen before locking.

use crate::config::CacheConfig;
use crate::entry::{now_ms, ComponentEntry, FileEntry, FileInfo, TemplateEntry};
use crate::error::CacheError;
use crate::store::{Store, StoreStats};
use blueprint_registry::Resolution;
use blueprint_spec::{ComponentNode, Condition, ContentHash, Props};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

const SNAPSHOT_FILE: &str = "snapshot.json";
const SNAPSHOT_VERSION: u32 = 1;

/// Statistics for all three stores
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub components: StoreStats,
    pub templates: StoreStats,
    pub files: StoreStats,
}

#[derive(Debug)]
struct Stores {
    components: Store<ComponentEntry>,
    templates: Store<TemplateEntry>,
    files: Store<FileEntry>,
}

impl Stores {
    fn new(config: &CacheConfig) -> Self {
        Self {
            components: Store::new(config.max_components),
            templates: Store::new(config.max_templates),
            files: Store::new(config.max_files),
        }
    }
}

#[derive(Serialize)]
struct NodeProjection<'a> {
    #[serde(rename = "type")]
    component_type: &'a str,
    props: &'a Props,
    children: &'a [ComponentNode],
    conditions: Option<&'a [Condition]>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    saved_at: i64,
    components: Vec<(String, ComponentEntry)>,
    templates: Vec<(String, TemplateEntry)>,
    files: Vec<(String, FileEntry)>,
}

/// Hash-keyed cache of resolutions, template renders and file metadata
#[derive(Debug)]
pub struct PerformanceCache {
    config: CacheConfig,
    stores: Mutex<Stores>,
}

impl PerformanceCache {
    /// Create an empty in-memory cache
    #[must_use]
    pub fn new(config: CacheConfig) -> Self {
        let stores = Mutex::new(Stores::new(&config));
        Self { config, stores }
    }

    /// Cache configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    fn expired(&self, timestamp: i64, now: i64) -> bool {
        let ttl = i64::try_from(self.config.ttl_ms).unwrap_or(i64::MAX);
        now.saturating_sub(timestamp) >= ttl
    }

    // ---------------------------------------------------------------------
    // Components
    // ---------------------------------------------------------------------

    /// Cache key of a component node
    ///
    /// The node id is not part of the key. Top-level prop order is: two
    /// nodes whose props differ only in insertion order hash differently.
    ///
    /// # Errors
    /// Returns [`CacheError::Hash`] if the projection cannot be encoded.
    pub fn component_key(node: &ComponentNode) -> Result<ContentHash, CacheError> {
        let projection = NodeProjection {
            component_type: &node.component_type,
            props: &node.props,
            children: &node.children,
            conditions: node.conditions.as_deref(),
        };
        Ok(ContentHash::of_json(&projection)?)
    }

    /// Cached resolution for a node, if present and not expired
    #[must_use]
    pub fn get_cached_component(&self, node: &ComponentNode) -> Option<Resolution> {
        let key = match Self::component_key(node) {
            Ok(hash) => hash.to_hex(),
            Err(e) => {
                tracing::warn!(component = %node.id, "cannot hash component: {e}");
                return None;
            }
        };
        let now = now_ms();
        let mut stores = self.stores.lock();
        let hit = stores
            .components
            .get(&key, |entry| !self.expired(entry.timestamp, now))
            .map(|entry| entry.resolution.clone());
        tracing::debug!(component = %node.id, hit = hit.is_some(), "component cache lookup");
        hit
    }

    /// Store a resolution for a node
    ///
    /// The resolution's declared dependencies become the entry's
    /// invalidation keys.
    pub fn cache_component(&self, node: &ComponentNode, resolution: &Resolution) {
        let hash = match Self::component_key(node) {
            Ok(hash) => hash,
            Err(e) => {
                tracing::warn!(component = %node.id, "cannot hash component: {e}");
                return;
            }
        };
        let entry = ComponentEntry {
            hash,
            timestamp: now_ms(),
            resolution: resolution.clone(),
            dependencies: resolution.dependencies.clone(),
        };
        self.stores.lock().components.insert(hash.to_hex(), entry);
    }

    // ---------------------------------------------------------------------
    // Templates
    // ---------------------------------------------------------------------

    /// Hash of a render context
    #[must_use]
    pub fn context_hash(context: &Value) -> ContentHash {
        ContentHash::of_bytes(context.to_string().as_bytes())
    }

    fn template_key(template_path: &Path, context: &Value) -> String {
        format!("{}:{}", template_path.display(), Self::context_hash(context))
    }

    /// Cached render of `template_path` with `context`
    ///
    /// A hit requires an unexpired TTL *and* an unchanged source
    /// modification time.
    pub async fn get_cached_template(&self, template_path: &Path, context: &Value) -> Option<String> {
        let current = FileInfo::probe(template_path).await;
        let key = Self::template_key(template_path, context);
        let now = now_ms();

        let mut stores = self.stores.lock();
        let hit = stores
            .templates
            .get(&key, |entry| {
                !self.expired(entry.timestamp, now) && entry.source_modified == current.modified
            })
            .map(|entry| entry.output.clone());
        tracing::debug!(template = %template_path.display(), hit = hit.is_some(), "template cache lookup");
        hit
    }

    /// Store a render of `template_path` with `context`
    pub async fn cache_template(&self, template_path: &Path, context: &Value, output: impl Into<String>) {
        let source = FileInfo::probe(template_path).await;
        let entry = TemplateEntry {
            hash: Self::context_hash(context),
            timestamp: now_ms(),
            template_path: template_path.to_path_buf(),
            output: output.into(),
            source_modified: source.modified,
        };
        let key = Self::template_key(template_path, context);
        self.stores.lock().templates.insert(key, entry);
    }

    // ---------------------------------------------------------------------
    // File metadata
    // ---------------------------------------------------------------------

    /// Cached metadata for `path`, if still consistent with the filesystem
    pub async fn get_cached_file_info(&self, path: &Path) -> Option<FileInfo> {
        let current = FileInfo::probe(path).await;
        self.lookup_file(path, &current)
    }

    fn lookup_file(&self, path: &Path, current: &FileInfo) -> Option<FileInfo> {
        let now = now_ms();
        let mut stores = self.stores.lock();
        stores
            .files
            .get(&path_key(path), |entry| {
                let consistent = if entry.info.exists {
                    current.exists && current.modified == entry.info.modified
                } else {
                    !current.exists
                };
                consistent && !self.expired(entry.timestamp, now)
            })
            .map(|entry| entry.info.clone())
    }

    /// Store metadata for a path
    pub fn cache_file_info(&self, info: FileInfo) {
        let key = path_key(&info.path);
        let entry = FileEntry {
            timestamp: now_ms(),
            info,
        };
        self.stores.lock().files.insert(key, entry);
    }

    /// Metadata for `path`, from the cache when consistent, otherwise probed and cached
    pub async fn file_info(&self, path: &Path) -> FileInfo {
        let current = FileInfo::probe(path).await;
        if let Some(cached) = self.lookup_file(path, &current) {
            return cached;
        }
        self.cache_file_info(current.clone());
        current
    }

    // ---------------------------------------------------------------------
    // Invalidation
    // ---------------------------------------------------------------------

    /// Drop everything that depends on `path`
    ///
    /// Removes component entries listing `path` as a dependency, template
    /// entries rendered from `path`, and the file entry for `path`. Returns
    /// the number of entries removed. Scan-based.
    pub fn invalidate_dependencies(&self, path: &str) -> usize {
        let target = Path::new(path);
        let file_key = path_key(target);
        let mut stores = self.stores.lock();
        let removed = stores
            .components
            .remove_where(|_, entry| entry.dependencies.iter().any(|d| d == path))
            + stores
                .templates
                .remove_where(|_, entry| entry.template_path == target)
            + stores.files.remove_where(|key, _| key == file_key);
        tracing::debug!(path, removed, "invalidated cache dependencies");
        removed
    }

    /// Drop all entries of all stores
    pub fn clear(&self) {
        let mut stores = self.stores.lock();
        stores.components.clear();
        stores.templates.clear();
        stores.files.clear();
    }

    /// Counters and sizes of every store
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let stores = self.stores.lock();
        CacheStats {
            components: stores.components.stats(),
            templates: stores.templates.stats(),
            files: stores.files.stats(),
        }
    }

    // ---------------------------------------------------------------------
    // Persistence
    // ---------------------------------------------------------------------

    /// Path of the snapshot file
    #[must_use]
    pub fn snapshot_path(&self) -> PathBuf {
        self.config.cache_dir.join(SNAPSHOT_FILE)
    }

    /// Load the on-disk snapshot when persistence is enabled
    ///
    /// Expired entries are skipped. Failures are logged and leave the cache
    /// empty but usable. Returns the number of entries admitted.
    pub async fn initialize(&self) -> usize {
        if !self.config.persist {
            return 0;
        }
        match self.load_snapshot().await {
            Ok(count) => {
                tracing::info!(entries = count, "loaded cache snapshot");
                count
            }
            Err(CacheError::Io { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("no cache snapshot yet");
                0
            }
            Err(e) => {
                tracing::warn!("ignoring cache snapshot: {e}");
                0
            }
        }
    }

    async fn load_snapshot(&self) -> Result<usize, CacheError> {
        let path = self.snapshot_path();
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| CacheError::io(&path, e))?;
        let snapshot: Snapshot = serde_json::from_slice(&bytes)?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(CacheError::SnapshotVersion(snapshot.version));
        }

        let now = now_ms();
        let mut admitted = 0;
        let mut stores = self.stores.lock();
        for (key, entry) in snapshot.components {
            if !self.expired(entry.timestamp, now) {
                stores.components.insert(key, entry);
                admitted += 1;
            }
        }
        for (key, entry) in snapshot.templates {
            if !self.expired(entry.timestamp, now) {
                stores.templates.insert(key, entry);
                admitted += 1;
            }
        }
        for (key, entry) in snapshot.files {
            if !self.expired(entry.timestamp, now) {
                stores.files.insert(key, entry);
                admitted += 1;
            }
        }
        Ok(admitted)
    }

    /// Write a point-in-time snapshot when persistence is enabled
    ///
    /// Returns whether a snapshot was written. Failures are logged, never
    /// propagated.
    pub async fn save_to_disk(&self) -> bool {
        if !self.config.persist {
            return false;
        }
        match self.write_snapshot().await {
            Ok(path) => {
                tracing::debug!(path = %path.display(), "saved cache snapshot");
                true
            }
            Err(e) => {
                tracing::warn!("failed to save cache snapshot: {e}");
                false
            }
        }
    }

    async fn write_snapshot(&self) -> Result<PathBuf, CacheError> {
        let encoded = {
            let stores = self.stores.lock();
            let snapshot = Snapshot {
                version: SNAPSHOT_VERSION,
                saved_at: now_ms(),
                components: owned(stores.components.entries()),
                templates: owned(stores.templates.entries()),
                files: owned(stores.files.entries()),
            };
            serde_json::to_vec(&snapshot)?
        };

        let dir = &self.config.cache_dir;
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| CacheError::io(dir, e))?;
        let path = self.snapshot_path();
        let staging = dir.join(format!("{SNAPSHOT_FILE}.tmp"));
        tokio::fs::write(&staging, encoded)
            .await
            .map_err(|e| CacheError::io(&staging, e))?;
        tokio::fs::rename(&staging, &path)
            .await
            .map_err(|e| CacheError::io(&path, e))?;
        Ok(path)
    }
}

impl Default for PerformanceCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

fn path_key(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn owned<E: Clone>(entries: Vec<(&str, &E)>) -> Vec<(String, E)> {
    entries
        .into_iter()
        .map(|(k, e)| (k.to_string(), e.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use blueprint_spec::Diagnostic;
    use serde_json::json;
    use std::time::{Duration, SystemTime};

    fn resolution(component_type: &str, deps: &[&str]) -> Resolution {
        Resolution {
            success: true,
            component_type: component_type.to_string(),
            props: Props::new(),
            errors: Vec::new(),
            warnings: Vec::new(),
            dependencies: deps.iter().map(|d| (*d).to_string()).collect(),
        }
    }

    fn set_mtime(path: &Path, time: SystemTime) {
        std::fs::File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(time)
            .unwrap();
    }

    #[test]
    fn component_roundtrip_hits() {
        let cache = PerformanceCache::default();
        let node = ComponentNode::new("home", "HomePage").with_prop("title", json!("Hi"));
        assert!(cache.get_cached_component(&node).is_none());

        cache.cache_component(&node, &resolution("HomePage", &["Layout"]));
        let hit = cache.get_cached_component(&node).unwrap();
        assert_eq!(hit.component_type, "HomePage");

        let stats = cache.stats().components;
        assert_eq!((stats.hits, stats.misses, stats.entries), (1, 1, 1));
    }

    #[test]
    fn component_key_ignores_id_but_not_props() {
        let a = ComponentNode::new("a", "Button").with_prop("label", json!("Go"));
        let b = ComponentNode::new("b", "Button").with_prop("label", json!("Go"));
        let c = ComponentNode::new("a", "Button").with_prop("label", json!("Stop"));
        let key = |n: &ComponentNode| PerformanceCache::component_key(n).unwrap();
        assert_eq!(key(&a), key(&b));
        assert_ne!(key(&a), key(&c));
    }

    #[test]
    fn component_key_depends_on_prop_order() {
        // Known caveat: top-level props hash in insertion order.
        let a = ComponentNode::new("x", "Button")
            .with_prop("label", json!("Go"))
            .with_prop("variant", json!("primary"));
        let b = ComponentNode::new("x", "Button")
            .with_prop("variant", json!("primary"))
            .with_prop("label", json!("Go"));
        assert_ne!(
            PerformanceCache::component_key(&a).unwrap(),
            PerformanceCache::component_key(&b).unwrap()
        );
    }

    #[test]
    fn expired_component_is_a_miss() {
        let cache = PerformanceCache::new(CacheConfig::new().with_ttl(Duration::ZERO));
        let node = ComponentNode::new("home", "HomePage");
        cache.cache_component(&node, &resolution("HomePage", &[]));
        assert!(cache.get_cached_component(&node).is_none());
        assert_eq!(cache.stats().components.entries, 0);
    }

    #[test]
    fn store_stays_within_capacity() {
        let cache = PerformanceCache::new(CacheConfig::new().with_capacity(8));
        for i in 0..30 {
            let node = ComponentNode::new(format!("n{i}"), "Text").with_prop("content", json!(i));
            cache.cache_component(&node, &resolution("Text", &[]));
            assert!(cache.stats().components.entries <= 8);
        }
    }

    #[test]
    fn invalidate_dependencies_drops_dependents() {
        let cache = PerformanceCache::default();
        let form = ComponentNode::new("signup", "Form");
        let text = ComponentNode::new("intro", "Text");
        cache.cache_component(&form, &resolution("Form", &["Input", "Button"]));
        cache.cache_component(&text, &resolution("Text", &[]));

        assert_eq!(cache.invalidate_dependencies("Button"), 1);
        assert!(cache.get_cached_component(&form).is_none());
        assert!(cache.get_cached_component(&text).is_some());
    }

    #[test]
    fn clear_empties_everything() {
        let cache = PerformanceCache::default();
        cache.cache_component(&ComponentNode::new("a", "Text"), &resolution("Text", &[]));
        cache.cache_file_info(FileInfo::missing("/nowhere"));
        cache.clear();
        let stats = cache.stats();
        assert_eq!(stats.components.entries + stats.files.entries, 0);
    }

    #[tokio::test]
    async fn template_hit_requires_same_context() {
        let dir = tempfile::tempdir().unwrap();
        let tpl = dir.path().join("page.tmpl");
        std::fs::write(&tpl, "Hello {{ name }}").unwrap();
        let cache = PerformanceCache::default();

        cache.cache_template(&tpl, &json!({"name": "a"}), "Hello a").await;
        assert_eq!(
            cache.get_cached_template(&tpl, &json!({"name": "a"})).await.as_deref(),
            Some("Hello a")
        );
        assert!(cache.get_cached_template(&tpl, &json!({"name": "b"})).await.is_none());
    }

    #[tokio::test]
    async fn template_miss_when_source_changes_within_ttl() {
        let dir = tempfile::tempdir().unwrap();
        let tpl = dir.path().join("page.tmpl");
        std::fs::write(&tpl, "v1").unwrap();
        set_mtime(&tpl, SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000));

        let cache = PerformanceCache::default();
        let context = json!({});
        cache.cache_template(&tpl, &context, "v1").await;
        assert!(cache.get_cached_template(&tpl, &context).await.is_some());

        set_mtime(&tpl, SystemTime::UNIX_EPOCH + Duration::from_secs(2_000_000));
        assert!(cache.get_cached_template(&tpl, &context).await.is_none());
        assert_eq!(cache.stats().templates.entries, 0);
    }

    #[tokio::test]
    async fn invalidate_template_by_source_path() {
        let dir = tempfile::tempdir().unwrap();
        let tpl = dir.path().join("page.tmpl");
        std::fs::write(&tpl, "x").unwrap();
        let cache = PerformanceCache::default();
        cache.cache_template(&tpl, &json!({"a": 1}), "x").await;
        cache.cache_template(&tpl, &json!({"a": 2}), "x").await;

        assert_eq!(cache.invalidate_dependencies(&tpl.to_string_lossy()), 2);
        assert_eq!(cache.stats().templates.entries, 0);
    }

    #[tokio::test]
    async fn file_info_tracks_modification_and_absence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("routes.ts");
        let cache = PerformanceCache::default();

        let info = cache.file_info(&path).await;
        assert!(!info.exists);
        assert!(cache.get_cached_file_info(&path).await.is_some());

        // negative entry is stale once the file appears
        std::fs::write(&path, "export {}").unwrap();
        assert!(cache.get_cached_file_info(&path).await.is_none());

        let info = cache.file_info(&path).await;
        assert!(info.exists);
        assert_eq!(info.size, 9);
        assert!(cache.get_cached_file_info(&path).await.is_some());

        set_mtime(&path, SystemTime::UNIX_EPOCH + Duration::from_secs(42));
        assert!(cache.get_cached_file_info(&path).await.is_none());
    }

    #[tokio::test]
    async fn snapshot_roundtrip_restores_entries() {
        let dir = tempfile::tempdir().unwrap();
        let config = CacheConfig::new().persisted_in(dir.path().join("cache"));
        let node = ComponentNode::new("home", "HomePage");

        let first = PerformanceCache::new(config.clone());
        first.cache_component(&node, &resolution("HomePage", &["Layout"]));
        assert!(first.save_to_disk().await);

        let second = PerformanceCache::new(config);
        assert_eq!(second.initialize().await, 1);
        assert_eq!(
            second.get_cached_component(&node).map(|r| r.dependencies),
            Some(vec!["Layout".to_string()])
        );
    }

    #[tokio::test]
    async fn snapshot_skips_expired_entries() {
        let dir = tempfile::tempdir().unwrap();
        let config = CacheConfig::new().persisted_in(dir.path());
        let writer = PerformanceCache::new(config.clone());
        writer.cache_component(&ComponentNode::new("a", "Text"), &resolution("Text", &[]));
        assert!(writer.save_to_disk().await);

        let reader = PerformanceCache::new(config.with_ttl(Duration::ZERO));
        assert_eq!(reader.initialize().await, 0);
    }

    #[tokio::test]
    async fn corrupt_snapshot_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(SNAPSHOT_FILE), b"not json").unwrap();
        let cache = PerformanceCache::new(CacheConfig::new().persisted_in(dir.path()));
        assert_eq!(cache.initialize().await, 0);
        cache.cache_component(&ComponentNode::new("a", "Text"), &resolution("Text", &[]));
        assert_eq!(cache.stats().components.entries, 1);
    }

    #[tokio::test]
    async fn persistence_disabled_is_a_no_op() {
        let cache = PerformanceCache::default();
        assert_eq!(cache.initialize().await, 0);
        assert!(!cache.save_to_disk().await);
    }

    #[tokio::test]
    async fn unwritable_cache_dir_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "x").unwrap();
        let cache = PerformanceCache::new(CacheConfig::new().persisted_in(blocker.join("sub")));
        cache.cache_component(
            &ComponentNode::new("a", "Text"),
            &Resolution::failed("Text", Diagnostic::component("x")),
        );
        assert!(!cache.save_to_disk().await);
    }
}
