//! Blueprint Cache
//!
//! Hash-keyed, TTL and size bounded caching of component resolutions,
//! template renders and file metadata.
//!
//! # Example
//!
//! ```rust
//! use blueprint_cache::{CacheConfig, PerformanceCache};
//! use blueprint_registry::Resolution;
//! use blueprint_spec::{ComponentNode, Diagnostic};
//!
//! let cache = PerformanceCache::new(CacheConfig::default());
//! let node = ComponentNode::new("cta", "Buton");
//! let resolution = Resolution::failed("Buton", Diagnostic::component("unknown"));
//!
//! cache.cache_component(&node, &resolution);
//! assert_eq!(cache.get_cached_component(&node), Some(resolution));
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod cache;
pub mod config;
pub mod entry;
pub mod error;
mod store;

pub use cache::{CacheStats, PerformanceCache};
pub use config::CacheConfig;
pub use entry::{ComponentEntry, FileEntry, FileInfo, TemplateEntry};
pub use error::CacheError;
pub use store::StoreStats;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
