//! Blueprint Registry
//!
//! What the compiler knows about component types.
//!
//! - [`ComponentRegistry`]: lookup + prop validation seam
//! - [`StaticRegistry`]: in-memory registry with a default catalogue
//! - [`similarity`]: tiered name scorer behind "did you mean" suggestions
//! - [`Resolution`]: per-node resolution record shared with the cache

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod entry;
pub mod error;
pub mod registry;
pub mod resolution;
pub mod similarity;

pub use entry::{
    ComponentCategory, PropIssue, PropKind, PropSchema, PropSpec, PropValidation, RegistryEntry,
};
pub use error::RegistryError;
pub use registry::{ComponentRegistry, StaticRegistry};
pub use resolution::Resolution;
pub use similarity::{similarity, suggest};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
