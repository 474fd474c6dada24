//! Blueprint Spec
//!
//! The declarative input of the Blueprint compiler and the value types every
//! later stage shares.
//!
//! # Core Concepts
//!
//! - [`AppSpec`]: metadata, component tree, routes and API endpoints
//! - [`Diagnostic`]: structured, non-throwing error/warning record
//! - [`SpecParser`]: JSON/YAML text → [`AppSpec`] with path-precise diagnostics
//! - [`ContentHash`]: Blake3 digest used for cache keys
//!
//! # Example
//!
//! ```rust
//! use blueprint_spec::{ParseOptions, SpecParser};
//!
//! let text = r#"{"metadata":{"name":"demo","version":"1.0.0"},"routes":[]}"#;
//! let outcome = SpecParser::new().parse_str(text, &ParseOptions::default());
//! assert!(outcome.success());
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod diagnostic;
pub mod error;
pub mod hash;
pub mod model;
pub mod parser;

pub use diagnostic::{Diagnostic, DiagnosticBag, DiagnosticKind, Location};
pub use error::SpecError;
pub use hash::{ContentHash, HashError};
pub use model::{
    ApiEndpoint, ApiSpec, AppSpec, ComponentNode, Condition, ConditionOperator, HttpMethod,
    Metadata, Props, RouteMeta, RouteNode,
};
pub use parser::{ParseOptions, ParseOutcome, SpecFormat, SpecParser};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
