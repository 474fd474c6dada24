//! Blueprint Compiler
//!
//! Turns a declarative application spec into a generated project tree.
//!
//! # Pipeline
//!
//! ```text
//! INIT → PARSE → PLAN → GENERATE → INTEGRATE → OPTIMIZE → COMPLETE
//! ```
//!
//! - **PARSE** reads JSON or YAML into an [`AppSpec`](blueprint_spec::AppSpec)
//! - **PLAN** checks types, references and uniqueness ([`ConsistencyPlanner`])
//! - **GENERATE** lays out `<output_dir>/<name>` and copies the base template
//! - **INTEGRATE** resolves components ([`ComponentResolver`]), emits
//!   components, routes and API handlers, and renders `*.tmpl` files
//! - **COMPLETE** writes `blueprint.manifest.json` and persists the cache
//!
//! # Example
//!
//! ```rust,no_run
//! use blueprint_compiler::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), CompileError> {
//! let orchestrator = PipelineOrchestrator::new(Arc::new(StaticRegistry::with_defaults()))
//!     .with_cache(Arc::new(PerformanceCache::default()))
//!     .with_progress_callback(|event: &ProgressEvent| {
//!         println!("[{:>3}%] {}", event.progress, event.message);
//!     });
//!
//! let options = CompilationOptions::default().with_output_dir("dist");
//! let result = orchestrator.compile("app.json", &options).await?;
//! assert!(result.success);
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod context;
pub mod error;
pub mod fs;
pub mod generate;
pub mod options;
pub mod orchestrator;
pub mod phases;
pub mod planner;
pub mod progress;
pub mod resolver;
pub mod template;

pub use context::CompilationContext;
pub use error::{CompileError, CompileResult, TemplateError};
pub use fs::{FileSystem, FsOptions, FsOutcome, LocalFileSystem};
pub use generate::{ApiRouteGenerator, HandlerStubGenerator};
pub use options::{BlueprintConfig, CompilationOptions};
pub use orchestrator::{CompilationResult, PipelineOrchestrator};
pub use phases::{CompilationPhase, Phase, PhaseDescriptor, Toolchain};
pub use planner::{AppPlan, ConsistencyPlanner, PlanOutcome};
pub use progress::{ProgressCallback, ProgressEvent};
pub use resolver::{ComponentResolver, ResolveOptions};
pub use template::{PlaceholderEngine, TemplateEngine};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Everything needed to drive a compilation
pub mod prelude {
    pub use crate::{
        CompilationOptions, CompilationPhase, CompilationResult, CompileError, PipelineOrchestrator,
        ProgressEvent,
    };
    pub use blueprint_cache::{CacheConfig, PerformanceCache};
    pub use blueprint_registry::{ComponentRegistry, StaticRegistry};
    pub use blueprint_spec::{Diagnostic, DiagnosticKind};
}
