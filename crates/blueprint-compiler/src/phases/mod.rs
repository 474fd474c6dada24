//! Pipeline phases
//!
//! The pipeline is a fixed, ordered list of [`Phase`]s. Each declares its
//! progress window and whether it is required; the orchestrator owns the
//! sequencing and failure semantics.
//!
//! | Phase | Progress | Required |
//! |---|---|---|
//! | INIT | 0-5 | yes |
//! | PARSE | 5-15 | yes |
//! | PLAN | 15-30 | yes |
//! | GENERATE | 30-45 | yes |
//! | INTEGRATE | 45-85 | yes |
//! | OPTIMIZE | 85-95 | no |
//! | COMPLETE | 95-100 | no |

mod finish;
mod generate;
mod integrate;
mod parse;
mod plan;

use crate::context::CompilationContext;
use crate::error::CompileResult;
use crate::fs::{FileSystem, FsOptions};
use crate::generate::ApiRouteGenerator;
use crate::options::CompilationOptions;
use crate::planner::ConsistencyPlanner;
use crate::resolver::ComponentResolver;
use crate::template::TemplateEngine;
use blueprint_cache::PerformanceCache;
use blueprint_registry::ComponentRegistry;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug, Display, Formatter};
use std::path::Path;
use std::sync::Arc;

pub use finish::{CompletePhase, OptimizePhase, MANIFEST_FILE};
pub use generate::GeneratePhase;
pub use integrate::IntegratePhase;
pub use parse::{InitPhase, ParsePhase};
pub use plan::PlanPhase;

/// How far a compilation got
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompilationPhase {
    Init,
    Parse,
    Plan,
    Generate,
    Integrate,
    Optimize,
    Complete,
    Failed,
}

impl CompilationPhase {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Init => "INIT",
            Self::Parse => "PARSE",
            Self::Plan => "PLAN",
            Self::Generate => "GENERATE",
            Self::Integrate => "INTEGRATE",
            Self::Optimize => "OPTIMIZE",
            Self::Complete => "COMPLETE",
            Self::Failed => "FAILED",
        }
    }
}

impl Display for CompilationPhase {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static description of a phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseDescriptor {
    pub phase: CompilationPhase,
    pub description: &'static str,
    pub start_progress: u8,
    pub end_progress: u8,
    /// A failed required phase ends the run
    pub required: bool,
}

/// One ordered unit of pipeline work
#[async_trait::async_trait]
pub trait Phase: Send + Sync + Debug {
    fn descriptor(&self) -> PhaseDescriptor;

    /// Run the phase
    ///
    /// `Ok(false)` means the phase failed and recorded why in the context.
    /// `Err` is reserved for unexpected internal failures.
    async fn execute(
        &self,
        ctx: &mut CompilationContext,
        options: &CompilationOptions,
    ) -> CompileResult<bool>;
}

/// Collaborators shared by the phases of a run
#[derive(Debug, Clone)]
pub struct Toolchain {
    pub registry: Arc<dyn ComponentRegistry>,
    pub cache: Option<Arc<PerformanceCache>>,
    pub fs: Arc<dyn FileSystem>,
    pub templates: Arc<dyn TemplateEngine>,
    /// Absent means API endpoints are skipped with a warning
    pub api_generator: Option<Arc<dyn ApiRouteGenerator>>,
}

impl Toolchain {
    /// Resolver bound to this registry and cache
    #[must_use]
    pub fn resolver(&self) -> ComponentResolver {
        let resolver = ComponentResolver::new(Arc::clone(&self.registry));
        match &self.cache {
            Some(cache) => resolver.with_cache(Arc::clone(cache)),
            None => resolver,
        }
    }

    #[must_use]
    pub fn planner(&self) -> ConsistencyPlanner {
        ConsistencyPlanner::new(Arc::clone(&self.registry))
    }

    /// The cache, when present and enabled for this run
    #[must_use]
    pub fn cache_for(&self, options: &CompilationOptions) -> Option<&PerformanceCache> {
        self.cache.as_deref().filter(|_| options.use_cache)
    }

    /// Whether `path` exists, answered by the file metadata cache when enabled
    ///
    /// Cached probes read the local disk rather than the injected file system.
    pub async fn path_exists(&self, path: &Path, options: &CompilationOptions) -> bool {
        match self.cache_for(options) {
            Some(cache) => cache.file_info(path).await.exists,
            None => self.fs.exists(path).await,
        }
    }
}

pub(crate) fn fs_options(options: &CompilationOptions) -> FsOptions {
    FsOptions::new(options.dry_run, options.overwrite)
}

/// The canonical seven-phase pipeline
#[must_use]
pub fn pipeline(tools: &Arc<Toolchain>) -> Vec<Box<dyn Phase>> {
    vec![
        Box::new(InitPhase),
        Box::new(ParsePhase),
        Box::new(PlanPhase::new(Arc::clone(tools))),
        Box::new(GeneratePhase::new(Arc::clone(tools))),
        Box::new(IntegratePhase::new(Arc::clone(tools))),
        Box::new(OptimizePhase),
        Box::new(CompletePhase::new(Arc::clone(tools))),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::LocalFileSystem;
    use crate::template::PlaceholderEngine;
    use blueprint_registry::StaticRegistry;

    fn tools() -> Arc<Toolchain> {
        Arc::new(Toolchain {
            registry: Arc::new(StaticRegistry::with_defaults()),
            cache: None,
            fs: Arc::new(LocalFileSystem),
            templates: Arc::new(PlaceholderEngine),
            api_generator: None,
        })
    }

    #[test]
    fn pipeline_is_ordered_and_contiguous() {
        let phases = pipeline(&tools());
        let descriptors: Vec<_> = phases.iter().map(|p| p.descriptor()).collect();

        assert_eq!(descriptors.len(), 7);
        assert_eq!(descriptors[0].start_progress, 0);
        assert_eq!(descriptors[6].end_progress, 100);
        for pair in descriptors.windows(2) {
            assert!(pair[0].phase < pair[1].phase);
            assert_eq!(pair[0].end_progress, pair[1].start_progress);
        }
        for d in &descriptors {
            assert!(d.start_progress <= d.end_progress);
        }
    }

    #[test]
    fn only_optimize_and_complete_are_optional() {
        let optional: Vec<_> = pipeline(&tools())
            .iter()
            .map(|p| p.descriptor())
            .filter(|d| !d.required)
            .map(|d| d.phase)
            .collect();
        assert_eq!(optional, [CompilationPhase::Optimize, CompilationPhase::Complete]);
    }

    #[test]
    fn phase_names_serialize_upper_case() {
        assert_eq!(serde_json::to_string(&CompilationPhase::Complete).unwrap(), "\"COMPLETE\"");
        assert_eq!(CompilationPhase::Failed.to_string(), "FAILED");
    }
}
