//! Pipeline orchestrator
//!
//! Drives the phase list over a fresh [`CompilationContext`] per call,
//! reports progress and folds the outcome into a [`CompilationResult`].
//!
//! Failure semantics:
//! - a required phase returning `false` ends the run as FAILED;
//! - an optional phase returning `false` adds a warning and the run goes on;
//! - an internal error is recorded as a `dependency` diagnostic and ends the
//!   run as FAILED, or is returned as-is when `throw_on_error` is set.

use crate::context::CompilationContext;
use crate::error::CompileResult;
use crate::fs::{FileSystem, LocalFileSystem};
use crate::generate::ApiRouteGenerator;
use crate::options::CompilationOptions;
use crate::phases::{pipeline, CompilationPhase, PhaseDescriptor, Toolchain};
use crate::progress::{ProgressCallback, ProgressEvent, ProgressReporter};
use crate::template::{PlaceholderEngine, TemplateEngine};
use blueprint_cache::PerformanceCache;
use blueprint_registry::ComponentRegistry;
use blueprint_spec::Diagnostic;
use serde::{Serialize, Serializer};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::Instrument;
use ulid::Ulid;

/// Outcome of one `compile()` or `check()` call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompilationResult {
    pub success: bool,
    /// `<output_dir>/<name>`, set once GENERATE ran
    pub output_path: Option<PathBuf>,
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
    /// Last phase reached, or FAILED
    pub phase: CompilationPhase,
    #[serde(rename = "timeTakenMs", serialize_with = "as_millis")]
    pub time_taken: Duration,
    pub run_id: Ulid,
}

fn as_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
}

/// Runs the compilation pipeline
#[derive(Clone)]
pub struct PipelineOrchestrator {
    tools: Toolchain,
    progress: Option<ProgressCallback>,
    cache_loaded: Arc<AtomicBool>,
}

impl std::fmt::Debug for PipelineOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineOrchestrator")
            .field("tools", &self.tools)
            .field("progress", &self.progress.is_some())
            .finish_non_exhaustive()
    }
}

impl PipelineOrchestrator {
    /// Orchestrator over `registry` with the local filesystem, the
    /// placeholder template engine, no cache and no API generator
    #[must_use]
    pub fn new(registry: Arc<dyn ComponentRegistry>) -> Self {
        Self {
            tools: Toolchain {
                registry,
                cache: None,
                fs: Arc::new(LocalFileSystem::new()),
                templates: Arc::new(PlaceholderEngine::new()),
                api_generator: None,
            },
            progress: None,
            cache_loaded: Arc::new(AtomicBool::new(false)),
        }
    }

    #[inline]
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<PerformanceCache>) -> Self {
        self.tools.cache = Some(cache);
        self.cache_loaded = Arc::new(AtomicBool::new(false));
        self
    }

    #[inline]
    #[must_use]
    pub fn with_file_system(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.tools.fs = fs;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_template_engine(mut self, templates: Arc<dyn TemplateEngine>) -> Self {
        self.tools.templates = templates;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_api_generator(mut self, generator: Arc<dyn ApiRouteGenerator>) -> Self {
        self.tools.api_generator = Some(generator);
        self
    }

    #[inline]
    #[must_use]
    pub fn with_progress_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&ProgressEvent) + Send + Sync + 'static,
    {
        self.set_progress_callback(callback);
        self
    }

    /// Replace the progress observer
    pub fn set_progress_callback<F>(&mut self, callback: F)
    where
        F: Fn(&ProgressEvent) + Send + Sync + 'static,
    {
        self.progress = Some(Arc::new(callback));
    }

    /// Collaborators used by the phases
    #[inline]
    #[must_use]
    pub fn toolchain(&self) -> &Toolchain {
        &self.tools
    }

    /// Compile the spec at `spec_path` into a project tree
    ///
    /// # Errors
    /// Only when `options.throw_on_error` is set and a phase fails
    /// internally; every other failure is reported in the result.
    pub async fn compile(
        &self,
        spec_path: impl AsRef<Path>,
        options: &CompilationOptions,
    ) -> CompileResult<CompilationResult> {
        self.run(spec_path.as_ref(), options, CompilationPhase::Complete).await
    }

    /// Parse and plan without generating anything
    ///
    /// # Errors
    /// As for [`compile`](Self::compile).
    pub async fn check(
        &self,
        spec_path: impl AsRef<Path>,
        options: &CompilationOptions,
    ) -> CompileResult<CompilationResult> {
        self.run(spec_path.as_ref(), options, CompilationPhase::Plan).await
    }

    async fn run(
        &self,
        spec_path: &Path,
        options: &CompilationOptions,
        last: CompilationPhase,
    ) -> CompileResult<CompilationResult> {
        let ctx = CompilationContext::new(spec_path, &options.output_dir, &options.template_dir);
        let span = tracing::info_span!("compile", run_id = %ctx.run_id, spec = %spec_path.display());
        self.drive(ctx, options, last).instrument(span).await
    }

    async fn drive(
        &self,
        mut ctx: CompilationContext,
        options: &CompilationOptions,
        last: CompilationPhase,
    ) -> CompileResult<CompilationResult> {
        let started = Instant::now();
        self.load_cache(options).await;

        let tools = Arc::new(self.tools.clone());
        let mut reporter = ProgressReporter::new(self.progress.clone());
        let mut reached = CompilationPhase::Init;

        for phase in pipeline(&tools) {
            let descriptor = phase.descriptor();
            if descriptor.phase > last {
                break;
            }
            reached = descriptor.phase;
            reporter.emit(event(&descriptor, descriptor.start_progress, descriptor.description, &ctx));
            tracing::debug!(phase = %descriptor.phase, "phase started");

            let passed = match phase.execute(&mut ctx, options).await {
                Ok(passed) => passed,
                Err(err) => {
                    tracing::error!(phase = %descriptor.phase, "phase aborted: {err}");
                    ctx.error(Diagnostic::dependency(format!("{} phase aborted: {err}", descriptor.phase)));
                    reporter.emit(failed(&descriptor, &ctx));
                    if options.throw_on_error {
                        return Err(err);
                    }
                    return Ok(finish(ctx, CompilationPhase::Failed, started));
                }
            };

            if passed {
                let message = format!("{} completed", descriptor.phase);
                reporter.emit(event(&descriptor, descriptor.end_progress, &message, &ctx));
            } else if descriptor.required {
                tracing::warn!(phase = %descriptor.phase, errors = ctx.error_count(), "required phase failed");
                reporter.emit(failed(&descriptor, &ctx));
                return Ok(finish(ctx, CompilationPhase::Failed, started));
            } else {
                ctx.warn(Diagnostic::dependency(format!(
                    "Optional phase {} did not complete",
                    descriptor.phase
                )));
                let message = format!("{} completed with warnings", descriptor.phase);
                reporter.emit(event(&descriptor, descriptor.end_progress, &message, &ctx));
            }
        }

        Ok(finish(ctx, reached, started))
    }

    /// Load the persisted snapshot once per orchestrator
    async fn load_cache(&self, options: &CompilationOptions) {
        let Some(cache) = self.tools.cache_for(options) else {
            return;
        };
        if self.cache_loaded.swap(true, Ordering::SeqCst) {
            return;
        }
        let restored = cache.initialize().await;
        tracing::debug!(restored, "cache initialized");
    }
}

fn event(descriptor: &PhaseDescriptor, progress: u8, message: &str, ctx: &CompilationContext) -> ProgressEvent {
    ProgressEvent {
        phase: descriptor.phase,
        progress,
        message: message.to_string(),
        errors: ctx.diagnostics.errors().to_vec(),
        warnings: ctx.diagnostics.warnings().to_vec(),
    }
}

fn failed(descriptor: &PhaseDescriptor, ctx: &CompilationContext) -> ProgressEvent {
    ProgressEvent {
        phase: CompilationPhase::Failed,
        ..event(
            descriptor,
            descriptor.end_progress,
            &format!("{} failed", descriptor.phase),
            ctx,
        )
    }
}

fn finish(ctx: CompilationContext, phase: CompilationPhase, started: Instant) -> CompilationResult {
    let time_taken = started.elapsed();
    let run_id = ctx.run_id;
    let output_path = ctx.project_root;
    let (errors, warnings) = ctx.diagnostics.into_parts();
    let success = phase != CompilationPhase::Failed;

    tracing::info!(
        success,
        %phase,
        errors = errors.len(),
        warnings = warnings.len(),
        elapsed_ms = u64::try_from(time_taken.as_millis()).unwrap_or(u64::MAX),
        "compilation finished"
    );

    CompilationResult {
        success,
        output_path,
        errors,
        warnings,
        phase,
        time_taken,
        run_id,
    }
}
