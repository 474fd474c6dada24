//! Per-run compilation context
//!
//! Built at the start of `compile()`, mutated by each phase, dropped when
//! the call returns. Nothing here survives between runs.

use crate::error::{CompileError, CompileResult};
use crate::planner::AppPlan;
use blueprint_registry::Resolution;
use blueprint_spec::{AppSpec, Diagnostic, DiagnosticBag};
use indexmap::IndexMap;
use std::path::{Path, PathBuf};
use ulid::Ulid;

/// Shared mutable state of one compilation
#[derive(Debug)]
pub struct CompilationContext {
    /// Identifies this run in logs
    pub run_id: Ulid,
    /// Spec file being compiled
    pub config_path: PathBuf,
    pub output_dir: PathBuf,
    pub template_dir: PathBuf,
    /// Parsed spec, set by PARSE
    pub config: Option<AppSpec>,
    /// Validated IR, set by PLAN
    pub plan: Option<AppPlan>,
    /// `<output_dir>/<metadata.name>`, set by GENERATE
    pub project_root: Option<PathBuf>,
    /// Resolutions by component id, set by INTEGRATE
    pub resolutions: IndexMap<String, Resolution>,
    /// Files written (or, in a dry run, that would be written)
    pub generated_files: Vec<PathBuf>,
    /// Errors and warnings accumulated across phases
    pub diagnostics: DiagnosticBag,
}

impl CompilationContext {
    /// Fresh context for a run
    #[must_use]
    pub fn new(
        config_path: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        template_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            run_id: Ulid::new(),
            config_path: config_path.into(),
            output_dir: output_dir.into(),
            template_dir: template_dir.into(),
            config: None,
            plan: None,
            project_root: None,
            resolutions: IndexMap::new(),
            generated_files: Vec::new(),
            diagnostics: DiagnosticBag::new(),
        }
    }

    /// Parsed spec
    ///
    /// # Errors
    /// Returns [`CompileError::MissingArtifact`] before PARSE succeeded.
    pub fn spec(&self) -> CompileResult<&AppSpec> {
        self.config.as_ref().ok_or(CompileError::MissingArtifact("parsed spec"))
    }

    /// Validated plan
    ///
    /// # Errors
    /// Returns [`CompileError::MissingArtifact`] before PLAN succeeded.
    pub fn app_plan(&self) -> CompileResult<&AppPlan> {
        self.plan.as_ref().ok_or(CompileError::MissingArtifact("application plan"))
    }

    /// Generated project root
    ///
    /// # Errors
    /// Returns [`CompileError::MissingArtifact`] before GENERATE succeeded.
    pub fn root(&self) -> CompileResult<&Path> {
        self.project_root
            .as_deref()
            .ok_or(CompileError::MissingArtifact("project root"))
    }

    /// Record an error
    #[inline]
    pub fn error(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.error(diagnostic);
    }

    /// Record a warning
    #[inline]
    pub fn warn(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.warn(diagnostic);
    }

    /// Number of errors so far
    #[inline]
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.diagnostics.errors().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifacts_are_missing_until_set() {
        let ctx = CompilationContext::new("app.json", "out", "templates");
        assert!(matches!(ctx.spec(), Err(CompileError::MissingArtifact(_))));
        assert!(ctx.app_plan().is_err());
        assert!(ctx.root().is_err());
    }

    #[test]
    fn each_context_gets_its_own_run_id() {
        let a = CompilationContext::new("a.json", "out", "t");
        let b = CompilationContext::new("a.json", "out", "t");
        assert_ne!(a.run_id, b.run_id);
    }
}
