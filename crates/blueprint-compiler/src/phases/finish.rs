//! OPTIMIZE and COMPLETE
//!
//! Both are optional: their failures are reported as warnings and never
//! fail the compilation.

use super::{fs_options, CompilationPhase, Phase, PhaseDescriptor, Toolchain};
use crate::context::CompilationContext;
use crate::error::CompileResult;
use crate::options::CompilationOptions;
use crate::VERSION;
use blueprint_spec::Diagnostic;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// Manifest written at the project root
pub const MANIFEST_FILE: &str = "blueprint.manifest.json";

/// Placeholder for output optimizers
#[derive(Debug, Clone, Copy, Default)]
pub struct OptimizePhase;

#[async_trait::async_trait]
impl Phase for OptimizePhase {
    fn descriptor(&self) -> PhaseDescriptor {
        PhaseDescriptor {
            phase: CompilationPhase::Optimize,
            description: "Optimizing output",
            start_progress: 85,
            end_progress: 95,
            required: false,
        }
    }

    async fn execute(&self, ctx: &mut CompilationContext, options: &CompilationOptions) -> CompileResult<bool> {
        if options.optimize {
            tracing::info!(files = ctx.generated_files.len(), "no optimizers registered; output left as is");
        } else {
            tracing::debug!("optimization disabled");
        }
        Ok(true)
    }
}

/// Summary of a generated project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub name: String,
    pub version: String,
    pub generator: String,
    pub generator_version: String,
    pub generated_at: DateTime<Utc>,
    pub components: Vec<String>,
    pub routes: Vec<String>,
    /// Paths relative to the project root, sorted
    pub files: Vec<PathBuf>,
}

/// Writes the manifest, checks the output and persists the cache
#[derive(Debug, Clone)]
pub struct CompletePhase {
    tools: Arc<Toolchain>,
}

impl CompletePhase {
    #[must_use]
    pub fn new(tools: Arc<Toolchain>) -> Self {
        Self { tools }
    }

    fn manifest(ctx: &CompilationContext) -> CompileResult<Manifest> {
        let spec = ctx.spec()?;
        let plan = ctx.app_plan()?;
        let root = ctx.root()?;
        let mut files: Vec<PathBuf> = ctx
            .generated_files
            .iter()
            .map(|p| p.strip_prefix(root).unwrap_or(p.as_path()).to_path_buf())
            .collect();
        files.sort();
        files.dedup();

        Ok(Manifest {
            name: spec.metadata.name.clone(),
            version: spec.metadata.version.clone(),
            generator: "blueprint".into(),
            generator_version: VERSION.into(),
            generated_at: Utc::now(),
            components: ctx
                .resolutions
                .iter()
                .filter(|(_, r)| r.success)
                .map(|(id, _)| id.clone())
                .collect(),
            routes: plan.resolved_routes().map(|r| r.path.clone()).collect(),
            files,
        })
    }
}

#[async_trait::async_trait]
impl Phase for CompletePhase {
    fn descriptor(&self) -> PhaseDescriptor {
        PhaseDescriptor {
            phase: CompilationPhase::Complete,
            description: "Finalizing project",
            start_progress: 95,
            end_progress: 100,
            required: false,
        }
    }

    async fn execute(&self, ctx: &mut CompilationContext, options: &CompilationOptions) -> CompileResult<bool> {
        let fs = &self.tools.fs;
        let mut ok = true;

        let manifest = Self::manifest(ctx)?;
        let path = ctx.root()?.join(MANIFEST_FILE);
        let text = serde_json::to_string_pretty(&manifest)?;
        let opts = fs_options(options);
        let outcome = fs.create_file(&path, &text, opts.with_overwrite(true)).await;
        if outcome.success {
            ctx.generated_files.extend(outcome.written);
        } else {
            ok = false;
            ctx.warn(
                Diagnostic::file(outcome.error.unwrap_or_else(|| "manifest not written".into()))
                    .at(MANIFEST_FILE),
            );
        }

        if !options.dry_run {
            let mut missing = Vec::new();
            for file in &ctx.generated_files {
                if !fs.exists(file).await {
                    missing.push(file.clone());
                }
            }
            if !missing.is_empty() {
                ok = false;
            }
            for file in missing {
                ctx.warn(Diagnostic::file(format!("Generated file is missing: {}", file.display())));
            }
        }

        if let Some(cache) = self.tools.cache_for(options) {
            if cache.config().persist && !cache.save_to_disk().await {
                ctx.warn(Diagnostic::file(format!(
                    "Cache snapshot could not be saved to {}",
                    cache.snapshot_path().display()
                )));
            }
        }

        tracing::info!(files = ctx.generated_files.len(), ok, "compilation finalized");
        Ok(ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::LocalFileSystem;
    use crate::planner::AppPlan;
    use crate::template::PlaceholderEngine;
    use blueprint_registry::StaticRegistry;
    use blueprint_spec::{AppSpec, Metadata};

    fn phase() -> CompletePhase {
        CompletePhase::new(Arc::new(Toolchain {
            registry: Arc::new(StaticRegistry::with_defaults()),
            cache: None,
            fs: Arc::new(LocalFileSystem),
            templates: Arc::new(PlaceholderEngine),
            api_generator: None,
        }))
    }

    fn context(dir: &tempfile::TempDir) -> CompilationContext {
        let root = dir.path().join("demo");
        std::fs::create_dir_all(&root).unwrap();
        let mut ctx = CompilationContext::new("app.json", dir.path(), dir.path());
        ctx.config = Some(AppSpec {
            metadata: Metadata::new("demo", "1.0.0"),
            components: Vec::new(),
            routes: Vec::new(),
            api: None,
        });
        ctx.plan = Some(AppPlan::default());
        ctx.project_root = Some(root);
        ctx
    }

    #[tokio::test]
    async fn writes_manifest_with_relative_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = context(&dir);
        let readme = dir.path().join("demo/README.md");
        std::fs::write(&readme, "# demo").unwrap();
        ctx.generated_files.push(readme);

        assert!(phase().execute(&mut ctx, &CompilationOptions::default()).await.unwrap());
        let text = std::fs::read_to_string(dir.path().join("demo").join(MANIFEST_FILE)).unwrap();
        let manifest: Manifest = serde_json::from_str(&text).unwrap();
        assert_eq!(manifest.name, "demo");
        assert_eq!(manifest.generator_version, VERSION);
        assert_eq!(manifest.files, [PathBuf::from("README.md")]);
    }

    #[tokio::test]
    async fn missing_outputs_are_warnings() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = context(&dir);
        ctx.generated_files.push(dir.path().join("demo/gone.ts"));

        assert!(!phase().execute(&mut ctx, &CompilationOptions::default()).await.unwrap());
        assert!(ctx.diagnostics.errors().is_empty());
        assert!(ctx.diagnostics.warnings()[0].message.contains("gone.ts"));
    }

    #[tokio::test]
    async fn dry_run_skips_the_existence_check() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = context(&dir);
        ctx.generated_files.push(dir.path().join("demo/never-written.ts"));
        let options = CompilationOptions::default().with_dry_run(true);

        assert!(phase().execute(&mut ctx, &options).await.unwrap());
        assert!(!dir.path().join("demo").join(MANIFEST_FILE).exists());
    }
}
