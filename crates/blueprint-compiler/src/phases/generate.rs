//! GENERATE: project skeleton

use super::{fs_options, CompilationPhase, Phase, PhaseDescriptor, Toolchain};
use crate::context::CompilationContext;
use crate::error::CompileResult;
use crate::options::CompilationOptions;
use blueprint_spec::Diagnostic;
use std::path::Path;
use std::sync::Arc;

/// Directories every generated project has, relative to its root
pub const SKELETON: &[&str] = &["src", "src/components", "src/routes", "src/api", "public"];

/// Creates `<output_dir>/<name>` and copies the base template into it
#[derive(Debug, Clone)]
pub struct GeneratePhase {
    tools: Arc<Toolchain>,
}

impl GeneratePhase {
    #[must_use]
    pub fn new(tools: Arc<Toolchain>) -> Self {
        Self { tools }
    }
}

fn usable_dir_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
}

#[async_trait::async_trait]
impl Phase for GeneratePhase {
    fn descriptor(&self) -> PhaseDescriptor {
        PhaseDescriptor {
            phase: CompilationPhase::Generate,
            description: "Creating project structure",
            start_progress: 30,
            end_progress: 45,
            required: true,
        }
    }

    async fn execute(&self, ctx: &mut CompilationContext, options: &CompilationOptions) -> CompileResult<bool> {
        let name = ctx.spec()?.metadata.name.clone();
        if !usable_dir_name(&name) {
            ctx.error(
                Diagnostic::validation(format!("Project name \"{name}\" cannot be used as a directory name"))
                    .at("metadata.name"),
            );
            return Ok(false);
        }

        let fs = &self.tools.fs;
        let opts = fs_options(options);
        let root = ctx.output_dir.join(&name);
        ctx.project_root = Some(root.clone());

        let mut ok = true;
        let dirs = std::iter::once(root.clone()).chain(SKELETON.iter().map(|d| root.join(d)));
        for dir in dirs {
            let outcome = fs.create_directory(&dir, opts).await;
            if !outcome.success {
                ok = false;
                ctx.error(skeleton_error(&dir, outcome.error));
            }
        }
        if !ok {
            return Ok(false);
        }

        let base = ctx.template_dir.join("base");
        if self.tools.path_exists(&base, options).await {
            let outcome = fs.copy(&base, &root, opts).await;
            if outcome.success {
                tracing::debug!(files = outcome.written.len(), "base template copied");
                ctx.generated_files.extend(outcome.written);
            } else {
                ok = false;
                ctx.error(skeleton_error(&base, outcome.error));
            }
        } else {
            tracing::debug!(base = %base.display(), "no base template");
        }

        tracing::info!(root = %root.display(), dry_run = options.dry_run, "project structure ready");
        Ok(ok)
    }
}

fn skeleton_error(path: &Path, error: Option<String>) -> Diagnostic {
    Diagnostic::file(error.unwrap_or_else(|| "unknown filesystem error".into())).at(path.display().to_string())
}
