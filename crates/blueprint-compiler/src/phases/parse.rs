//! INIT and PARSE

use super::{CompilationPhase, Phase, PhaseDescriptor};
use crate::context::CompilationContext;
use crate::error::{CompileError, CompileResult};
use crate::options::CompilationOptions;
use blueprint_spec::{ParseOptions, SpecParser};

/// No-op placeholder opening the pipeline
#[derive(Debug, Clone, Copy, Default)]
pub struct InitPhase;

#[async_trait::async_trait]
impl Phase for InitPhase {
    fn descriptor(&self) -> PhaseDescriptor {
        PhaseDescriptor {
            phase: CompilationPhase::Init,
            description: "Initializing compilation",
            start_progress: 0,
            end_progress: 5,
            required: true,
        }
    }

    async fn execute(&self, ctx: &mut CompilationContext, _: &CompilationOptions) -> CompileResult<bool> {
        tracing::debug!(
            spec = %ctx.config_path.display(),
            output = %ctx.output_dir.display(),
            templates = %ctx.template_dir.display(),
            "compilation context ready"
        );
        Ok(true)
    }
}

/// Reads and parses the spec file
#[derive(Debug, Clone, Copy, Default)]
pub struct ParsePhase;

#[async_trait::async_trait]
impl Phase for ParsePhase {
    fn descriptor(&self) -> PhaseDescriptor {
        PhaseDescriptor {
            phase: CompilationPhase::Parse,
            description: "Parsing application spec",
            start_progress: 5,
            end_progress: 15,
            required: true,
        }
    }

    async fn execute(&self, ctx: &mut CompilationContext, _: &CompilationOptions) -> CompileResult<bool> {
        let parsed = SpecParser::new()
            .parse_file(&ctx.config_path, &ParseOptions::with_locations())
            .await;

        let outcome = match parsed {
            Ok(outcome) => outcome,
            Err(e) => {
                ctx.error(CompileError::from(e).to_diagnostic());
                return Ok(false);
            }
        };

        let success = outcome.success();
        ctx.diagnostics.extend_errors(outcome.errors);
        if let Some(spec) = &outcome.config {
            tracing::info!(
                name = %spec.metadata.name,
                version = %spec.metadata.version,
                components = spec.all_components().len(),
                routes = spec.routes.len(),
                "spec parsed"
            );
        }
        ctx.config = outcome.config;
        Ok(success)
    }
}
