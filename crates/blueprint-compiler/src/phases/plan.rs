//! PLAN

use super::{CompilationPhase, Phase, PhaseDescriptor, Toolchain};
use crate::context::CompilationContext;
use crate::error::CompileResult;
use crate::options::CompilationOptions;
use blueprint_spec::DiagnosticKind;
use std::sync::Arc;

/// Runs the consistency planner
///
/// Strict mode fails on any planner diagnostic. Otherwise `component`
/// diagnostics (unknown types, dangling references) become warnings and
/// generation decides what to skip.
#[derive(Debug, Clone)]
pub struct PlanPhase {
    tools: Arc<Toolchain>,
}

impl PlanPhase {
    #[must_use]
    pub fn new(tools: Arc<Toolchain>) -> Self {
        Self { tools }
    }
}

#[async_trait::async_trait]
impl Phase for PlanPhase {
    fn descriptor(&self) -> PhaseDescriptor {
        PhaseDescriptor {
            phase: CompilationPhase::Plan,
            description: "Validating components, routes and layouts",
            start_progress: 15,
            end_progress: 30,
            required: true,
        }
    }

    async fn execute(&self, ctx: &mut CompilationContext, options: &CompilationOptions) -> CompileResult<bool> {
        let outcome = self
            .tools
            .planner()
            .plan(ctx.spec()?, &ctx.template_dir)
            .await;

        let mut failed = false;
        for diagnostic in outcome.errors {
            if options.strict || diagnostic.kind != DiagnosticKind::Component {
                failed = true;
                ctx.error(diagnostic);
            } else {
                ctx.warn(diagnostic);
            }
        }

        ctx.plan = outcome.plan;
        Ok(!failed && ctx.plan.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::LocalFileSystem;
    use crate::template::PlaceholderEngine;
    use blueprint_registry::StaticRegistry;
    use blueprint_spec::{AppSpec, ComponentNode, Metadata, RouteNode};

    fn phase() -> PlanPhase {
        PlanPhase::new(Arc::new(Toolchain {
            registry: Arc::new(StaticRegistry::with_defaults()),
            cache: None,
            fs: Arc::new(LocalFileSystem),
            templates: Arc::new(PlaceholderEngine),
            api_generator: None,
        }))
    }

    fn context(dir: &tempfile::TempDir, routes: Vec<RouteNode>) -> CompilationContext {
        let mut ctx = CompilationContext::new("app.json", dir.path().join("out"), dir.path());
        ctx.config = Some(AppSpec {
            metadata: Metadata::new("demo", "1.0.0"),
            components: vec![ComponentNode::new("home", "HomePage")],
            routes,
            api: None,
        });
        ctx
    }

    #[tokio::test]
    async fn lenient_mode_downgrades_dangling_references() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = context(&dir, vec![RouteNode::new("/", "missing")]);
        assert!(phase().execute(&mut ctx, &CompilationOptions::default()).await.unwrap());
        assert!(ctx.diagnostics.errors().is_empty());
        assert!(ctx.diagnostics.warnings()[0].message.contains("not found"));
        assert!(ctx.plan.is_some());
    }

    #[tokio::test]
    async fn strict_mode_fails_on_dangling_references() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = context(&dir, vec![RouteNode::new("/", "missing")]);
        let options = CompilationOptions::default().with_strict(true);
        assert!(!phase().execute(&mut ctx, &options).await.unwrap());
        assert_eq!(ctx.error_count(), 1);
    }

    #[tokio::test]
    async fn duplicates_fail_even_when_lenient() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = context(&dir, vec![RouteNode::new("/", "home"), RouteNode::new("/", "home")]);
        assert!(!phase().execute(&mut ctx, &CompilationOptions::default()).await.unwrap());
        assert_eq!(ctx.diagnostics.errors()[0].kind, DiagnosticKind::Validation);
    }

    #[tokio::test]
    async fn missing_spec_is_an_internal_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = CompilationContext::new("app.json", "out", dir.path());
        assert!(phase().execute(&mut ctx, &CompilationOptions::default()).await.is_err());
    }
}
