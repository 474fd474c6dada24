//! INTEGRATE: resolve, generate and render
//!
//! Each item (component, route, endpoint, template) succeeds or fails on
//! its own. A failed item fails the phase, but every remaining item is
//! still processed so a single run reports every problem.

use super::{fs_options, CompilationPhase, Phase, PhaseDescriptor, Toolchain};
use crate::context::CompilationContext;
use crate::error::{CompileError, CompileResult};
use crate::fs::FsOptions;
use crate::generate::{ComponentGenerator, GeneratedFile, ItemResult, RouteGenerator};
use crate::options::CompilationOptions;
use crate::planner::AppPlan;
use crate::resolver::ResolveOptions;
use crate::VERSION;
use blueprint_spec::{AppSpec, Diagnostic};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;

/// Suffix marking a renderable template under `templates/`
pub const TEMPLATE_SUFFIX: &str = "tmpl";

#[derive(Debug, Clone)]
pub struct IntegratePhase {
    tools: Arc<Toolchain>,
}

impl IntegratePhase {
    #[must_use]
    pub fn new(tools: Arc<Toolchain>) -> Self {
        Self { tools }
    }
}

#[async_trait::async_trait]
impl Phase for IntegratePhase {
    fn descriptor(&self) -> PhaseDescriptor {
        PhaseDescriptor {
            phase: CompilationPhase::Integrate,
            description: "Generating components, routes and templates",
            start_progress: 45,
            end_progress: 85,
            required: true,
        }
    }

    async fn execute(&self, ctx: &mut CompilationContext, options: &CompilationOptions) -> CompileResult<bool> {
        let spec = ctx.spec()?.clone();
        let mut plan = ctx.app_plan()?.clone();
        let root = ctx.root()?.to_path_buf();
        let errors_before = ctx.error_count();
        let mut run = Integration {
            tools: &self.tools,
            ctx,
            options,
            root: &root,
            fs_opts: fs_options(options),
        };

        run.resolve(&spec);
        run.components(&plan).await;

        let resolutions = &run.ctx.resolutions;
        let failed = |id: &str| resolutions.get(id).is_some_and(|r| !r.success);
        for route in &mut plan.routes {
            if failed(&route.component) || route.layout.as_deref().is_some_and(failed) {
                route.resolved = false;
            }
        }
        run.routes(&plan).await;
        run.api(&spec).await;
        run.templates(&spec, &plan).await?;

        let ok = run.ctx.error_count() == errors_before;
        tracing::info!(
            components = run.ctx.resolutions.len(),
            files = run.ctx.generated_files.len(),
            ok,
            "integration finished"
        );
        Ok(ok)
    }
}

/// Borrowed state of one INTEGRATE run
struct Integration<'a> {
    tools: &'a Toolchain,
    ctx: &'a mut CompilationContext,
    options: &'a CompilationOptions,
    root: &'a Path,
    fs_opts: FsOptions,
}

impl Integration<'_> {
    /// A failed item is an error in strict mode and a skip otherwise
    fn item_failure(&mut self, diagnostic: Diagnostic) {
        if self.options.strict {
            self.ctx.error(diagnostic);
        } else {
            self.ctx.warn(diagnostic);
        }
    }

    fn resolve(&mut self, spec: &AppSpec) {
        let resolutions = self
            .tools
            .resolver()
            .resolve_components(spec.all_components(), ResolveOptions::from(self.options));
        for resolution in resolutions.values() {
            self.ctx.diagnostics.extend_warnings(resolution.warnings.iter().cloned());
        }
        self.ctx.resolutions = resolutions;
    }

    async fn components(&mut self, plan: &AppPlan) {
        let items = ComponentGenerator.generate(plan, &self.ctx.resolutions);
        for item in items {
            if item.success {
                self.apply(item).await;
            } else {
                tracing::debug!(component = %item.item, "component skipped");
                for diagnostic in item.errors {
                    self.item_failure(diagnostic);
                }
            }
        }
    }

    async fn routes(&mut self, plan: &AppPlan) {
        for item in RouteGenerator.generate(plan) {
            self.apply(item).await;
        }
    }

    async fn api(&mut self, spec: &AppSpec) {
        let endpoints = spec.endpoints();
        if endpoints.is_empty() {
            return;
        }
        let Some(generator) = self.tools.api_generator.clone() else {
            self.ctx.warn(
                Diagnostic::dependency(format!(
                    "{} API endpoint(s) declared but no API generator is configured; skipped",
                    endpoints.len()
                ))
                .at("api.endpoints"),
            );
            return;
        };
        for endpoint in endpoints {
            let item = generator.generate(endpoint);
            if item.success {
                self.apply(item).await;
            } else {
                self.ctx.diagnostics.extend_warnings(item.warnings);
                self.ctx.diagnostics.extend_errors(item.errors);
            }
        }
    }

    /// Record an item's warnings and write its files
    async fn apply(&mut self, item: ItemResult) {
        self.ctx.diagnostics.extend_warnings(item.warnings);
        for file in item.files {
            self.write(&file).await;
        }
    }

    async fn write(&mut self, file: &GeneratedFile) {
        let target = self.root.join(&file.path);
        let outcome = self.tools.fs.create_file(&target, &file.contents, self.fs_opts).await;
        if outcome.success {
            self.ctx.generated_files.extend(outcome.written);
        } else {
            self.ctx.error(
                Diagnostic::file(outcome.error.unwrap_or_else(|| "write failed".into()))
                    .at(file.path.display().to_string()),
            );
        }
    }

    async fn templates(&mut self, spec: &AppSpec, plan: &AppPlan) -> CompileResult<()> {
        let dir = self.ctx.template_dir.join("templates");
        if !self.tools.path_exists(&dir, self.options).await {
            tracing::debug!(dir = %dir.display(), "no templates to render");
            return Ok(());
        }
        // The directory exists, so a listing failure is an environment fault.
        let files = self.tools.fs.list_files(&dir).await?;

        let context = template_context(spec, plan)?;
        for path in files {
            if path.extension().and_then(|e| e.to_str()) != Some(TEMPLATE_SUFFIX) {
                continue;
            }
            let relative = path.strip_prefix(&dir).unwrap_or(path.as_path()).with_extension("");
            let location = format!("templates/{}", relative.display());
            match self.render(&path, &context).await {
                Ok(rendered) => self.write(&GeneratedFile::new(relative, rendered)).await,
                Err(e) => {
                    let diagnostic = e.to_diagnostic();
                    self.ctx.error(diagnostic.at(location));
                }
            }
        }
        Ok(())
    }

    async fn render(&self, path: &Path, context: &Value) -> CompileResult<String> {
        let cache = self.tools.cache_for(self.options);
        if let Some(cache) = cache {
            if let Some(hit) = cache.get_cached_template(path, context).await {
                tracing::trace!(template = %path.display(), "template cache hit");
                return Ok(hit);
            }
            // Renders of earlier versions or contexts of this template are dead.
            cache.invalidate_dependencies(&path.to_string_lossy());
        }

        let text = self.tools.fs.read_to_string(path).await?;
        let rendered = self.tools.templates.render(&text, context)?;
        if let Some(cache) = cache {
            cache.cache_template(path, context, rendered.clone()).await;
        }
        Ok(rendered)
    }
}

/// Context every template renders against
///
/// Built only from the spec and plan, so identical inputs give identical
/// context hashes across runs.
pub fn template_context(spec: &AppSpec, plan: &AppPlan) -> Result<Value, CompileError> {
    let components: Vec<Value> = plan
        .components
        .values()
        .map(|c| {
            json!({
                "id": c.id,
                "type": c.component_type,
                "module": c.module,
            })
        })
        .collect();
    let routes: Vec<Value> = plan
        .routes
        .iter()
        .map(|r| {
            json!({
                "path": r.path,
                "component": r.component,
                "layout": r.layout,
                "params": r.params,
                "wildcard": r.wildcard,
                "resolved": r.resolved,
            })
        })
        .collect();

    Ok(json!({
        "metadata": serde_json::to_value(&spec.metadata)?,
        "name": spec.metadata.name,
        "version": spec.metadata.version,
        "components": components,
        "routes": routes,
        "endpoints": serde_json::to_value(spec.endpoints())?,
        "generator": { "name": "blueprint", "version": VERSION },
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::LocalFileSystem;
    use crate::generate::HandlerStubGenerator;
    use crate::planner::ConsistencyPlanner;
    use crate::template::PlaceholderEngine;
    use blueprint_cache::{CacheConfig, PerformanceCache};
    use blueprint_registry::{ComponentRegistry, StaticRegistry};
    use blueprint_spec::{ApiEndpoint, ApiSpec, ComponentNode, DiagnosticKind, HttpMethod, Metadata, RouteNode};
    use pretty_assertions::assert_eq;

    struct Fixture {
        dir: tempfile::TempDir,
        tools: Arc<Toolchain>,
    }

    impl Fixture {
        fn new() -> Self {
            Self::with(None, None)
        }

        fn with(
            cache: Option<Arc<PerformanceCache>>,
            api: Option<Arc<dyn crate::generate::ApiRouteGenerator>>,
        ) -> Self {
            let registry: Arc<dyn ComponentRegistry> = Arc::new(StaticRegistry::with_defaults());
            Self {
                dir: tempfile::tempdir().unwrap(),
                tools: Arc::new(Toolchain {
                    registry,
                    cache,
                    fs: Arc::new(LocalFileSystem),
                    templates: Arc::new(PlaceholderEngine),
                    api_generator: api,
                }),
            }
        }

        fn template(&self, name: &str, text: &str) {
            let path = self.dir.path().join("tpl/templates").join(name);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, text).unwrap();
        }

        async fn context(&self, spec: AppSpec) -> CompilationContext {
            let template_dir = self.dir.path().join("tpl");
            std::fs::create_dir_all(&template_dir).unwrap();
            let outcome = ConsistencyPlanner::new(Arc::clone(&self.tools.registry))
                .plan(&spec, &template_dir)
                .await;
            let mut ctx = CompilationContext::new("app.json", self.dir.path().join("out"), template_dir);
            ctx.project_root = Some(self.dir.path().join("out/demo"));
            ctx.plan = outcome.plan;
            ctx.config = Some(spec);
            ctx
        }

        async fn run(&self, ctx: &mut CompilationContext, options: &CompilationOptions) -> bool {
            IntegratePhase::new(Arc::clone(&self.tools))
                .execute(ctx, options)
                .await
                .unwrap()
        }

        fn root(&self) -> std::path::PathBuf {
            self.dir.path().join("out/demo")
        }
    }

    fn spec(components: Vec<ComponentNode>, routes: Vec<RouteNode>) -> AppSpec {
        AppSpec {
            metadata: Metadata::new("demo", "1.0.0"),
            components,
            routes,
            api: None,
        }
    }

    #[tokio::test]
    async fn writes_components_and_route_table() {
        let fx = Fixture::new();
        let mut ctx = fx
            .context(spec(
                vec![ComponentNode::new("home", "HomePage")],
                vec![RouteNode::new("/", "home")],
            ))
            .await;

        assert!(fx.run(&mut ctx, &CompilationOptions::default()).await);
        assert!(fx.root().join("src/components/Home.tsx").is_file());
        let table = std::fs::read_to_string(fx.root().join("src/routes/index.ts")).unwrap();
        assert!(table.contains("component: Home"));
        assert_eq!(ctx.generated_files.len(), 2);
    }

    #[tokio::test]
    async fn lenient_mode_skips_unknown_types() {
        let fx = Fixture::new();
        let mut ctx = fx
            .context(spec(
                vec![ComponentNode::new("home", "HomePage"), ComponentNode::new("cta", "Buton")],
                vec![RouteNode::new("/", "home"), RouteNode::new("/go", "cta")],
            ))
            .await;

        assert!(fx.run(&mut ctx, &CompilationOptions::default()).await);
        assert!(!fx.root().join("src/components/Cta.tsx").exists());
        let skipped = &ctx.diagnostics.warnings()[0];
        assert_eq!(skipped.kind, DiagnosticKind::Component);
        assert!(skipped.suggestions.contains(&"Button".to_string()));

        let table = std::fs::read_to_string(fx.root().join("src/routes/index.ts")).unwrap();
        assert!(!table.contains("/go"));
    }

    #[tokio::test]
    async fn strict_mode_fails_on_unresolved_components() {
        let fx = Fixture::new();
        let mut ctx = fx
            .context(spec(vec![ComponentNode::new("cta", "Buton")], Vec::new()))
            .await;
        let options = CompilationOptions::default().with_strict(true);
        assert!(!fx.run(&mut ctx, &options).await);
        assert_eq!(ctx.error_count(), 1);
    }

    #[tokio::test]
    async fn endpoints_without_generator_warn() {
        let fx = Fixture::new();
        let mut app = spec(Vec::new(), Vec::new());
        app.api = Some(ApiSpec {
            endpoints: vec![ApiEndpoint {
                path: "/api/ping".into(),
                methods: vec![HttpMethod::Get],
                handler: "ping".into(),
            }],
        });
        let mut ctx = fx.context(app).await;
        assert!(fx.run(&mut ctx, &CompilationOptions::default()).await);
        assert_eq!(ctx.diagnostics.warnings()[0].kind, DiagnosticKind::Dependency);
    }

    #[tokio::test]
    async fn endpoints_with_generator_write_handlers() {
        let fx = Fixture::with(None, Some(Arc::new(HandlerStubGenerator)));
        let mut app = spec(Vec::new(), Vec::new());
        app.api = Some(ApiSpec {
            endpoints: vec![ApiEndpoint {
                path: "/api/ping".into(),
                methods: vec![HttpMethod::Get],
                handler: "ping".into(),
            }],
        });
        let mut ctx = fx.context(app).await;
        assert!(fx.run(&mut ctx, &CompilationOptions::default()).await);
        assert!(fx.root().join("src/api/api_ping.ts").is_file());
    }

    #[tokio::test]
    async fn renders_templates_with_suffix_stripped() {
        let fx = Fixture::new();
        fx.template("package.json.tmpl", r#"{"name":"{{ name }}","version":"{{ metadata.version }}"}"#);
        fx.template("notes.txt", "ignored");
        let mut ctx = fx.context(spec(Vec::new(), Vec::new())).await;

        assert!(fx.run(&mut ctx, &CompilationOptions::default()).await);
        let rendered = std::fs::read_to_string(fx.root().join("package.json")).unwrap();
        assert_eq!(rendered, r#"{"name":"demo","version":"1.0.0"}"#);
        assert!(!fx.root().join("notes.txt").exists());
    }

    #[tokio::test]
    async fn invalid_template_fails_but_others_render() {
        let fx = Fixture::new();
        fx.template("a.txt.tmpl", "{{ oops");
        fx.template("b.txt.tmpl", "{{ name }}");
        let mut ctx = fx.context(spec(Vec::new(), Vec::new())).await;

        assert!(!fx.run(&mut ctx, &CompilationOptions::default()).await);
        let error = &ctx.diagnostics.errors()[0];
        assert_eq!(error.kind, DiagnosticKind::Template);
        assert_eq!(error.path(), Some("templates/a.txt"));
        assert_eq!(std::fs::read_to_string(fx.root().join("b.txt")).unwrap(), "demo");
    }

    #[tokio::test]
    async fn rendered_templates_are_cached() {
        let cache = Arc::new(PerformanceCache::new(CacheConfig::default()));
        let fx = Fixture::with(Some(Arc::clone(&cache)), None);
        fx.template("a.txt.tmpl", "{{ name }}");
        let mut ctx = fx.context(spec(Vec::new(), Vec::new())).await;

        assert!(fx.run(&mut ctx, &CompilationOptions::default()).await);
        assert_eq!(cache.stats().templates.entries, 1);
    }

    #[test]
    fn template_context_is_deterministic() {
        let app = spec(vec![ComponentNode::new("home", "HomePage")], vec![RouteNode::new("/", "home")]);
        let plan = AppPlan::default();
        let a = template_context(&app, &plan).unwrap();
        let b = template_context(&app, &plan).unwrap();
        assert_eq!(a, b);
        assert_eq!(a["generator"]["name"], "blueprint");
    }
}
