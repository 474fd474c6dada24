//! Source generators
//!
//! Generators turn the validated plan into file contents; they never touch
//! the disk. Every generator reports per item so the INTEGRATE phase can
//! keep going after a failure and surface every problem in one run.

use crate::planner::{AppPlan, PlannedRoute};
use blueprint_registry::Resolution;
use blueprint_spec::{ApiEndpoint, Diagnostic, HttpMethod};
use std::fmt::{Debug, Write as _};
use std::path::PathBuf;

/// A file to write, relative to the project root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub path: PathBuf,
    pub contents: String,
}

impl GeneratedFile {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
        }
    }
}

/// Outcome for one generated item
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemResult {
    /// Component id, route path or endpoint path
    pub item: String,
    pub success: bool,
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
    pub files: Vec<GeneratedFile>,
}

impl ItemResult {
    fn ok(item: impl Into<String>, files: Vec<GeneratedFile>) -> Self {
        Self {
            item: item.into(),
            success: true,
            files,
            ..Self::default()
        }
    }

    fn failed(item: impl Into<String>, errors: Vec<Diagnostic>) -> Self {
        Self {
            item: item.into(),
            success: false,
            errors,
            ..Self::default()
        }
    }
}

/// Module name for a component id: `user-card` becomes `UserCard`
#[must_use]
pub fn module_name(id: &str) -> String {
    let mut out = String::with_capacity(id.len());
    let mut upper = true;
    for c in id.chars() {
        if c.is_ascii_alphanumeric() {
            if upper {
                out.push(c.to_ascii_uppercase());
            } else {
                out.push(c);
            }
            upper = false;
        } else {
            upper = true;
        }
    }
    if out.is_empty() || out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, 'C');
    }
    out
}

/// One component module per resolved component
#[derive(Debug, Clone, Copy, Default)]
pub struct ComponentGenerator;

impl ComponentGenerator {
    /// Generate a module for each resolution, in plan order
    ///
    /// Failed resolutions yield a failed item carrying the resolution errors.
    #[must_use]
    pub fn generate<'a, I>(&self, plan: &AppPlan, resolutions: I) -> Vec<ItemResult>
    where
        I: IntoIterator<Item = (&'a String, &'a Resolution)>,
    {
        resolutions
            .into_iter()
            .map(|(id, resolution)| {
                if !resolution.success {
                    return ItemResult::failed(id.as_str(), resolution.errors.clone());
                }
                let name = plan.module(id);
                let children: Vec<&str> = plan
                    .components
                    .values()
                    .filter(|c| c.parent.as_deref() == Some(id.as_str()))
                    .map(|c| c.module.as_str())
                    .collect();
                let file = GeneratedFile::new(
                    format!("src/components/{name}.tsx"),
                    render_component(&name, resolution, &children),
                );
                ItemResult::ok(id.as_str(), vec![file])
            })
            .collect()
    }
}

fn render_component(name: &str, resolution: &Resolution, children: &[&str]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "// Generated by blueprint. Do not edit.");
    let _ = writeln!(out, "import {{ {} }} from \"@blueprint/ui\";", resolution.component_type);
    for dependency in &resolution.dependencies {
        let _ = writeln!(out, "import {{ {dependency} }} from \"@blueprint/ui\";");
    }
    for child in children {
        let _ = writeln!(out, "import {child} from \"./{child}\";");
    }
    let props = serde_json::to_string_pretty(&resolution.props).unwrap_or_else(|_| "{}".into());
    let _ = writeln!(out, "\nconst props = {props};\n");
    let _ = writeln!(out, "export default function {name}() {{");
    if children.is_empty() {
        let _ = writeln!(out, "  return <{} {{...props}} />;", resolution.component_type);
    } else {
        let _ = writeln!(out, "  return (");
        let _ = writeln!(out, "    <{} {{...props}}>", resolution.component_type);
        for child in children {
            let _ = writeln!(out, "      <{child} />");
        }
        let _ = writeln!(out, "    </{}>", resolution.component_type);
        let _ = writeln!(out, "  );");
    }
    let _ = writeln!(out, "}}");
    out
}

/// Route table module
#[derive(Debug, Clone, Copy, Default)]
pub struct RouteGenerator;

impl RouteGenerator {
    /// One item per route; dangling routes are skipped with a warning
    ///
    /// The last item carries the route table file itself.
    #[must_use]
    pub fn generate(&self, plan: &AppPlan) -> Vec<ItemResult> {
        let mut items = Vec::with_capacity(plan.routes.len() + 1);
        let mut table = Vec::new();

        for route in &plan.routes {
            if route.resolved {
                table.push(route);
                items.push(ItemResult::ok(route.path.as_str(), Vec::new()));
            } else {
                let mut item = ItemResult::ok(route.path.as_str(), Vec::new());
                item.warnings.push(
                    Diagnostic::component(format!(
                        "Route \"{}\" skipped: referenced component not found",
                        route.path
                    ))
                    .at(format!("routes[{}]", route.path)),
                );
                items.push(item);
            }
        }

        items.push(ItemResult::ok(
            "src/routes/index.ts",
            vec![GeneratedFile::new("src/routes/index.ts", render_routes(plan, &table))],
        ));
        items
    }
}

fn render_routes(plan: &AppPlan, routes: &[&PlannedRoute]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "// Generated by blueprint. Do not edit.");
    let mut imported: Vec<String> = Vec::new();
    for route in routes {
        for id in std::iter::once(&route.component).chain(route.layout.as_ref()) {
            let name = plan.module(id);
            if !imported.contains(&name) {
                let _ = writeln!(out, "import {name} from \"../components/{name}\";");
                imported.push(name);
            }
        }
    }
    let _ = writeln!(out, "\nexport const routes = [");
    for route in routes {
        let params = route
            .params
            .iter()
            .map(|p| format!("\"{p}\""))
            .collect::<Vec<_>>()
            .join(", ");
        let layout = route
            .layout
            .as_deref()
            .map_or_else(|| "null".to_string(), |layout| plan.module(layout));
        let _ = writeln!(
            out,
            "  {{ path: \"{}\", component: {}, layout: {layout}, params: [{params}], wildcard: {} }},",
            route.path,
            plan.module(&route.component),
            route.wildcard,
        );
    }
    let _ = writeln!(out, "];");
    out
}

/// Optional capability generating API handlers
pub trait ApiRouteGenerator: Send + Sync + Debug {
    /// Generate the handler module for one endpoint
    fn generate(&self, endpoint: &ApiEndpoint) -> ItemResult;
}

/// Emits one stub handler module per endpoint under `src/api/`
#[derive(Debug, Clone, Copy, Default)]
pub struct HandlerStubGenerator;

impl ApiRouteGenerator for HandlerStubGenerator {
    fn generate(&self, endpoint: &ApiEndpoint) -> ItemResult {
        let location = format!("api.endpoints[{}]", endpoint.path);
        if endpoint.methods.is_empty() {
            return ItemResult::failed(
                endpoint.path.as_str(),
                vec![Diagnostic::validation(format!(
                    "Endpoint \"{}\" declares no methods",
                    endpoint.path
                ))
                .at(format!("{location}.methods"))],
            );
        }
        if !is_identifier(&endpoint.handler) {
            return ItemResult::failed(
                endpoint.path.as_str(),
                vec![Diagnostic::validation(format!(
                    "Endpoint \"{}\" has an unusable handler name",
                    endpoint.path
                ))
                .at(format!("{location}.handler"))],
            );
        }

        let file = GeneratedFile::new(
            format!("src/api/{}.ts", endpoint_file(&endpoint.path)),
            render_handler(endpoint),
        );
        ItemResult::ok(endpoint.path.as_str(), vec![file])
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

fn endpoint_file(path: &str) -> String {
    let segments: Vec<String> = path
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|s| s.trim_start_matches(':').replace(|c: char| !c.is_ascii_alphanumeric(), "_"))
        .collect();
    if segments.is_empty() {
        "index".to_string()
    } else {
        segments.join("_")
    }
}

fn render_handler(endpoint: &ApiEndpoint) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "// Generated by blueprint. Do not edit.");
    let _ = writeln!(out, "// {} {}", methods(&endpoint.methods), endpoint.path);
    let _ = writeln!(out, "import {{ {} }} from \"../handlers\";\n", endpoint.handler);
    for method in &endpoint.methods {
        let _ = writeln!(
            out,
            "export const {} = (req: Request) => {}(req);",
            method.as_str(),
            endpoint.handler
        );
    }
    out
}

fn methods(methods: &[HttpMethod]) -> String {
    methods
        .iter()
        .map(|m| m.as_str())
        .collect::<Vec<_>>()
        .join("|")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::PlannedComponent;
    use blueprint_spec::Props;
    use indexmap::IndexMap;
    use pretty_assertions::assert_eq;

    fn planned(id: &str, parent: Option<&str>) -> (String, PlannedComponent) {
        (
            id.to_string(),
            PlannedComponent {
                id: id.to_string(),
                component_type: "Text".into(),
                parent: parent.map(str::to_string),
                depth: usize::from(parent.is_some()),
                registered: true,
                module: module_name(id),
            },
        )
    }

    fn resolution(component_type: &str, success: bool) -> Resolution {
        Resolution {
            success,
            component_type: component_type.into(),
            props: Props::new(),
            errors: if success {
                Vec::new()
            } else {
                vec![Diagnostic::component("Unknown component type")]
            },
            warnings: Vec::new(),
            dependencies: vec!["Layout".into()],
        }
    }

    fn route(path: &str, component: &str, resolved: bool) -> PlannedRoute {
        PlannedRoute {
            path: path.into(),
            component: component.into(),
            layout: None,
            params: Vec::new(),
            wildcard: false,
            resolved,
        }
    }

    #[test]
    fn module_names_are_pascal_case_identifiers() {
        assert_eq!(module_name("user-card"), "UserCard");
        assert_eq!(module_name("home"), "Home");
        assert_eq!(module_name("404"), "C404");
        assert_eq!(module_name("--"), "C");
    }

    #[test]
    fn component_modules_import_dependencies_and_children() {
        let plan = AppPlan {
            components: IndexMap::from([planned("shell", None), planned("nav-bar", Some("shell"))]),
            routes: Vec::new(),
        };
        let resolutions = IndexMap::from([("shell".to_string(), resolution("Layout", true))]);

        let items = ComponentGenerator.generate(&plan, &resolutions);
        assert_eq!(items.len(), 1);
        let file = &items[0].files[0];
        assert_eq!(file.path, PathBuf::from("src/components/Shell.tsx"));
        assert!(file.contents.contains("import { Layout } from \"@blueprint/ui\";"));
        assert!(file.contents.contains("import NavBar from \"./NavBar\";"));
        assert!(file.contents.contains("<NavBar />"));
    }

    #[test]
    fn failed_resolutions_become_failed_items() {
        let plan = AppPlan::default();
        let resolutions = IndexMap::from([("cta".to_string(), resolution("Buton", false))]);
        let items = ComponentGenerator.generate(&plan, &resolutions);
        assert!(!items[0].success);
        assert!(items[0].files.is_empty());
    }

    #[test]
    fn route_table_skips_dangling_routes() {
        let plan = AppPlan {
            components: IndexMap::new(),
            routes: vec![route("/", "home", true), route("/gone", "missing", false)],
        };
        let items = RouteGenerator.generate(&plan);

        assert_eq!(items.len(), 3);
        assert_eq!(items[1].warnings.len(), 1);
        let table = &items[2].files[0].contents;
        assert!(table.contains("path: \"/\""));
        assert!(!table.contains("/gone"));
    }

    #[test]
    fn route_table_lists_params_and_layouts() {
        let mut user = route("/users/:id", "profile", true);
        user.params = vec!["id".into()];
        user.layout = Some("shell".into());
        let plan = AppPlan {
            components: IndexMap::new(),
            routes: vec![user],
        };
        let table = &RouteGenerator.generate(&plan)[1].files[0].contents;
        assert!(table.contains("import Shell from \"../components/Shell\";"));
        assert!(table.contains("layout: Shell, params: [\"id\"]"));
    }

    #[test]
    fn handler_stub_per_endpoint() {
        let endpoint = ApiEndpoint {
            path: "/api/users/:id".into(),
            methods: vec![HttpMethod::Get, HttpMethod::Delete],
            handler: "userHandler".into(),
        };
        let item = HandlerStubGenerator.generate(&endpoint);
        assert!(item.success);
        assert_eq!(item.files[0].path, PathBuf::from("src/api/api_users_id.ts"));
        assert!(item.files[0].contents.contains("export const DELETE"));
    }

    #[test]
    fn endpoint_without_methods_fails() {
        let endpoint = ApiEndpoint {
            path: "/api/ping".into(),
            methods: Vec::new(),
            handler: "ping".into(),
        };
        let item = HandlerStubGenerator.generate(&endpoint);
        assert!(!item.success);
        assert_eq!(item.errors[0].path(), Some("api.endpoints[/api/ping].methods"));
    }

    #[test]
    fn handler_must_be_an_identifier() {
        let endpoint = ApiEndpoint {
            path: "/api/ping".into(),
            methods: vec![HttpMethod::Get],
            handler: "ping-handler".into(),
        };
        let item = HandlerStubGenerator.generate(&endpoint);
        assert_eq!(item.errors[0].path(), Some("api.endpoints[/api/ping].handler"));
    }
}
