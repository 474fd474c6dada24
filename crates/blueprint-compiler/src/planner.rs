//! Consistency planner
//!
//! Cross-reference validation between components, routes and layouts. Checks
//! run in a fixed order:
//!
//! 1. template directory exists (fatal, short-circuits the rest)
//! 2. every component type is registered
//! 3. every route's component and layout id exists
//! 4. route paths are unique
//! 5. component ids are unique
//!
//! Checks 2-5 always all run so one pass reports every problem. Duplicates
//! follow the first-occurrence rule: the first use of a path or id is fine,
//! each later one is a diagnostic.
//!
//! A successful plan also yields the [`AppPlan`] IR consumed by generation.
//! The IR assigns every component a module name unique across the plan,
//! compared case-insensitively; later ids that collide get a numeric suffix.

use crate::generate::module_name;
use crate::resolver::unknown_type;
use blueprint_registry::ComponentRegistry;
use blueprint_spec::{AppSpec, ComponentNode, Diagnostic};
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

/// A component placed in the tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedComponent {
    pub id: String,
    pub component_type: String,
    pub parent: Option<String>,
    /// 0 for top-level components
    pub depth: usize,
    pub registered: bool,
    /// Generated module name, unique within the plan
    pub module: String,
}

/// A route with its references checked and its pattern annotated
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedRoute {
    pub path: String,
    pub component: String,
    pub layout: Option<String>,
    /// `:param` names in order
    pub params: Vec<String>,
    pub wildcard: bool,
    /// Whether `component` (and `layout`, if any) refer to existing ids
    pub resolved: bool,
}

/// Validated intermediate representation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AppPlan {
    /// Components by id, pre-order; the first occurrence wins for duplicate ids
    pub components: IndexMap<String, PlannedComponent>,
    pub routes: Vec<PlannedRoute>,
}

impl AppPlan {
    /// Routes whose references all resolve
    pub fn resolved_routes(&self) -> impl Iterator<Item = &PlannedRoute> {
        self.routes.iter().filter(|r| r.resolved)
    }

    /// Module name of a component; ids outside the plan use the plain mapping
    #[must_use]
    pub fn module(&self, id: &str) -> String {
        self.components
            .get(id)
            .map_or_else(|| module_name(id), |c| c.module.clone())
    }
}

/// Outcome of planning
#[derive(Debug, Clone, Default)]
pub struct PlanOutcome {
    pub success: bool,
    pub errors: Vec<Diagnostic>,
    /// Absent only when the template directory check failed
    pub plan: Option<AppPlan>,
}

/// Cross-reference validator
#[derive(Debug, Clone)]
pub struct ConsistencyPlanner {
    registry: Arc<dyn ComponentRegistry>,
}

impl ConsistencyPlanner {
    /// Planner over a registry
    #[must_use]
    pub fn new(registry: Arc<dyn ComponentRegistry>) -> Self {
        Self { registry }
    }

    /// Validate `spec` and build its plan
    pub async fn plan(&self, spec: &AppSpec, template_dir: &Path) -> PlanOutcome {
        if !is_dir(template_dir).await {
            return PlanOutcome {
                success: false,
                errors: vec![Diagnostic::dependency(format!(
                    "Template directory not found: {}",
                    template_dir.display()
                ))],
                plan: None,
            };
        }

        let nodes = spec.all_components();
        let mut errors = Vec::new();
        errors.extend(self.check_types(&nodes));
        errors.extend(check_references(spec, &nodes));
        errors.extend(check_duplicate_paths(spec));
        errors.extend(check_duplicate_ids(&nodes));

        let plan = self.build_plan(spec);
        tracing::debug!(
            components = plan.components.len(),
            routes = plan.routes.len(),
            errors = errors.len(),
            "plan built"
        );
        PlanOutcome {
            success: errors.is_empty(),
            errors,
            plan: Some(plan),
        }
    }

    fn check_types(&self, nodes: &[&ComponentNode]) -> Vec<Diagnostic> {
        nodes
            .iter()
            .filter(|node| !self.registry.contains(&node.component_type))
            .map(|node| unknown_type(node, self.registry.as_ref()))
            .collect()
    }

    fn build_plan(&self, spec: &AppSpec) -> AppPlan {
        let mut components = IndexMap::new();
        let mut taken = HashSet::new();
        let mut stack: Vec<(&ComponentNode, Option<&str>, usize)> =
            spec.components.iter().rev().map(|n| (n, None, 0)).collect();
        while let Some((node, parent, depth)) = stack.pop() {
            if !components.contains_key(&node.id) {
                let module = unique_module(&node.id, &mut taken);
                components.insert(
                    node.id.clone(),
                    PlannedComponent {
                        id: node.id.clone(),
                        component_type: node.component_type.clone(),
                        parent: parent.map(str::to_string),
                        depth,
                        registered: self.registry.contains(&node.component_type),
                        module,
                    },
                );
            }
            stack.extend(
                node.children
                    .iter()
                    .rev()
                    .map(|child| (child, Some(node.id.as_str()), depth + 1)),
            );
        }

        let routes = spec
            .routes
            .iter()
            .map(|route| {
                let component_ok = components.contains_key(&route.component);
                let layout_ok = route
                    .layout
                    .as_ref()
                    .map_or(true, |layout| components.contains_key(layout));
                PlannedRoute {
                    path: route.path.clone(),
                    component: route.component.clone(),
                    layout: route.layout.clone(),
                    params: route.params().into_iter().map(str::to_string).collect(),
                    wildcard: route.is_wildcard(),
                    resolved: component_ok && layout_ok,
                }
            })
            .collect();

        AppPlan { components, routes }
    }
}

fn unique_module(id: &str, taken: &mut HashSet<String>) -> String {
    let base = module_name(id);
    let mut candidate = base.clone();
    let mut n = 2;
    while !taken.insert(candidate.to_ascii_lowercase()) {
        candidate = format!("{base}{n}");
        n += 1;
    }
    candidate
}

async fn is_dir(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|meta| meta.is_dir())
        .unwrap_or(false)
}

fn check_references(spec: &AppSpec, nodes: &[&ComponentNode]) -> Vec<Diagnostic> {
    let ids: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
    let mut errors = Vec::new();
    for route in &spec.routes {
        if !ids.contains(route.component.as_str()) {
            errors.push(
                Diagnostic::component(format!(
                    "Component \"{}\" not found for route \"{}\"",
                    route.component, route.path
                ))
                .at(format!("routes[{}].component", route.path)),
            );
        }
        if let Some(layout) = &route.layout {
            if !ids.contains(layout.as_str()) {
                errors.push(
                    Diagnostic::component(format!(
                        "Layout \"{layout}\" not found for route \"{}\"",
                        route.path
                    ))
                    .at(format!("routes[{}].layout", route.path)),
                );
            }
        }
    }
    errors
}

fn check_duplicate_paths(spec: &AppSpec) -> Vec<Diagnostic> {
    let mut seen = HashSet::new();
    spec.routes
        .iter()
        .filter(|route| !seen.insert(route.path.as_str()))
        .map(|route| {
            Diagnostic::validation(format!("Duplicate route path \"{}\"", route.path))
                .at(format!("routes[{}].path", route.path))
        })
        .collect()
}

fn check_duplicate_ids(nodes: &[&ComponentNode]) -> Vec<Diagnostic> {
    let mut seen = HashSet::new();
    nodes
        .iter()
        .filter(|node| !seen.insert(node.id.as_str()))
        .map(|node| {
            Diagnostic::validation(format!("Duplicate component id \"{}\"", node.id))
                .at(format!("components[{}].id", node.id))
        })
        .collect()
}
