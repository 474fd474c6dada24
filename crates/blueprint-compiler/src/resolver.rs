//! Component resolution engine
//!
//! Maps a node's declared type to its registry entry, merges the node id
//! into the props, delegates prop validation to the registry and reports the
//! entry's direct dependencies. Transitive closure is left to callers that
//! walk the tree.
//!
//! Clean resolutions are cached by node content; a cache hit skips both the
//! registry lookup and prop validation.

use crate::options::CompilationOptions;
use blueprint_cache::PerformanceCache;
use blueprint_registry::{suggest, ComponentRegistry, PropIssue, Resolution};
use blueprint_spec::{ComponentNode, Diagnostic, Props};
use indexmap::IndexMap;
use serde_json::Value;
use std::sync::Arc;

/// Knobs that change a resolution outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Prop validation errors fail the resolution
    pub strict: bool,
    pub validate_props: bool,
    pub use_cache: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            strict: false,
            validate_props: true,
            use_cache: true,
        }
    }
}

impl From<&CompilationOptions> for ResolveOptions {
    fn from(options: &CompilationOptions) -> Self {
        Self {
            strict: options.strict,
            validate_props: options.validate_props,
            use_cache: options.use_cache,
        }
    }
}

/// Diagnostic for a type missing from the registry, with suggestions
#[must_use]
pub fn unknown_type(node: &ComponentNode, registry: &dyn ComponentRegistry) -> Diagnostic {
    let suggestions = suggest(&node.component_type, registry.type_names());
    Diagnostic::component(format!(
        "Unknown component type \"{}\"",
        node.component_type
    ))
    .at(format!("components[{}].type", node.id))
    .with_suggestions(suggestions)
}

/// Registry-backed resolver
#[derive(Debug, Clone)]
pub struct ComponentResolver {
    registry: Arc<dyn ComponentRegistry>,
    cache: Option<Arc<PerformanceCache>>,
}

impl ComponentResolver {
    /// Resolver without a cache
    #[must_use]
    pub fn new(registry: Arc<dyn ComponentRegistry>) -> Self {
        Self {
            registry,
            cache: None,
        }
    }

    /// Attach a performance cache
    #[inline]
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<PerformanceCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Registry this resolver consults
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &dyn ComponentRegistry {
        self.registry.as_ref()
    }

    fn cache_for(&self, options: ResolveOptions) -> Option<&PerformanceCache> {
        self.cache.as_deref().filter(|_| options.use_cache)
    }

    /// Resolve a single node
    #[must_use]
    pub fn resolve_component(&self, node: &ComponentNode, options: ResolveOptions) -> Resolution {
        if let Some(cache) = self.cache_for(options) {
            if let Some(mut hit) = cache.get_cached_component(node) {
                // Cache keys ignore the id; re-address the props to this node.
                hit.props.insert("id".to_string(), Value::String(node.id.clone()));
                tracing::debug!(component = %node.id, "resolution served from cache");
                return hit;
            }
        }

        let Some(entry) = self.registry.lookup(&node.component_type) else {
            tracing::debug!(component = %node.id, component_type = %node.component_type, "unknown component type");
            return Resolution::failed(node.component_type.clone(), unknown_type(node, self.registry()));
        };

        let mut props: Props = node.props.clone();
        props.insert("id".to_string(), Value::String(node.id.clone()));

        let mut resolution = Resolution {
            success: true,
            component_type: node.component_type.clone(),
            props,
            errors: Vec::new(),
            warnings: Vec::new(),
            dependencies: entry.dependencies.clone(),
        };

        let mut clean = false;
        if options.validate_props {
            let validation = self
                .registry
                .validate_props(&node.component_type, &resolution.props);
            let errors = prop_diagnostics(&node.id, validation.errors);
            resolution.warnings = prop_diagnostics(&node.id, validation.warnings);
            clean = errors.is_empty() && resolution.warnings.is_empty();

            if !errors.is_empty() {
                if options.strict {
                    resolution.success = false;
                    resolution.errors = errors;
                    return resolution;
                }
                resolution.warnings.extend(errors);
            }
        }

        // Diagnostics carry the node id in their paths, so only results
        // without any are shareable across nodes.
        if clean {
            if let Some(cache) = self.cache_for(options) {
                cache.cache_component(node, &resolution);
            }
        }
        resolution
    }

    /// Resolve each of `nodes`, keyed by id
    ///
    /// Children are not visited; pass them explicitly to resolve a subtree.
    #[must_use]
    pub fn resolve_components<'a, I>(&self, nodes: I, options: ResolveOptions) -> IndexMap<String, Resolution>
    where
        I: IntoIterator<Item = &'a ComponentNode>,
    {
        nodes
            .into_iter()
            .map(|node| (node.id.clone(), self.resolve_component(node, options)))
            .collect()
    }
}

fn prop_diagnostics(component_id: &str, issues: Vec<PropIssue>) -> Vec<Diagnostic> {
    issues
        .into_iter()
        .map(|issue| {
            let path = if issue.prop.is_empty() {
                format!("components[{component_id}].props")
            } else {
                format!("components[{component_id}].props.{}", issue.prop)
            };
            Diagnostic::validation(issue.message).at(path)
        })
        .collect()
}
