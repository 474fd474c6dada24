//! Application spec data model
//!
//! The root input is [`AppSpec`]: metadata, a component tree, route
//! definitions and an optional API surface. Field names follow the camelCase
//! document format on the wire.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Component props, kept in document order
pub type Props = IndexMap<String, Value>;

/// Root declarative application description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSpec {
    /// Project metadata
    pub metadata: Metadata,
    /// Top-level component nodes
    #[serde(default)]
    pub components: Vec<ComponentNode>,
    /// Route table (may be empty, must be present)
    pub routes: Vec<RouteNode>,
    /// Optional API endpoints
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api: Option<ApiSpec>,
}

impl AppSpec {
    /// Every component in the tree, pre-order (parents before children)
    #[must_use]
    pub fn all_components(&self) -> Vec<&ComponentNode> {
        let mut out = Vec::new();
        let mut stack: Vec<&ComponentNode> = self.components.iter().rev().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(node.children.iter().rev());
        }
        out
    }

    /// Find a component anywhere in the tree by id (first match in pre-order)
    #[must_use]
    pub fn find_component(&self, id: &str) -> Option<&ComponentNode> {
        self.all_components().into_iter().find(|c| c.id == id)
    }

    /// API endpoints, empty when no API is declared
    #[must_use]
    pub fn endpoints(&self) -> &[ApiEndpoint] {
        self.api.as_ref().map_or(&[], |api| api.endpoints.as_slice())
    }
}

/// Project metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    /// Project name, also the output folder name
    pub name: String,
    /// Project version
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
}

impl Metadata {
    /// Metadata with just the required fields
    #[must_use]
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            description: None,
            author: None,
            license: None,
        }
    }
}

/// A node of the component tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentNode {
    /// Unique id, referenced by routes
    pub id: String,
    /// Registry key; existence is checked at plan time, not parse time
    #[serde(rename = "type")]
    pub component_type: String,
    #[serde(default)]
    pub props: Props,
    #[serde(default)]
    pub children: Vec<ComponentNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Vec<Condition>>,
}

impl ComponentNode {
    /// Leaf node with no props
    #[must_use]
    pub fn new(id: impl Into<String>, component_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            component_type: component_type.into(),
            props: Props::new(),
            children: Vec::new(),
            conditions: None,
        }
    }

    /// Add a prop
    #[must_use]
    pub fn with_prop(mut self, key: impl Into<String>, value: Value) -> Self {
        self.props.insert(key.into(), value);
        self
    }

    /// Append a child
    #[must_use]
    pub fn with_child(mut self, child: ComponentNode) -> Self {
        self.children.push(child);
        self
    }

    /// Attach a render condition
    #[must_use]
    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.get_or_insert_with(Vec::new).push(condition);
        self
    }
}

/// Render condition on a component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub field: String,
    pub operator: ConditionOperator,
    #[serde(default)]
    pub value: Value,
}

/// Comparison used by a [`Condition`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConditionOperator {
    Equals,
    NotEquals,
    Contains,
    GreaterThan,
    LessThan,
    Exists,
}

impl ConditionOperator {
    /// Wire name of the operator
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Equals => "equals",
            Self::NotEquals => "notEquals",
            Self::Contains => "contains",
            Self::GreaterThan => "greaterThan",
            Self::LessThan => "lessThan",
            Self::Exists => "exists",
        }
    }
}

/// A route binding a URL pattern to a component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteNode {
    /// URL pattern, may contain `:param` and `*` segments
    pub path: String,
    /// Referenced component id
    pub component: String,
    /// Referenced layout component id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub middleware: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<RouteMeta>,
}

impl RouteNode {
    /// Route without layout, middleware or meta
    #[must_use]
    pub fn new(path: impl Into<String>, component: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            component: component.into(),
            layout: None,
            middleware: None,
            meta: None,
        }
    }

    /// Set the layout reference
    #[must_use]
    pub fn with_layout(mut self, layout: impl Into<String>) -> Self {
        self.layout = Some(layout.into());
        self
    }

    /// Names of `:param` segments, in order
    #[must_use]
    pub fn params(&self) -> Vec<&str> {
        self.path
            .split('/')
            .filter_map(|segment| segment.strip_prefix(':'))
            .filter(|name| !name.is_empty())
            .collect()
    }

    /// Whether the pattern contains a `*` catch-all segment
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        self.path.split('/').any(|segment| segment == "*")
    }
}

/// Optional route metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires_auth: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_control: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_handler: Option<String>,
}

/// API surface of the application
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiSpec {
    #[serde(default)]
    pub endpoints: Vec<ApiEndpoint>,
}

/// A single API endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiEndpoint {
    pub path: String,
    pub methods: Vec<HttpMethod>,
    pub handler: String,
}

/// HTTP verbs accepted by an endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl HttpMethod {
    /// Upper-case verb
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
        }
    }
}
