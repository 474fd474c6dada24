//! Registry entries and prop schemas

use blueprint_spec::Props;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Broad grouping of component types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentCategory {
    Layout,
    Navigation,
    #[default]
    Content,
    Form,
    Feedback,
    Page,
}

/// What the registry knows about one component type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryEntry {
    /// Type names this component renders directly (not transitive)
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub category: ComponentCategory,
    #[serde(default)]
    pub prop_schema: PropSchema,
}

impl RegistryEntry {
    /// Entry in a category with an open schema
    #[must_use]
    pub fn new(category: ComponentCategory) -> Self {
        Self {
            category,
            ..Self::default()
        }
    }

    /// Add a declared dependency
    #[must_use]
    pub fn depends_on(mut self, type_name: impl Into<String>) -> Self {
        self.dependencies.push(type_name.into());
        self
    }

    /// Declare a prop
    #[must_use]
    pub fn prop(mut self, name: impl Into<String>, kind: PropKind, required: bool) -> Self {
        self.prop_schema.props.insert(name.into(), PropSpec { kind, required });
        self
    }

    /// Close the schema so undeclared props produce warnings
    #[must_use]
    pub fn closed(mut self) -> Self {
        self.prop_schema.allow_unknown = false;
        self
    }
}

/// JSON kind a prop must have
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropKind {
    String,
    Number,
    Boolean,
    Array,
    Object,
    Any,
}

impl PropKind {
    /// Whether `value` has this kind (`null` never matches a concrete kind)
    #[must_use]
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::Array => value.is_array(),
            Self::Object => value.is_object(),
            Self::Any => true,
        }
    }

    /// Schema name of the kind
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
            Self::Any => "any",
        }
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Declared prop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropSpec {
    pub kind: PropKind,
    #[serde(default)]
    pub required: bool,
}

/// Prop schema of a component type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropSchema {
    #[serde(default)]
    pub props: IndexMap<String, PropSpec>,
    #[serde(default = "default_allow_unknown")]
    pub allow_unknown: bool,
}

fn default_allow_unknown() -> bool {
    true
}

impl Default for PropSchema {
    fn default() -> Self {
        Self {
            props: IndexMap::new(),
            allow_unknown: true,
        }
    }
}

/// A single prop problem
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropIssue {
    pub prop: String,
    pub message: String,
}

impl PropIssue {
    fn new(prop: &str, message: String) -> Self {
        Self {
            prop: prop.to_string(),
            message,
        }
    }
}

/// Outcome of validating props against a schema
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropValidation {
    pub valid: bool,
    pub errors: Vec<PropIssue>,
    pub warnings: Vec<PropIssue>,
}

impl PropSchema {
    /// Validate props
    ///
    /// Missing required props and kind mismatches are errors. Undeclared props
    /// are warnings on a closed schema. `id` is always accepted since every
    /// component is addressable by id at render time.
    #[must_use]
    pub fn validate(&self, props: &Props) -> PropValidation {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        for (name, spec) in &self.props {
            match props.get(name) {
                None | Some(Value::Null) if spec.required => {
                    errors.push(PropIssue::new(name, format!("Missing required prop \"{name}\"")));
                }
                None | Some(Value::Null) => {}
                Some(value) if !spec.kind.accepts(value) => errors.push(PropIssue::new(
                    name,
                    format!(
                        "Prop \"{name}\" expects {}, got {}",
                        spec.kind.as_str(),
                        kind_of(value)
                    ),
                )),
                Some(_) => {}
            }
        }

        if !self.allow_unknown {
            for name in props.keys() {
                if name != "id" && !self.props.contains_key(name) {
                    warnings.push(PropIssue::new(name, format!("Unknown prop \"{name}\"")));
                }
            }
        }

        PropValidation {
            valid: errors.is_empty(),
            errors,
            warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn button() -> RegistryEntry {
        RegistryEntry::new(ComponentCategory::Form)
            .prop("label", PropKind::String, true)
            .prop("disabled", PropKind::Boolean, false)
            .closed()
    }

    fn props(value: Value) -> Props {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn accepts_valid_props() {
        let result = button().prop_schema.validate(&props(json!({"label": "Go", "id": "cta"})));
        assert!(result.valid);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn missing_required_prop_is_error() {
        let result = button().prop_schema.validate(&props(json!({})));
        assert!(!result.valid);
        assert_eq!(result.errors[0].prop, "label");
    }

    #[test]
    fn wrong_kind_is_error() {
        let result = button()
            .prop_schema
            .validate(&props(json!({"label": "Go", "disabled": "yes"})));
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].message, "Prop \"disabled\" expects boolean, got string");
    }

    #[test]
    fn unknown_prop_warns_only_on_closed_schema() {
        let input = props(json!({"label": "Go", "colour": "red"}));
        let closed = button().prop_schema.validate(&input);
        assert!(closed.valid);
        assert_eq!(closed.warnings[0].prop, "colour");

        let open = RegistryEntry::new(ComponentCategory::Content).prop_schema.validate(&input);
        assert!(open.warnings.is_empty());
    }

    #[test]
    fn entry_decodes_from_camel_case() {
        let entry: RegistryEntry = serde_json::from_value(json!({
            "category": "page",
            "dependencies": ["Layout"],
            "propSchema": {"props": {"title": {"kind": "string", "required": true}}, "allowUnknown": false}
        }))
        .unwrap();
        assert_eq!(entry.category, ComponentCategory::Page);
        assert!(!entry.prop_schema.allow_unknown);
        assert!(entry.prop_schema.props["title"].required);
    }
}
