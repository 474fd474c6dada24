//! Resolution record
//!
//! The outcome of mapping a component node's declared type to a registry
//! entry: the validated props and the entry's direct dependencies.

use blueprint_spec::{Diagnostic, Props};
use serde::{Deserialize, Serialize};

/// Result of resolving one component node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
    pub success: bool,
    pub component_type: String,
    /// Node props with the node id merged in under `id`
    pub props: Props,
    #[serde(default)]
    pub errors: Vec<Diagnostic>,
    #[serde(default)]
    pub warnings: Vec<Diagnostic>,
    /// Declared (direct) dependencies of the registry entry
    #[serde(default)]
    pub dependencies: Vec<String>,
}

impl Resolution {
    /// Failed resolution carrying a single error
    #[must_use]
    pub fn failed(component_type: impl Into<String>, error: Diagnostic) -> Self {
        Self {
            success: false,
            component_type: component_type.into(),
            props: Props::new(),
            errors: vec![error],
            warnings: Vec::new(),
            dependencies: Vec::new(),
        }
    }

    /// Suggestions attached to the errors, flattened
    #[must_use]
    pub fn suggestions(&self) -> Vec<&str> {
        self.errors
            .iter()
            .flat_map(|e| e.suggestions.iter().map(String::as_str))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_resolution_exposes_suggestions() {
        let resolution = Resolution::failed(
            "Buton",
            Diagnostic::component("Unknown component type \"Buton\"")
                .with_suggestions(vec!["Button".into()]),
        );
        assert!(!resolution.success);
        assert_eq!(resolution.suggestions(), ["Button"]);
    }
}
