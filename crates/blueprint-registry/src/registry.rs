//! Component registry
//!
//! [`ComponentRegistry`] is the seam the compiler consults for type lookup
//! and prop validation. [`StaticRegistry`] is the in-memory implementation,
//! seeded with a default catalogue or loaded from a JSON document.

use crate::entry::{ComponentCategory, PropKind, PropValidation, RegistryEntry};
use crate::error::RegistryError;
use blueprint_spec::Props;
use indexmap::IndexMap;
use std::fmt::Debug;
use std::path::Path;

/// Read-only view of the known component types
pub trait ComponentRegistry: Send + Sync + Debug {
    /// Entry for a type name, if registered
    fn lookup(&self, type_name: &str) -> Option<&RegistryEntry>;

    /// All registered type names, in registration order
    fn type_names(&self) -> Vec<&str>;

    /// Validate props for a registered type
    ///
    /// Unregistered types yield an invalid result with a single error.
    fn validate_props(&self, type_name: &str, props: &Props) -> PropValidation;

    /// Whether a type name is registered
    fn contains(&self, type_name: &str) -> bool {
        self.lookup(type_name).is_some()
    }
}

/// In-memory registry keyed by type name
#[derive(Debug, Clone, Default)]
pub struct StaticRegistry {
    entries: IndexMap<String, RegistryEntry>,
}

impl StaticRegistry {
    /// Create an empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry seeded with the built-in catalogue
    #[must_use]
    pub fn with_defaults() -> Self {
        use ComponentCategory::{Content, Feedback, Form, Layout, Navigation, Page};
        use PropKind as P;

        let mut registry = Self::new();
        registry.register("Layout", RegistryEntry::new(Layout).depends_on("Header").depends_on("Footer"));
        registry.register("Container", RegistryEntry::new(Layout).prop("maxWidth", P::String, false));
        registry.register(
            "Grid",
            RegistryEntry::new(Layout)
                .prop("columns", P::Number, false)
                .prop("gap", P::String, false),
        );
        registry.register("Header", RegistryEntry::new(Layout).prop("title", P::String, false));
        registry.register("Footer", RegistryEntry::new(Layout).prop("text", P::String, false));
        registry.register(
            "Navbar",
            RegistryEntry::new(Navigation)
                .depends_on("Link")
                .prop("links", P::Array, false)
                .prop("brand", P::String, false),
        );
        registry.register("Sidebar", RegistryEntry::new(Navigation).depends_on("Link").prop("items", P::Array, false));
        registry.register(
            "Link",
            RegistryEntry::new(Navigation)
                .prop("href", P::String, true)
                .prop("label", P::String, false)
                .closed(),
        );
        registry.register("Text", RegistryEntry::new(Content).prop("content", P::String, false));
        registry.register(
            "Heading",
            RegistryEntry::new(Content)
                .prop("text", P::String, true)
                .prop("level", P::Number, false)
                .closed(),
        );
        registry.register(
            "Image",
            RegistryEntry::new(Content)
                .prop("src", P::String, true)
                .prop("alt", P::String, false)
                .closed(),
        );
        registry.register("Card", RegistryEntry::new(Content).depends_on("Heading").depends_on("Text"));
        registry.register("List", RegistryEntry::new(Content).prop("items", P::Array, false));
        registry.register(
            "Button",
            RegistryEntry::new(Form)
                .prop("label", P::String, false)
                .prop("variant", P::String, false)
                .prop("disabled", P::Boolean, false)
                .prop("onClick", P::String, false)
                .closed(),
        );
        registry.register(
            "Form",
            RegistryEntry::new(Form)
                .depends_on("Input")
                .depends_on("Button")
                .prop("action", P::String, false)
                .prop("fields", P::Array, false),
        );
        registry.register(
            "Input",
            RegistryEntry::new(Form)
                .prop("name", P::String, true)
                .prop("type", P::String, false)
                .prop("placeholder", P::String, false)
                .prop("required", P::Boolean, false),
        );
        registry.register("Select", RegistryEntry::new(Form).prop("name", P::String, true).prop("options", P::Array, false));
        registry.register("Checkbox", RegistryEntry::new(Form).prop("name", P::String, true).prop("checked", P::Boolean, false));
        registry.register("Modal", RegistryEntry::new(Feedback).prop("open", P::Boolean, false).prop("title", P::String, false));
        registry.register("Alert", RegistryEntry::new(Feedback).prop("message", P::String, true).prop("severity", P::String, false));
        registry.register("HomePage", RegistryEntry::new(Page).depends_on("Layout").prop("title", P::String, false));
        registry.register("Page", RegistryEntry::new(Page).depends_on("Layout").prop("title", P::String, false));
        registry.register(
            "DashboardPage",
            RegistryEntry::new(Page)
                .depends_on("Layout")
                .depends_on("Grid")
                .depends_on("Card")
                .prop("widgets", P::Array, false)
                .prop("filters", P::Object, false),
        );
        registry
    }

    /// Load a registry from a JSON object mapping type names to entries
    ///
    /// # Errors
    /// Returns [`RegistryError::Decode`] if the document is not a valid
    /// registry description.
    pub fn from_json(text: &str) -> Result<Self, RegistryError> {
        let entries: IndexMap<String, RegistryEntry> = serde_json::from_str(text)?;
        Ok(Self { entries })
    }

    /// Load a registry from a JSON file
    ///
    /// # Errors
    /// Returns [`RegistryError::Io`] on read failure, or a decode error.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| RegistryError::io(path, e))?;
        Self::from_json(&text)
    }

    /// Register (or replace) a component type
    pub fn register(&mut self, type_name: impl Into<String>, entry: RegistryEntry) {
        self.entries.insert(type_name.into(), entry);
    }

    /// Builder form of [`register`](Self::register)
    #[must_use]
    pub fn with(mut self, type_name: impl Into<String>, entry: RegistryEntry) -> Self {
        self.register(type_name, entry);
        self
    }

    /// Remove a component type
    pub fn remove(&mut self, type_name: &str) -> Option<RegistryEntry> {
        self.entries.shift_remove(type_name)
    }

    /// Number of registered types
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Type names of a category
    #[must_use]
    pub fn by_category(&self, category: ComponentCategory) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(_, e)| e.category == category)
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

impl ComponentRegistry for StaticRegistry {
    fn lookup(&self, type_name: &str) -> Option<&RegistryEntry> {
        self.entries.get(type_name)
    }

    fn type_names(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    fn validate_props(&self, type_name: &str, props: &Props) -> PropValidation {
        match self.entries.get(type_name) {
            Some(entry) => entry.prop_schema.validate(props),
            None => PropValidation {
                valid: false,
                errors: vec![crate::entry::PropIssue {
                    prop: String::new(),
                    message: format!("Unknown component type \"{type_name}\""),
                }],
                warnings: Vec::new(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_cover_common_types() {
        let registry = StaticRegistry::with_defaults();
        for name in ["Button", "HomePage", "Layout", "Form", "Navbar"] {
            assert!(registry.contains(name), "missing {name}");
        }
        assert!(!registry.contains("Buton"));
    }

    #[test]
    fn type_names_keep_registration_order() {
        let registry = StaticRegistry::new()
            .with("B", RegistryEntry::default())
            .with("A", RegistryEntry::default());
        assert_eq!(registry.type_names(), ["B", "A"]);
    }

    #[test]
    fn lookup_returns_declared_dependencies() {
        let registry = StaticRegistry::with_defaults();
        let form = registry.lookup("Form").unwrap();
        assert_eq!(form.dependencies, ["Input", "Button"]);
    }

    #[test]
    fn validate_props_for_unknown_type_is_invalid() {
        let registry = StaticRegistry::new();
        let result = registry.validate_props("Ghost", &Props::new());
        assert!(!result.valid);
        assert!(result.errors[0].message.contains("Ghost"));
    }

    #[test]
    fn loads_from_json() {
        let registry = StaticRegistry::from_json(
            &json!({
                "Hero": {"category": "content", "dependencies": ["Button"]},
                "Button": {"category": "form"}
            })
            .to_string(),
        )
        .unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.lookup("Hero").unwrap().dependencies, ["Button"]);
        assert_eq!(registry.by_category(ComponentCategory::Form), ["Button"]);
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(
            StaticRegistry::from_json("[1, 2]"),
            Err(RegistryError::Decode(_))
        ));
    }

    #[test]
    fn remove_unregisters() {
        let mut registry = StaticRegistry::with_defaults();
        assert!(registry.remove("Modal").is_some());
        assert!(!registry.contains("Modal"));
    }
}
