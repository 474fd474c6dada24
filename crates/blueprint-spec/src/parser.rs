//! Spec parser
//!
//! Turns JSON or YAML text into an [`AppSpec`]. Parsing runs in three steps:
//!
//! 1. decode the text into a generic document (syntax errors carry line/column)
//! 2. structural checks over the document, reporting every problem with a
//!    dotted property path in one pass
//! 3. typed decoding into [`AppSpec`]
//!
//! Component types are not checked against any registry here; that is a
//! planning concern.

use crate::diagnostic::{Diagnostic, Location};
use crate::error::SpecError;
use crate::model::AppSpec;
use serde_json::{Map, Value};
use std::path::Path;

const CONDITION_OPERATORS: &[&str] = &[
    "equals",
    "notEquals",
    "contains",
    "greaterThan",
    "lessThan",
    "exists",
];

const HTTP_METHODS: &[&str] = &["GET", "POST", "PUT", "PATCH", "DELETE", "HEAD", "OPTIONS"];

/// Source format of a spec document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpecFormat {
    #[default]
    Json,
    Yaml,
}

impl SpecFormat {
    /// Pick a format from a file extension, defaulting to JSON
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => Self::Yaml,
            _ => Self::Json,
        }
    }
}

/// Parser options
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// Explicit format; inferred from the path when parsing a file
    pub format: Option<SpecFormat>,
    /// Attach line/column positions to syntax errors
    pub include_locations: bool,
    /// Name reported in locations (usually the file path)
    pub source_name: Option<String>,
}

impl ParseOptions {
    /// Options that report syntax positions
    #[must_use]
    pub fn with_locations() -> Self {
        Self {
            include_locations: true,
            ..Self::default()
        }
    }

    /// Set the format explicitly
    #[must_use]
    pub fn format(mut self, format: SpecFormat) -> Self {
        self.format = Some(format);
        self
    }
}

/// Result of a parse
#[derive(Debug, Clone, Default)]
pub struct ParseOutcome {
    /// Decoded spec, present only when there were no errors
    pub config: Option<AppSpec>,
    pub errors: Vec<Diagnostic>,
}

impl ParseOutcome {
    /// Whether the spec decoded cleanly
    #[must_use]
    pub fn success(&self) -> bool {
        self.config.is_some() && self.errors.is_empty()
    }

    fn failed(errors: Vec<Diagnostic>) -> Self {
        Self {
            config: None,
            errors,
        }
    }
}

/// JSON/YAML spec parser
#[derive(Debug, Clone, Copy, Default)]
pub struct SpecParser;

impl SpecParser {
    /// Create a parser
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Parse spec text
    #[must_use]
    pub fn parse_str(&self, text: &str, options: &ParseOptions) -> ParseOutcome {
        let format = options.format.unwrap_or_default();
        let document = match decode(text, format, options) {
            Ok(document) => document,
            Err(diagnostic) => return ParseOutcome::failed(vec![diagnostic]),
        };

        let errors = check_structure(&document);
        if !errors.is_empty() {
            tracing::debug!(count = errors.len(), "spec failed structural checks");
            return ParseOutcome::failed(errors);
        }

        match serde_json::from_value::<AppSpec>(document) {
            Ok(config) => ParseOutcome {
                config: Some(config),
                errors: Vec::new(),
            },
            Err(e) => ParseOutcome::failed(vec![Diagnostic::validation(format!(
                "Spec does not match the expected shape: {e}"
            ))]),
        }
    }

    /// Read and parse a spec file
    ///
    /// The format is inferred from the extension unless set in `options`.
    ///
    /// # Errors
    /// Returns [`SpecError::Io`] when the file cannot be read. Content
    /// problems are reported through [`ParseOutcome::errors`] instead.
    pub async fn parse_file(
        &self,
        path: impl AsRef<Path>,
        options: &ParseOptions,
    ) -> Result<ParseOutcome, SpecError> {
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| SpecError::io(path, e))?;

        let mut options = options.clone();
        options.format = Some(options.format.unwrap_or_else(|| SpecFormat::from_path(path)));
        if options.source_name.is_none() {
            options.source_name = Some(path.display().to_string());
        }
        Ok(self.parse_str(&text, &options))
    }
}

fn decode(text: &str, format: SpecFormat, options: &ParseOptions) -> Result<Value, Diagnostic> {
    let (message, position) = match format {
        SpecFormat::Json => match serde_json::from_str::<Value>(text) {
            Ok(v) => return Ok(v),
            Err(e) => (format!("Invalid JSON: {e}"), Some((e.line(), e.column()))),
        },
        SpecFormat::Yaml => match serde_yaml::from_str::<Value>(text) {
            Ok(v) => return Ok(v),
            Err(e) => {
                let position = e.location().map(|l| (l.line(), l.column()));
                (format!("Invalid YAML: {e}"), position)
            }
        },
    };

    let mut diagnostic = Diagnostic::validation(message);
    if options.include_locations {
        if let Some((line, column)) = position {
            diagnostic = diagnostic.with_location(Location::at_position(
                options.source_name.clone(),
                line,
                column,
            ));
        }
    }
    Err(diagnostic)
}

/// Structural checks over the generic document
fn check_structure(document: &Value) -> Vec<Diagnostic> {
    let mut checker = Checker::default();
    let Some(root) = document.as_object() else {
        checker.fail("", "Spec root must be an object");
        return checker.errors;
    };

    match root.get("metadata") {
        None => checker.missing("metadata"),
        Some(Value::Object(metadata)) => {
            checker.required_str(metadata, "name", "metadata.name");
            checker.required_str(metadata, "version", "metadata.version");
            for key in ["description", "author", "license"] {
                checker.optional_str(metadata, key, &format!("metadata.{key}"));
            }
        }
        Some(_) => checker.fail("metadata", "metadata must be an object"),
    }

    match root.get("components") {
        None | Some(Value::Null) => {}
        Some(Value::Array(components)) => checker.components(components, "components"),
        Some(_) => checker.fail("components", "components must be an array"),
    }

    match root.get("routes") {
        None => checker.missing("routes"),
        Some(Value::Array(routes)) => {
            for (i, route) in routes.iter().enumerate() {
                checker.route(route, &format!("routes[{i}]"));
            }
        }
        Some(_) => checker.fail("routes", "routes must be an array"),
    }

    match root.get("api") {
        None | Some(Value::Null) => {}
        Some(Value::Object(api)) => match api.get("endpoints") {
            None => {}
            Some(Value::Array(endpoints)) => {
                for (i, endpoint) in endpoints.iter().enumerate() {
                    checker.endpoint(endpoint, &format!("api.endpoints[{i}]"));
                }
            }
            Some(_) => checker.fail("api.endpoints", "api.endpoints must be an array"),
        },
        Some(_) => checker.fail("api", "api must be an object"),
    }

    checker.errors
}

#[derive(Default)]
struct Checker {
    errors: Vec<Diagnostic>,
}

impl Checker {
    fn fail(&mut self, path: &str, message: impl Into<String>) {
        let mut diagnostic = Diagnostic::validation(message);
        if !path.is_empty() {
            diagnostic = diagnostic.at(path);
        }
        self.errors.push(diagnostic);
    }

    fn missing(&mut self, path: &str) {
        self.fail(path, format!("Missing required field: {path}"));
    }

    fn required_str(&mut self, object: &Map<String, Value>, key: &str, path: &str) {
        match object.get(key) {
            None | Some(Value::Null) => self.missing(path),
            Some(Value::String(s)) if s.trim().is_empty() => {
                self.fail(path, format!("{path} must not be empty"));
            }
            Some(Value::String(_)) => {}
            Some(_) => self.fail(path, format!("{path} must be a string")),
        }
    }

    fn optional_str(&mut self, object: &Map<String, Value>, key: &str, path: &str) {
        match object.get(key) {
            None | Some(Value::Null | Value::String(_)) => {}
            Some(_) => self.fail(path, format!("{path} must be a string")),
        }
    }

    fn string_list(&mut self, object: &Map<String, Value>, key: &str, path: &str) {
        match object.get(key) {
            None | Some(Value::Null) => {}
            Some(Value::Array(items)) => {
                for (i, item) in items.iter().enumerate() {
                    if !item.is_string() {
                        self.fail(&format!("{path}[{i}]"), format!("{path}[{i}] must be a string"));
                    }
                }
            }
            Some(_) => self.fail(path, format!("{path} must be an array of strings")),
        }
    }

    fn components(&mut self, components: &[Value], path: &str) {
        for (i, component) in components.iter().enumerate() {
            self.component(component, &format!("{path}[{i}]"));
        }
    }

    fn component(&mut self, value: &Value, path: &str) {
        let Some(component) = value.as_object() else {
            self.fail(path, format!("{path} must be an object"));
            return;
        };
        self.required_str(component, "id", &format!("{path}.id"));
        self.required_str(component, "type", &format!("{path}.type"));

        match component.get("props") {
            None | Some(Value::Null | Value::Object(_)) => {}
            Some(_) => self.fail(&format!("{path}.props"), format!("{path}.props must be an object")),
        }

        match component.get("children") {
            None | Some(Value::Null) => {}
            Some(Value::Array(children)) => self.components(children, &format!("{path}.children")),
            Some(_) => self.fail(
                &format!("{path}.children"),
                format!("{path}.children must be an array"),
            ),
        }

        match component.get("conditions") {
            None | Some(Value::Null) => {}
            Some(Value::Array(conditions)) => {
                for (i, condition) in conditions.iter().enumerate() {
                    self.condition(condition, &format!("{path}.conditions[{i}]"));
                }
            }
            Some(_) => self.fail(
                &format!("{path}.conditions"),
                format!("{path}.conditions must be an array"),
            ),
        }
    }

    fn condition(&mut self, value: &Value, path: &str) {
        let Some(condition) = value.as_object() else {
            self.fail(path, format!("{path} must be an object"));
            return;
        };
        self.required_str(condition, "field", &format!("{path}.field"));
        match condition.get("operator").and_then(Value::as_str) {
            Some(op) if CONDITION_OPERATORS.contains(&op) => {}
            Some(op) => self.fail(
                &format!("{path}.operator"),
                format!(
                    "Unknown operator \"{op}\" (expected one of: {})",
                    CONDITION_OPERATORS.join(", ")
                ),
            ),
            None => self.missing(&format!("{path}.operator")),
        }
    }

    fn route(&mut self, value: &Value, path: &str) {
        let Some(route) = value.as_object() else {
            self.fail(path, format!("{path} must be an object"));
            return;
        };
        self.required_str(route, "path", &format!("{path}.path"));
        self.required_str(route, "component", &format!("{path}.component"));
        self.optional_str(route, "layout", &format!("{path}.layout"));
        self.string_list(route, "middleware", &format!("{path}.middleware"));

        match route.get("meta") {
            None | Some(Value::Null) => {}
            Some(Value::Object(meta)) => {
                for key in ["title", "description", "cacheControl", "dataHandler"] {
                    self.optional_str(meta, key, &format!("{path}.meta.{key}"));
                }
                self.string_list(meta, "keywords", &format!("{path}.meta.keywords"));
                match meta.get("requiresAuth") {
                    None | Some(Value::Null | Value::Bool(_)) => {}
                    Some(_) => self.fail(
                        &format!("{path}.meta.requiresAuth"),
                        format!("{path}.meta.requiresAuth must be a boolean"),
                    ),
                }
            }
            Some(_) => self.fail(&format!("{path}.meta"), format!("{path}.meta must be an object")),
        }
    }

    fn endpoint(&mut self, value: &Value, path: &str) {
        let Some(endpoint) = value.as_object() else {
            self.fail(path, format!("{path} must be an object"));
            return;
        };
        self.required_str(endpoint, "path", &format!("{path}.path"));
        self.required_str(endpoint, "handler", &format!("{path}.handler"));

        let methods_path = format!("{path}.methods");
        match endpoint.get("methods") {
            None | Some(Value::Null) => self.missing(&methods_path),
            Some(Value::Array(methods)) if methods.is_empty() => {
                self.fail(&methods_path, format!("{methods_path} must not be empty"));
            }
            Some(Value::Array(methods)) => {
                for (i, method) in methods.iter().enumerate() {
                    match method.as_str() {
                        Some(m) if HTTP_METHODS.contains(&m) => {}
                        _ => self.fail(
                            &format!("{methods_path}[{i}]"),
                            format!("Unsupported HTTP method {method}"),
                        ),
                    }
                }
            }
            Some(_) => self.fail(&methods_path, format!("{methods_path} must be an array")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::DiagnosticKind;
    use pretty_assertions::assert_eq;

    fn parse(text: &str) -> ParseOutcome {
        SpecParser::new().parse_str(text, &ParseOptions::with_locations())
    }

    fn error_paths(outcome: &ParseOutcome) -> Vec<&str> {
        outcome.errors.iter().filter_map(Diagnostic::path).collect()
    }

    #[test]
    fn parses_minimal_spec() {
        let outcome = parse(
            r#"{"metadata":{"name":"demo","version":"1.0.0"},
                "components":[{"id":"home","type":"HomePage","props":{}}],
                "routes":[{"path":"/","component":"home"}]}"#,
        );
        assert!(outcome.success(), "{:?}", outcome.errors);
        let spec = outcome.config.unwrap();
        assert_eq!(spec.metadata.name, "demo");
        assert_eq!(spec.components[0].component_type, "HomePage");
    }

    #[test]
    fn missing_version_names_the_field() {
        let outcome = parse(r#"{"metadata":{"name":"demo"},"routes":[]}"#);
        assert!(!outcome.success());
        assert_eq!(outcome.errors[0].kind, DiagnosticKind::Validation);
        assert!(outcome.errors[0].message.contains("metadata.version"));
    }

    #[test]
    fn missing_routes_names_the_field() {
        let outcome = parse(r#"{"metadata":{"name":"demo","version":"1.0.0"}}"#);
        assert!(!outcome.success());
        assert_eq!(error_paths(&outcome), ["routes"]);
        assert!(outcome.errors[0].message.contains("routes"));
    }

    #[test]
    fn empty_routes_are_allowed() {
        let outcome = parse(r#"{"metadata":{"name":"demo","version":"1.0.0"},"routes":[]}"#);
        assert!(outcome.success());
    }

    #[test]
    fn reports_every_structural_problem_at_once() {
        let outcome = parse(
            r#"{"metadata":{"name":"","version":"1"},
                "components":[{"id":"a","children":[{"type":"Button"}]}],
                "routes":[{"path":"/"}],
                "api":{"endpoints":[{"path":"/x","handler":"h","methods":["FETCH"]}]}}"#,
        );
        assert_eq!(
            error_paths(&outcome),
            [
                "metadata.name",
                "components[0].type",
                "components[0].children[0].id",
                "routes[0].component",
                "api.endpoints[0].methods[0]",
            ]
        );
    }

    #[test]
    fn json_syntax_error_carries_position() {
        let outcome = SpecParser::new().parse_str(
            "{\n  \"metadata\": {,\n}",
            &ParseOptions {
                include_locations: true,
                source_name: Some("app.json".into()),
                ..ParseOptions::default()
            },
        );
        let location = outcome.errors[0].location.as_ref().unwrap();
        assert_eq!(location.file.as_deref(), Some("app.json"));
        assert_eq!(location.line, Some(2));
        assert!(location.column.is_some());
    }

    #[test]
    fn syntax_position_is_omitted_unless_requested() {
        let outcome = SpecParser::new().parse_str("{", &ParseOptions::default());
        assert!(outcome.errors[0].location.is_none());
    }

    #[test]
    fn parses_yaml() {
        let yaml = "metadata:\n  name: demo\n  version: 1.0.0\ncomponents:\n  - id: home\n    type: HomePage\nroutes:\n  - path: /\n    component: home\n";
        let outcome = SpecParser::new()
            .parse_str(yaml, &ParseOptions::default().format(SpecFormat::Yaml));
        assert!(outcome.success(), "{:?}", outcome.errors);
        assert_eq!(outcome.config.unwrap().routes[0].path, "/");
    }

    #[test]
    fn rejects_unknown_condition_operator() {
        let outcome = parse(
            r#"{"metadata":{"name":"d","version":"1"},
                "components":[{"id":"a","type":"Text","conditions":[{"field":"x","operator":"near"}]}],
                "routes":[]}"#,
        );
        assert_eq!(error_paths(&outcome), ["components[0].conditions[0].operator"]);
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(SpecFormat::from_path(Path::new("app.yml")), SpecFormat::Yaml);
        assert_eq!(SpecFormat::from_path(Path::new("app.json")), SpecFormat::Json);
        assert_eq!(SpecFormat::from_path(Path::new("app")), SpecFormat::Json);
    }

    #[tokio::test]
    async fn parse_file_reports_missing_file_as_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = SpecParser::new()
            .parse_file(dir.path().join("nope.json"), &ParseOptions::default())
            .await;
        assert!(matches!(result, Err(SpecError::Io { .. })));
    }

    #[tokio::test]
    async fn parse_file_infers_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.yaml");
        std::fs::write(&path, "metadata: {name: demo, version: '1'}\nroutes: []\n").unwrap();
        let outcome = SpecParser::new()
            .parse_file(&path, &ParseOptions::default())
            .await
            .unwrap();
        assert!(outcome.success(), "{:?}", outcome.errors);
    }
}
