//! Structured diagnostics
//!
//! A [`Diagnostic`] is a value, never an exception: once a phase has caught
//! an internal failure it turns it into one of these and appends it to the
//! run's [`DiagnosticBag`]. Diagnostics are never mutated after creation.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Closed classification of diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticKind {
    /// Structural or semantic spec errors
    Validation,
    /// Registry or cross-reference errors
    Component,
    /// Planning and infrastructure failures
    Dependency,
    /// I/O failures
    File,
    /// Template substitution or validation failures
    Template,
}

impl DiagnosticKind {
    /// Lower-case label used in reports
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Component => "component",
            Self::Dependency => "dependency",
            Self::File => "file",
            Self::Template => "template",
        }
    }
}

impl Display for DiagnosticKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a diagnostic points
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
    /// Dotted property path, e.g. `routes[/].component`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl Location {
    /// Location identified by a property path
    #[must_use]
    pub fn at_path(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    /// Location identified by a file position
    #[must_use]
    pub fn at_position(file: Option<String>, line: usize, column: usize) -> Self {
        Self {
            file,
            line: Some(line),
            column: Some(column),
            path: None,
        }
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut wrote = false;
        if let Some(file) = &self.file {
            f.write_str(file)?;
            wrote = true;
        }
        if let Some(line) = self.line {
            write!(f, ":{line}")?;
            if let Some(column) = self.column {
                write!(f, ":{column}")?;
            }
            wrote = true;
        }
        if let Some(path) = &self.path {
            if wrote {
                f.write_str(" ")?;
            }
            f.write_str(path)?;
        }
        Ok(())
    }
}

/// A compilation error or warning record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

impl Diagnostic {
    /// Create a diagnostic with no location
    #[must_use]
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            location: None,
            suggestions: Vec::new(),
        }
    }

    /// Shorthand for a `validation` diagnostic
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Validation, message)
    }

    /// Shorthand for a `component` diagnostic
    #[must_use]
    pub fn component(message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Component, message)
    }

    /// Shorthand for a `dependency` diagnostic
    #[must_use]
    pub fn dependency(message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Dependency, message)
    }

    /// Shorthand for a `file` diagnostic
    #[must_use]
    pub fn file(message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::File, message)
    }

    /// Shorthand for a `template` diagnostic
    #[must_use]
    pub fn template(message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Template, message)
    }

    /// Attach a location
    #[must_use]
    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    /// Attach a property-path location
    #[must_use]
    pub fn at(self, path: impl Into<String>) -> Self {
        self.with_location(Location::at_path(path))
    }

    /// Attach suggestions
    #[must_use]
    pub fn with_suggestions(mut self, suggestions: Vec<String>) -> Self {
        self.suggestions = suggestions;
        self
    }

    /// Property path of the location, if any
    #[must_use]
    pub fn path(&self) -> Option<&str> {
        self.location.as_ref().and_then(|l| l.path.as_deref())
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)?;
        if let Some(location) = &self.location {
            write!(f, " ({location})")?;
        }
        if !self.suggestions.is_empty() {
            write!(f, " - did you mean: {}?", self.suggestions.join(", "))?;
        }
        Ok(())
    }
}

/// Append-only error and warning accumulator for one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticBag {
    errors: Vec<Diagnostic>,
    warnings: Vec<Diagnostic>,
}

impl DiagnosticBag {
    /// Empty bag
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error
    pub fn error(&mut self, diagnostic: Diagnostic) {
        tracing::debug!(kind = %diagnostic.kind, "error: {}", diagnostic.message);
        self.errors.push(diagnostic);
    }

    /// Record a warning
    pub fn warn(&mut self, diagnostic: Diagnostic) {
        tracing::debug!(kind = %diagnostic.kind, "warning: {}", diagnostic.message);
        self.warnings.push(diagnostic);
    }

    /// Record several errors
    pub fn extend_errors(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        for d in diagnostics {
            self.error(d);
        }
    }

    /// Record several warnings
    pub fn extend_warnings(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        for d in diagnostics {
            self.warn(d);
        }
    }

    /// Errors recorded so far
    #[must_use]
    pub fn errors(&self) -> &[Diagnostic] {
        &self.errors
    }

    /// Warnings recorded so far
    #[must_use]
    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warnings
    }

    /// Whether any error was recorded
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Split into `(errors, warnings)`
    #[must_use]
    pub fn into_parts(self) -> (Vec<Diagnostic>, Vec<Diagnostic>) {
        (self.errors, self.warnings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_location_and_suggestions() {
        let d = Diagnostic::component("Unknown component type \"Buton\"")
            .at("components[cta].type")
            .with_suggestions(vec!["Button".into()]);
        assert_eq!(
            d.to_string(),
            "[component] Unknown component type \"Buton\" (components[cta].type) - did you mean: Button?"
        );
    }

    #[test]
    fn location_display_with_position() {
        let loc = Location::at_position(Some("app.json".into()), 3, 14);
        assert_eq!(loc.to_string(), "app.json:3:14");
    }

    #[test]
    fn kind_serializes_lowercase() {
        let json = serde_json::to_string(&DiagnosticKind::Dependency).unwrap();
        assert_eq!(json, "\"dependency\"");
    }

    #[test]
    fn bag_keeps_errors_and_warnings_apart() {
        let mut bag = DiagnosticBag::new();
        bag.warn(Diagnostic::file("slow disk"));
        assert!(!bag.has_errors());
        bag.error(Diagnostic::validation("bad"));
        let (errors, warnings) = bag.into_parts();
        assert_eq!(errors.len(), 1);
        assert_eq!(warnings.len(), 1);
    }
}
