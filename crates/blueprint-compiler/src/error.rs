//! Error types for the compilation pipeline
//!
//! Errors are internal: inside a phase they propagate with `?`, and at the
//! phase boundary they become [`Diagnostic`] values. Only the orchestrator's
//! `throw_on_error` mode lets a [`CompileError`] escape `compile()`.

use blueprint_registry::RegistryError;
use blueprint_spec::{Diagnostic, DiagnosticKind, SpecError};
use std::path::PathBuf;

/// Main compiler error type
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    /// Spec file could not be loaded
    #[error("spec error: {0}")]
    Spec(#[from] SpecError),

    /// Registry could not be loaded
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Filesystem operation failed
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Template text is malformed
    #[error("template error: {0}")]
    Template(#[from] TemplateError),

    /// Manifest or context could not be encoded
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration file is invalid
    #[error("configuration error: {0}")]
    Config(String),

    /// A phase ran without the artifact an earlier phase produces
    #[error("missing {0}: earlier phase did not produce it")]
    MissingArtifact(&'static str),
}

impl CompileError {
    /// Create IO error for path
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Diagnostic kind this error maps to at a phase boundary
    #[must_use]
    pub fn kind(&self) -> DiagnosticKind {
        match self {
            Self::Io { .. } | Self::Spec(SpecError::Io { .. }) => DiagnosticKind::File,
            Self::Template(_) => DiagnosticKind::Template,
            Self::Serialization(_) => DiagnosticKind::Validation,
            Self::Registry(_) | Self::Config(_) | Self::MissingArtifact(_) => {
                DiagnosticKind::Dependency
            }
        }
    }

    /// Translate into a diagnostic of the matching kind
    #[must_use]
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::new(self.kind(), self.to_string())
    }
}

/// Template validation failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    /// Template text failed validation
    #[error("{}", .0.join("; "))]
    Invalid(Vec<String>),
}

/// Result type for compiler operations
pub type CompileResult<T> = Result<T, CompileError>;
