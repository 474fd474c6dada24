//! Compilation options and the TOML configuration file
//!
//! [`CompilationOptions`] is immutable for the duration of a run. The CLI
//! builds it from a [`BlueprintConfig`] file (if given) and then applies
//! explicit flags on top.

use crate::error::CompileError;
use blueprint_cache::CacheConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Options governing a single `compile()` call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilationOptions {
    /// Parent directory of the generated project
    pub output_dir: PathBuf,
    /// Directory holding `base/` and `templates/`
    pub template_dir: PathBuf,
    /// Fail on any planner diagnostic and on prop validation errors
    pub strict: bool,
    /// Run registry prop validation during resolution
    pub validate_props: bool,
    /// Report filesystem success without writing anything
    pub dry_run: bool,
    /// Replace existing files in the output tree
    pub overwrite: bool,
    /// Return internal errors from `compile()` instead of a FAILED result
    pub throw_on_error: bool,
    /// Consult and fill the performance cache
    pub use_cache: bool,
    /// Run the optimize extension point
    pub optimize: bool,
}

impl Default for CompilationOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./output"),
            template_dir: PathBuf::from("./templates"),
            strict: false,
            validate_props: true,
            dry_run: false,
            overwrite: false,
            throw_on_error: false,
            use_cache: true,
            optimize: false,
        }
    }
}

impl CompilationOptions {
    /// Default options
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    #[inline]
    #[must_use]
    pub fn with_template_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.template_dir = dir.into();
        self
    }

    #[inline]
    #[must_use]
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_validate_props(mut self, validate: bool) -> Self {
        self.validate_props = validate;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_throw_on_error(mut self, throw: bool) -> Self {
        self.throw_on_error = throw;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_cache(mut self, use_cache: bool) -> Self {
        self.use_cache = use_cache;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_optimize(mut self, optimize: bool) -> Self {
        self.optimize = optimize;
        self
    }
}

/// Contents of a `blueprint.toml` file
///
/// ```toml
/// registry = "components.json"
///
/// [compile]
/// output_dir = "dist"
/// strict = true
///
/// [cache]
/// persist = true
/// ttl_ms = 600000
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlueprintConfig {
    /// Optional JSON registry replacing the built-in catalogue
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registry: Option<PathBuf>,
    pub compile: CompilationOptions,
    pub cache: CacheConfig,
}

impl BlueprintConfig {
    /// Parse TOML text
    ///
    /// # Errors
    /// Returns [`CompileError::Config`] on malformed TOML or unknown shapes.
    pub fn from_toml(text: &str) -> Result<Self, CompileError> {
        toml::from_str(text).map_err(|e| CompileError::Config(e.to_string()))
    }

    /// Read and parse a TOML file
    ///
    /// # Errors
    /// Returns [`CompileError::Io`] when the file cannot be read.
    pub async fn load(path: &Path) -> Result<Self, CompileError> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| CompileError::io(path, e))?;
        Self::from_toml(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_lenient_and_cached() {
        let options = CompilationOptions::default();
        assert!(!options.strict);
        assert!(options.validate_props);
        assert!(options.use_cache);
        assert!(!options.overwrite);
    }

    #[test]
    fn toml_sections_fill_in_defaults() {
        let config = BlueprintConfig::from_toml(
            r#"
            registry = "components.json"

            [compile]
            output_dir = "dist"
            strict = true

            [cache]
            persist = true
            max_files = 10
            "#,
        )
        .unwrap();

        assert_eq!(config.registry.as_deref(), Some(Path::new("components.json")));
        assert_eq!(config.compile.output_dir, PathBuf::from("dist"));
        assert!(config.compile.strict);
        assert_eq!(config.compile.template_dir, PathBuf::from("./templates"));
        assert!(config.cache.persist);
        assert_eq!(config.cache.max_files, 10);
        assert_eq!(config.cache.max_components, 500);
    }

    #[test]
    fn empty_toml_is_default() {
        assert_eq!(BlueprintConfig::from_toml("").unwrap(), BlueprintConfig::default());
    }

    #[test]
    fn malformed_toml_is_config_error() {
        assert!(matches!(
            BlueprintConfig::from_toml("[compile\nstrict = 1"),
            Err(CompileError::Config(_))
        ));
    }
}
