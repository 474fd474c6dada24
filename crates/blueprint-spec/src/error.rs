//! Error types for spec loading

use std::path::PathBuf;

/// Errors raised while loading a spec from disk
///
/// Content problems (syntax, structure) are diagnostics, not errors; this
/// type only covers failures to obtain the text at all.
#[derive(Debug, thiserror::Error)]
pub enum SpecError {
    /// Spec file could not be read
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SpecError {
    /// Create IO error for path
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_display_names_path() {
        let err = SpecError::io(
            "specs/app.json",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert_eq!(err.to_string(), "io error reading specs/app.json: gone");
    }
}
