//! File system facade
//!
//! Mutating operations honor two flags:
//!
//! - `dry_run`: report success without touching the disk
//! - `overwrite`: when false, refuse to replace an existing file
//!
//! Existing directories are never an error for `create_directory`.
//! Mutations report `{success, error}` rather than failing; reads return
//! [`CompileResult`].

use crate::error::{CompileError, CompileResult};
use std::fmt::Debug;
use std::path::{Path, PathBuf};

/// Flags applied to a mutating operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FsOptions {
    pub dry_run: bool,
    pub overwrite: bool,
}

impl FsOptions {
    /// Flags taken from compilation options
    #[must_use]
    pub fn new(dry_run: bool, overwrite: bool) -> Self {
        Self { dry_run, overwrite }
    }

    #[inline]
    #[must_use]
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }
}

/// Outcome of a mutating operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FsOutcome {
    pub success: bool,
    pub error: Option<String>,
    /// Files written (or that would have been in a dry run)
    pub written: Vec<PathBuf>,
}

impl FsOutcome {
    fn ok(written: Vec<PathBuf>) -> Self {
        Self {
            success: true,
            error: None,
            written,
        }
    }

    fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            written: Vec::new(),
        }
    }
}

impl From<CompileResult<Vec<PathBuf>>> for FsOutcome {
    fn from(result: CompileResult<Vec<PathBuf>>) -> Self {
        match result {
            Ok(written) => Self::ok(written),
            Err(e) => Self::failed(e.to_string()),
        }
    }
}

/// Narrow filesystem contract used by the pipeline
#[async_trait::async_trait]
pub trait FileSystem: Send + Sync + Debug {
    /// Whether `path` exists
    async fn exists(&self, path: &Path) -> bool;

    /// Create a directory and its parents
    async fn create_directory(&self, path: &Path, options: FsOptions) -> FsOutcome;

    /// Write a file, creating parent directories
    async fn create_file(&self, path: &Path, contents: &str, options: FsOptions) -> FsOutcome;

    /// Copy a file or a directory tree
    async fn copy(&self, from: &Path, to: &Path, options: FsOptions) -> FsOutcome;

    /// Delete a file or a directory tree
    async fn delete(&self, path: &Path, options: FsOptions) -> FsOutcome;

    /// Read a UTF-8 file
    async fn read_to_string(&self, path: &Path) -> CompileResult<String>;

    /// Every file below `dir`, sorted
    async fn list_files(&self, dir: &Path) -> CompileResult<Vec<PathBuf>>;
}

/// Facade over the local disk
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSystem;

impl LocalFileSystem {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    async fn write_file(path: &Path, contents: &str, options: FsOptions) -> CompileResult<Vec<PathBuf>> {
        if !options.overwrite && path_exists(path).await {
            return Err(CompileError::io(
                path,
                std::io::Error::new(std::io::ErrorKind::AlreadyExists, "file exists and overwrite is disabled"),
            ));
        }
        if options.dry_run {
            return Ok(vec![path.to_path_buf()]);
        }
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| CompileError::io(parent, e))?;
        }
        tokio::fs::write(path, contents)
            .await
            .map_err(|e| CompileError::io(path, e))?;
        Ok(vec![path.to_path_buf()])
    }

    async fn copy_tree(from: &Path, to: &Path, options: FsOptions) -> CompileResult<Vec<PathBuf>> {
        let meta = tokio::fs::metadata(from)
            .await
            .map_err(|e| CompileError::io(from, e))?;
        if !meta.is_dir() {
            return Self::copy_file(from, to, options).await.map(|p| vec![p]);
        }

        let mut written = Vec::new();
        for source in walk(from).await? {
            let relative = source.strip_prefix(from).unwrap_or(source.as_path());
            written.push(Self::copy_file(&source, &to.join(relative), options).await?);
        }
        Ok(written)
    }

    async fn copy_file(from: &Path, to: &Path, options: FsOptions) -> CompileResult<PathBuf> {
        if !options.overwrite && path_exists(to).await {
            return Err(CompileError::io(
                to,
                std::io::Error::new(std::io::ErrorKind::AlreadyExists, "file exists and overwrite is disabled"),
            ));
        }
        if !options.dry_run {
            if let Some(parent) = to.parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| CompileError::io(parent, e))?;
            }
            tokio::fs::copy(from, to)
                .await
                .map_err(|e| CompileError::io(from, e))?;
        }
        Ok(to.to_path_buf())
    }
}

#[async_trait::async_trait]
impl FileSystem for LocalFileSystem {
    async fn exists(&self, path: &Path) -> bool {
        path_exists(path).await
    }

    async fn create_directory(&self, path: &Path, options: FsOptions) -> FsOutcome {
        if options.dry_run {
            return FsOutcome::ok(Vec::new());
        }
        match tokio::fs::create_dir_all(path).await {
            Ok(()) => FsOutcome::ok(Vec::new()),
            Err(e) => FsOutcome::failed(CompileError::io(path, e).to_string()),
        }
    }

    async fn create_file(&self, path: &Path, contents: &str, options: FsOptions) -> FsOutcome {
        Self::write_file(path, contents, options).await.into()
    }

    async fn copy(&self, from: &Path, to: &Path, options: FsOptions) -> FsOutcome {
        Self::copy_tree(from, to, options).await.into()
    }

    async fn delete(&self, path: &Path, options: FsOptions) -> FsOutcome {
        let meta = match tokio::fs::metadata(path).await {
            Ok(meta) => meta,
            Err(e) => return FsOutcome::failed(CompileError::io(path, e).to_string()),
        };
        if options.dry_run {
            return FsOutcome::ok(Vec::new());
        }
        let result = if meta.is_dir() {
            tokio::fs::remove_dir_all(path).await
        } else {
            tokio::fs::remove_file(path).await
        };
        match result {
            Ok(()) => FsOutcome::ok(Vec::new()),
            Err(e) => FsOutcome::failed(CompileError::io(path, e).to_string()),
        }
    }

    async fn read_to_string(&self, path: &Path) -> CompileResult<String> {
        tokio::fs::read_to_string(path)
            .await
            .map_err(|e| CompileError::io(path, e))
    }

    async fn list_files(&self, dir: &Path) -> CompileResult<Vec<PathBuf>> {
        walk(dir).await
    }
}

async fn path_exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}

async fn walk(root: &Path) -> CompileResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let mut entries = tokio::fs::read_dir(&dir)
            .await
            .map_err(|e| CompileError::io(&dir, e))?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| CompileError::io(&dir, e))?
        {
            let path = entry.path();
            let file_type = entry
                .file_type()
                .await
                .map_err(|e| CompileError::io(&path, e))?;
            if file_type.is_dir() {
                pending.push(path);
            } else {
                files.push(path);
            }
        }
    }
    files.sort();
    Ok(files)
}
