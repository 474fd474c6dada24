//! Testing utilities for the Blueprint workspace
//!
//! Throwaway project workspaces, spec fixtures and a progress recorder.

#![allow(missing_docs)]

use blueprint_compiler::{CompilationOptions, CompilationPhase, ProgressEvent};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Demo application touching every spec feature
pub fn demo_spec() -> Value {
    json!({
        "metadata": {
            "name": "demo",
            "version": "1.0.0",
            "description": "Blueprint demo application",
            "author": "Blueprint Team",
            "license": "MIT"
        },
        "components": [
            {
                "id": "shell",
                "type": "Layout",
                "children": [
                    { "id": "header", "type": "Header", "props": { "title": "Demo" } },
                    { "id": "footer", "type": "Footer", "props": { "text": "(c) demo" } }
                ]
            },
            { "id": "home", "type": "HomePage", "props": { "title": "Welcome" } },
            {
                "id": "signup",
                "type": "Form",
                "props": { "action": "/api/users" },
                "children": [
                    { "id": "email", "type": "Input", "props": { "name": "email" } },
                    { "id": "submit", "type": "Button", "props": { "label": "Sign up" } }
                ]
            },
            { "id": "profile", "type": "Page", "props": { "title": "Profile" } },
            { "id": "docs", "type": "Page" }
        ],
        "routes": [
            { "path": "/", "component": "home", "layout": "shell" },
            { "path": "/signup", "component": "signup", "layout": "shell" },
            { "path": "/users/:id", "component": "profile", "layout": "shell" },
            { "path": "/docs/*", "component": "docs" }
        ],
        "api": {
            "endpoints": [
                { "path": "/api/users", "methods": ["GET", "POST"], "handler": "usersHandler" },
                { "path": "/api/users/:id", "methods": ["GET", "DELETE"], "handler": "userHandler" }
            ]
        }
    })
}

/// Smallest valid spec with one page
pub fn minimal_spec(name: &str) -> Value {
    json!({
        "metadata": { "name": name, "version": "0.1.0" },
        "components": [ { "id": "home", "type": "HomePage" } ],
        "routes": [ { "path": "/", "component": "home" } ]
    })
}

/// Temporary directory laid out as spec file, template dir and output dir
#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// Empty workspace with an empty `templates/` directory
    ///
    /// # Panics
    /// When the temporary directory cannot be created.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        std::fs::create_dir_all(dir.path().join("templates")).expect("create templates dir");
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn template_dir(&self) -> PathBuf {
        self.path().join("templates")
    }

    pub fn output_dir(&self) -> PathBuf {
        self.path().join("out")
    }

    /// Generated project root for `name`
    pub fn project(&self, name: &str) -> PathBuf {
        self.output_dir().join(name)
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.path().join(".cache")
    }

    /// Options pointing at this workspace
    pub fn options(&self) -> CompilationOptions {
        CompilationOptions::default()
            .with_output_dir(self.output_dir())
            .with_template_dir(self.template_dir())
    }

    /// Write `spec` as `app.json`
    ///
    /// # Panics
    /// On I/O failure.
    pub fn write_spec(&self, spec: &Value) -> PathBuf {
        let text = serde_json::to_string_pretty(spec).expect("encode spec");
        self.write_file("app.json", &text)
    }

    /// Write a file relative to the workspace root
    ///
    /// # Panics
    /// On I/O failure.
    pub fn write_file(&self, relative: impl AsRef<Path>, text: &str) -> PathBuf {
        let path = self.path().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent dir");
        }
        std::fs::write(&path, text).expect("write file");
        path
    }

    /// Add `templates/templates/<relative>`
    pub fn template(&self, relative: &str, text: &str) -> PathBuf {
        self.write_file(Path::new("templates/templates").join(relative), text)
    }

    /// Add `templates/base/<relative>`
    pub fn base_file(&self, relative: &str, text: &str) -> PathBuf {
        self.write_file(Path::new("templates/base").join(relative), text)
    }

    /// Read a generated file
    ///
    /// # Panics
    /// When the file does not exist.
    pub fn read(&self, path: impl AsRef<Path>) -> String {
        let path = path.as_ref();
        std::fs::read_to_string(path).unwrap_or_else(|e| panic!("read {}: {e}", path.display()))
    }
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}

/// Collects progress events for later assertions
#[derive(Debug, Clone, Default)]
pub struct ProgressRecorder {
    events: Arc<Mutex<Vec<ProgressEvent>>>,
}

impl ProgressRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Callback to hand to the orchestrator
    pub fn callback(&self) -> impl Fn(&ProgressEvent) + Send + Sync + 'static {
        let events = Arc::clone(&self.events);
        move |event: &ProgressEvent| events.lock().push(event.clone())
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().clone()
    }

    pub fn percentages(&self) -> Vec<u8> {
        self.events.lock().iter().map(|e| e.progress).collect()
    }

    pub fn phases(&self) -> Vec<CompilationPhase> {
        self.events.lock().iter().map(|e| e.phase).collect()
    }

    pub fn last(&self) -> Option<ProgressEvent> {
        self.events.lock().last().cloned()
    }
}

/// Paths of every file below `root`, relative and sorted
///
/// # Panics
/// When `root` cannot be read.
pub fn tree(root: &Path) -> Vec<PathBuf> {
    fn walk(dir: &Path, root: &Path, out: &mut Vec<PathBuf>) {
        for entry in std::fs::read_dir(dir).expect("read dir") {
            let path = entry.expect("dir entry").path();
            if path.is_dir() {
                walk(&path, root, out);
            } else if let Ok(relative) = path.strip_prefix(root) {
                out.push(relative.to_path_buf());
            }
        }
    }
    let mut out = Vec::new();
    walk(root, root, &mut out);
    out.sort();
    out
}
