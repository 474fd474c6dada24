//! Progress reporting
//!
//! Observers receive a [`ProgressEvent`] at the start and end of each phase.
//! Callbacks are synchronous and best-effort: a panicking observer is logged
//! and ignored, it never aborts the compilation.

use crate::phases::CompilationPhase;
use blueprint_spec::Diagnostic;
use serde::Serialize;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// One progress notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressEvent {
    pub phase: CompilationPhase,
    /// Percentage in `0..=100`
    pub progress: u8,
    pub message: String,
    /// Snapshot of errors accumulated so far
    pub errors: Vec<Diagnostic>,
    /// Snapshot of warnings accumulated so far
    pub warnings: Vec<Diagnostic>,
}

/// Progress observer
pub type ProgressCallback = Arc<dyn Fn(&ProgressEvent) + Send + Sync>;

/// Delivers events to an optional observer, keeping percentages monotonic
#[derive(Default)]
pub(crate) struct ProgressReporter {
    callback: Option<ProgressCallback>,
    last: u8,
}

impl ProgressReporter {
    pub(crate) fn new(callback: Option<ProgressCallback>) -> Self {
        Self { callback, last: 0 }
    }

    pub(crate) fn emit(&mut self, mut event: ProgressEvent) {
        event.progress = event.progress.clamp(self.last, 100);
        self.last = event.progress;
        tracing::debug!(phase = %event.phase, progress = event.progress, "{}", event.message);

        let Some(callback) = &self.callback else {
            return;
        };
        if catch_unwind(AssertUnwindSafe(|| callback(&event))).is_err() {
            tracing::warn!(phase = %event.phase, "progress callback panicked; ignoring");
        }
    }
}

impl std::fmt::Debug for ProgressReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressReporter")
            .field("callback", &self.callback.is_some())
            .field("last", &self.last)
            .finish()
    }
}
