//! Span helpers for the process and for individual uploads.
//!
//! # Design
//! - The process span carries mode and build info for the lifetime of the agent.
//! - Each upload task runs inside its own span keyed by a task identifier, so
//!   interleaved log lines from concurrent uploads stay attributable.

use std::fmt::Display;
use std::path::Path;

use tracing::{Span, span::Entered};

use crate::init::build_sha;

/// Guard that keeps the application-level span entered for the lifetime of the process.
pub struct GlobalContextGuard {
    _guard: Entered<'static>,
}

impl GlobalContextGuard {
    /// Enter the application-level tracing span for the lifetime of the guard.
    #[must_use]
    pub fn new(mode: impl Into<String>) -> Self {
        let mode = mode.into();
        let span: &'static Span = Box::leak(Box::new(
            tracing::info_span!("agent", mode = %mode, build_sha = %build_sha()),
        ));
        let guard = span.enter();
        Self { _guard: guard }
    }
}

/// Span wrapping a single check-and-upload task.
#[must_use]
pub fn upload_span(task_id: impl Display, path: &Path) -> Span {
    tracing::info_span!("upload", task_id = %task_id, path = %path.display())
}
