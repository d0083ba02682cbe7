//! # Design
//!
//! - Provide structured, constant-message errors for matching and scanning.
//! - Capture operation context (paths, sources) to make failures reproducible in tests.
//! - Preserve source errors without interpolating context into error messages.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for filesystem operations.
pub type FsOpsResult<T> = Result<T, FsOpsError>;

/// Errors produced while inspecting or listing watched directories.
#[derive(Debug, Error)]
pub enum FsOpsError {
    /// IO failures while interacting with the filesystem.
    #[error("fsops io failure")]
    Io {
        /// Operation that triggered the IO failure.
        operation: &'static str,
        /// Path involved in the IO failure.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// Directory listing failures.
    #[error("fsops walkdir failure")]
    Walkdir {
        /// Operation that triggered the walkdir failure.
        operation: &'static str,
        /// Path involved in the walkdir failure.
        path: PathBuf,
        /// Underlying walkdir error.
        source: walkdir::Error,
    },
    /// The blocking listing task panicked or was cancelled.
    #[error("fsops blocking task failed")]
    Join {
        /// Operation that was running on the blocking pool.
        operation: &'static str,
        /// Path involved in the failed task.
        path: PathBuf,
        /// Underlying join error.
        source: tokio::task::JoinError,
    },
}

impl FsOpsError {
    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn walkdir(
        operation: &'static str,
        path: impl Into<PathBuf>,
        source: walkdir::Error,
    ) -> Self {
        Self::Walkdir {
            operation,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn join(
        operation: &'static str,
        path: impl Into<PathBuf>,
        source: tokio::task::JoinError,
    ) -> Self {
        Self::Join {
            operation,
            path: path.into(),
            source,
        }
    }

    /// Path the failing operation was working on.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::Io { path, .. } | Self::Walkdir { path, .. } | Self::Join { path, .. } => path,
        }
    }
}
