//! # Design
//!
//! - Constant-message errors for the upload pipeline with path and operation context.
//! - Errors are `Send + Sync` so the body producer can push them through the request stream.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result alias for upload operations.
pub type UploadResult<T> = Result<T, UploadError>;

/// Errors raised while preparing or streaming an upload.
#[derive(Debug, Error)]
pub enum UploadError {
    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client")]
    ClientBuild {
        /// Underlying reqwest error.
        source: reqwest::Error,
    },
    /// IO failures while reading or removing the source file.
    #[error("upload io failure")]
    Io {
        /// Operation that triggered the failure.
        operation: &'static str,
        /// File involved in the failure.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// The request stream was cut short because the body producer failed.
    #[error("upload body interrupted")]
    BodyInterrupted,
    /// The HTTP stack stopped consuming the body before it was complete.
    #[error("upload body abandoned by transport")]
    BodyAbandoned,
    /// The body producer task panicked or was cancelled.
    #[error("upload body producer failed")]
    Producer {
        /// Underlying join error.
        source: tokio::task::JoinError,
    },
    /// The request did not produce a response.
    #[error("upload request failed")]
    Transport {
        /// Underlying reqwest error.
        source: reqwest::Error,
    },
}

impl UploadError {
    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }
}

/// Render an error followed by each of its sources, separated by `: `.
#[must_use]
pub fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut rendered = err.to_string();
    let mut current = err.source();
    while let Some(source) = current {
        rendered.push_str(": ");
        rendered.push_str(&source.to_string());
        current = source.source();
    }
    rendered
}
