//! # Design
//!
//! - Centralize application-level errors for bootstrap and dispatch.
//! - Keep error messages constant while carrying context fields for debugging.
//! - Every variant here is fatal; task-local failures never reach this type.

use thiserror::Error;

use crate::source::WatchError;

/// Result alias for application operations.
pub type AppResult<T> = Result<T, AppError>;

/// Exit status for invalid configuration.
pub const EXIT_VALIDATION: i32 = 2;
/// Exit status for failures after startup validation.
pub const EXIT_FAILURE: i32 = 3;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration was rejected.
    #[error("invalid configuration")]
    Config {
        /// Operation identifier.
        operation: &'static str,
        /// Source configuration error.
        source: ferry_config::ConfigError,
    },
    /// Telemetry operations failed.
    #[error("telemetry operation failed")]
    Telemetry {
        /// Operation identifier.
        operation: &'static str,
        /// Source telemetry error.
        source: ferry_telemetry::TelemetryError,
    },
    /// The change source failed.
    #[error("watch operation failed")]
    Watch {
        /// Operation identifier.
        operation: &'static str,
        /// Source watch error.
        source: WatchError,
    },
    /// Directory listing failed.
    #[error("directory scan failed")]
    FsOps {
        /// Operation identifier.
        operation: &'static str,
        /// Source fsops error.
        source: ferry_fsops::FsOpsError,
    },
    /// The uploader could not be constructed.
    #[error("upload setup failed")]
    Upload {
        /// Operation identifier.
        operation: &'static str,
        /// Source upload error.
        source: ferry_upload::UploadError,
    },
    /// A background task panicked or was cancelled.
    #[error("background task failed")]
    Task {
        /// Operation identifier.
        operation: &'static str,
        /// Source join error.
        source: tokio::task::JoinError,
    },
    /// The notification channel closed.
    #[error("change notifications stopped")]
    NotificationsClosed,
}

impl AppError {
    pub(crate) const fn config(
        operation: &'static str,
        source: ferry_config::ConfigError,
    ) -> Self {
        Self::Config { operation, source }
    }

    pub(crate) const fn telemetry(
        operation: &'static str,
        source: ferry_telemetry::TelemetryError,
    ) -> Self {
        Self::Telemetry { operation, source }
    }

    pub(crate) const fn watch(operation: &'static str, source: WatchError) -> Self {
        Self::Watch { operation, source }
    }

    pub(crate) const fn fsops(operation: &'static str, source: ferry_fsops::FsOpsError) -> Self {
        Self::FsOps { operation, source }
    }

    pub(crate) const fn upload(
        operation: &'static str,
        source: ferry_upload::UploadError,
    ) -> Self {
        Self::Upload { operation, source }
    }

    pub(crate) const fn task(operation: &'static str, source: tokio::task::JoinError) -> Self {
        Self::Task { operation, source }
    }

    /// Process exit status for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Config { .. } => EXIT_VALIDATION,
            _ => EXIT_FAILURE,
        }
    }
}
