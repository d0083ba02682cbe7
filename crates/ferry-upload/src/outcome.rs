//! Terminal states of a single upload task.

use reqwest::StatusCode;

/// Maximum number of response body bytes kept for a rejected upload.
pub const EXCERPT_LIMIT: usize = 1024;

/// What happened to the source file after a successful upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Keep-files is set; the file was left in place.
    Kept,
    /// The file was deleted.
    Removed,
    /// Deletion was attempted and failed; the file may remain.
    RemoveFailed,
}

/// Result of one check-and-upload task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// The destination answered with a status below 400.
    Delivered {
        /// Status returned by the destination.
        status: StatusCode,
        /// Lowercase hex SHA-1 of the uploaded content.
        sha1: String,
        /// What happened to the source file.
        disposition: Disposition,
    },
    /// The destination answered with status 400 or above. The file is retained.
    Rejected {
        /// Status returned by the destination.
        status: StatusCode,
        /// Up to [`EXCERPT_LIMIT`] bytes of the response body.
        excerpt: String,
    },
    /// No response was obtained. The file is retained.
    TransportFailed {
        /// Error detail including its source chain.
        message: String,
    },
    /// The source file could not be opened. No request was made.
    OpenFailed {
        /// Error detail including its source chain.
        message: String,
    },
}

impl UploadOutcome {
    /// Whether the destination accepted the upload.
    #[must_use]
    pub const fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered { .. })
    }

    /// Whether the source file was deleted by this task.
    #[must_use]
    pub const fn removed_file(&self) -> bool {
        matches!(
            self,
            Self::Delivered {
                disposition: Disposition::Removed,
                ..
            }
        )
    }

    /// HTTP status, when a response was received.
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Delivered { status, .. } | Self::Rejected { status, .. } => Some(*status),
            Self::TransportFailed { .. } | Self::OpenFailed { .. } => None,
        }
    }
}
