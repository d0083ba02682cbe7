//! Eligibility checks applied to every candidate path.

use std::ffi::OsStr;
use std::fs;
use std::path::Path;

use ferry_config::IncludePattern;
use tracing::{debug, error};

use crate::error::{FsOpsError, FsOpsResult};

/// Why a path was or was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchDecision {
    /// The path is a regular, visible file whose name matches the pattern.
    Accepted,
    /// The path has no final component (for example `/`).
    NoBaseName,
    /// The base name starts with `.`.
    Hidden,
    /// The base name does not match the include pattern.
    PatternMismatch,
    /// The path refers to a directory.
    Directory,
}

impl MatchDecision {
    /// Whether the decision admits the path for upload.
    #[must_use]
    pub const fn is_accepted(self) -> bool {
        matches!(self, Self::Accepted)
    }

    /// Short label used in log fields.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Accepted => "accepted",
            Self::NoBaseName => "no_base_name",
            Self::Hidden => "hidden",
            Self::PatternMismatch => "pattern_mismatch",
            Self::Directory => "directory",
        }
    }
}

/// Decides whether a path is eligible for upload.
///
/// Name checks run before the filesystem is touched, so hidden files and
/// non-matching names never cost a `stat`.
#[derive(Debug, Clone)]
pub struct FileMatcher {
    include: IncludePattern,
}

impl FileMatcher {
    /// Build a matcher around an already compiled include pattern.
    #[must_use]
    pub const fn new(include: IncludePattern) -> Self {
        Self { include }
    }

    /// Pattern applied to base names.
    #[must_use]
    pub const fn include(&self) -> &IncludePattern {
        &self.include
    }

    /// Classify `path`.
    ///
    /// # Errors
    ///
    /// Returns [`FsOpsError::Io`] when the path passes the name checks but its
    /// metadata cannot be read.
    pub fn evaluate(&self, path: &Path) -> FsOpsResult<MatchDecision> {
        let Some(base) = path.file_name() else {
            return Ok(MatchDecision::NoBaseName);
        };
        if is_hidden(base) {
            return Ok(MatchDecision::Hidden);
        }
        if !self.include.is_match(base) {
            return Ok(MatchDecision::PatternMismatch);
        }

        let metadata = fs::metadata(path).map_err(|source| FsOpsError::io("stat", path, source))?;
        if metadata.is_dir() {
            return Ok(MatchDecision::Directory);
        }
        Ok(MatchDecision::Accepted)
    }

    /// Return `true` only for accepted paths. Stat failures are logged and
    /// treated as a non-match.
    #[must_use]
    pub fn matches(&self, path: &Path) -> bool {
        match self.evaluate(path) {
            Ok(decision) => {
                debug!(
                    path = %path.display(),
                    decision = decision.as_str(),
                    "evaluated candidate"
                );
                decision.is_accepted()
            }
            Err(err) => {
                let cause = std::error::Error::source(&err).map(ToString::to_string);
                error!(path = %path.display(), error = %err, cause = ?cause, "stat failed");
                false
            }
        }
    }
}

fn is_hidden(base: &OsStr) -> bool {
    base.as_encoded_bytes().first() == Some(&b'.')
}
