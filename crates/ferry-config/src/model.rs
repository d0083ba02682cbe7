//! Typed agent configuration.
//!
//! # Design
//! - `AgentConfig` is built once before the event loop starts and never mutated.
//! - The builder performs all validation so holders of an `AgentConfig` can
//!   assume the destination and include pattern are usable.

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::defaults::{DEFAULT_INCLUDE_PATTERN, DEFAULT_WATCH_DIR};
use crate::error::{ConfigError, ConfigResult};
use crate::validate::{IncludePattern, parse_destination};

/// Behaviour when the in-flight upload cap is reached.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OverflowPolicy {
    /// Spawn the task anyway and let it wait for a free slot.
    #[default]
    Wait,
    /// Drop the notification and log it.
    Reject,
}

impl OverflowPolicy {
    /// Render the policy as its lowercase string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Wait => "wait",
            Self::Reject => "reject",
        }
    }
}

impl FromStr for OverflowPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "wait" => Ok(Self::Wait),
            "reject" => Ok(Self::Reject),
            other => Err(ConfigError::InvalidField {
                field: "overflow",
                reason: "unknown_policy",
                value: Some(other.to_string()),
            }),
        }
    }
}

/// Admission limits for concurrently running uploads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UploadLimits {
    /// Maximum number of uploads allowed to run at once; `None` means unbounded.
    pub max_in_flight: Option<NonZeroUsize>,
    /// What to do with a notification once `max_in_flight` uploads are running.
    pub overflow: OverflowPolicy,
}

/// Immutable process-wide configuration.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Endpoint receiving the multipart POST for each file.
    pub destination: Url,
    /// Glob applied to file base names.
    pub include: IncludePattern,
    /// Directories registered with the change source.
    pub watch_dirs: Vec<PathBuf>,
    /// Keep files after a successful upload instead of deleting them.
    pub keep_files: bool,
    /// Enumerate each watch directory once at startup.
    pub initial_scan: bool,
    /// Emit debug-level diagnostics.
    pub verbose: bool,
    /// Admission limits for the dispatcher.
    pub limits: UploadLimits,
    /// Optional timeout applied to each upload request.
    pub request_timeout: Option<Duration>,
}

impl AgentConfig {
    /// Start building a configuration for the given destination URL.
    #[must_use]
    pub fn builder(destination: impl Into<String>) -> AgentConfigBuilder {
        AgentConfigBuilder::new(destination)
    }
}

/// Builder that validates inputs before producing an [`AgentConfig`].
#[derive(Debug, Clone)]
pub struct AgentConfigBuilder {
    destination: String,
    include: String,
    watch_dirs: Vec<PathBuf>,
    keep_files: bool,
    initial_scan: bool,
    verbose: bool,
    limits: UploadLimits,
    request_timeout: Option<Duration>,
}

impl AgentConfigBuilder {
    fn new(destination: impl Into<String>) -> Self {
        Self {
            destination: destination.into(),
            include: DEFAULT_INCLUDE_PATTERN.to_string(),
            watch_dirs: Vec::new(),
            keep_files: false,
            initial_scan: true,
            verbose: false,
            limits: UploadLimits::default(),
            request_timeout: None,
        }
    }

    /// Set the include glob.
    #[must_use]
    pub fn include(mut self, pattern: impl Into<String>) -> Self {
        self.include = pattern.into();
        self
    }

    /// Add a directory to watch.
    #[must_use]
    pub fn watch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.watch_dirs.push(dir.into());
        self
    }

    /// Replace the watch directory list.
    #[must_use]
    pub fn watch_dirs<I, P>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.watch_dirs = dirs.into_iter().map(Into::into).collect();
        self
    }

    /// Keep files after successful uploads.
    #[must_use]
    pub const fn keep_files(mut self, keep: bool) -> Self {
        self.keep_files = keep;
        self
    }

    /// Enable or disable the initial directory scan.
    #[must_use]
    pub const fn initial_scan(mut self, scan: bool) -> Self {
        self.initial_scan = scan;
        self
    }

    /// Enable debug-level diagnostics.
    #[must_use]
    pub const fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Set the admission limits.
    #[must_use]
    pub const fn limits(mut self, limits: UploadLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Set a per-request timeout.
    #[must_use]
    pub const fn request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Validate the collected values.
    ///
    /// # Errors
    ///
    /// Fails when the include pattern does not compile, the destination is not
    /// an `http(s)` URL, or the request timeout is zero.
    pub fn build(self) -> ConfigResult<AgentConfig> {
        let include = IncludePattern::new(&self.include)?;
        let destination = parse_destination(&self.destination)?;

        if self.request_timeout.is_some_and(|timeout| timeout.is_zero()) {
            return Err(ConfigError::InvalidField {
                field: "request_timeout",
                reason: "zero",
                value: Some("0".to_string()),
            });
        }

        let watch_dirs = if self.watch_dirs.is_empty() {
            vec![PathBuf::from(DEFAULT_WATCH_DIR)]
        } else {
            self.watch_dirs
        };

        Ok(AgentConfig {
            destination,
            include,
            watch_dirs,
            keep_files: self.keep_files,
            initial_scan: self.initial_scan,
            verbose: self.verbose,
            limits: self.limits,
            request_timeout: self.request_timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_applies_defaults() -> ConfigResult<()> {
        let config = AgentConfig::builder("http://localhost:9000/ingest").build()?;
        assert_eq!(config.include.as_str(), "*");
        assert_eq!(config.watch_dirs, vec![PathBuf::from(".")]);
        assert!(!config.keep_files);
        assert!(config.initial_scan);
        assert!(!config.verbose);
        assert_eq!(config.limits, UploadLimits::default());
        assert!(config.request_timeout.is_none());
        Ok(())
    }

    #[test]
    fn builder_validates_pattern_before_url() {
        let err = AgentConfig::builder("ftp://nope")
            .include("[")
            .build()
            .expect_err("pattern error expected");
        assert!(matches!(err, ConfigError::InvalidPattern { .. }));
    }

    #[test]
    fn builder_rejects_zero_timeout() {
        let err = AgentConfig::builder("http://localhost")
            .request_timeout(Some(Duration::ZERO))
            .build()
            .expect_err("zero timeout rejected");
        assert!(matches!(
            err,
            ConfigError::InvalidField {
                field: "request_timeout",
                ..
            }
        ));
    }

    #[test]
    fn overflow_policy_parses_known_values() {
        assert_eq!("wait".parse::<OverflowPolicy>().ok(), Some(OverflowPolicy::Wait));
        assert_eq!(
            "reject".parse::<OverflowPolicy>().ok(),
            Some(OverflowPolicy::Reject)
        );
        assert!("drop-oldest".parse::<OverflowPolicy>().is_err());
        assert_eq!(OverflowPolicy::Reject.as_str(), "reject");
    }
}
