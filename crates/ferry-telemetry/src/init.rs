//! Telemetry initialisation primitives and logging configuration.
//!
//! # Design
//! - Centralises logging setup (fmt or JSON) with a single entry point.
//! - The level is an explicit value chosen at startup; there is no global level
//!   variable for components to consult.
//! - `RUST_LOG` overrides the computed filter when present.

use std::str::FromStr;

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::{Result, TelemetryError};

/// Crate targets whose events follow the configured level. Everything else
/// (HTTP stack, watcher backend) stays at `error`.
const FERRY_TARGETS: &[&str] = &[
    "ferry",
    "ferry_app",
    "ferry_config",
    "ferry_events",
    "ferry_fsops",
    "ferry_telemetry",
    "ferry_upload",
];

static BUILD_SHA: OnceCell<String> = OnceCell::new();

/// Verbosity levels understood by the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Per-file handling detail.
    Debug,
    /// Successful removals and lifecycle messages.
    Info,
    /// Failures only.
    Error,
}

impl LogLevel {
    /// Map the `-v` flag onto a level: verbose runs log everything, quiet runs
    /// only report errors.
    #[must_use]
    pub const fn from_verbose(verbose: bool) -> Self {
        if verbose { Self::Debug } else { Self::Error }
    }

    /// Directive string understood by `EnvFilter`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Error => "error",
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LoggingConfig<'a> {
    /// Level applied to ferry targets.
    pub level: LogLevel,
    /// Output format selection for the tracing subscriber.
    pub format: LogFormat,
    /// Build identifier recorded on the process span.
    pub build_sha: &'a str,
}

impl Default for LoggingConfig<'_> {
    fn default() -> Self {
        Self {
            level: LogLevel::Error,
            format: LogFormat::infer(),
            build_sha: build_sha(),
        }
    }
}

/// Available output formats for the logger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Emit logs as structured JSON objects.
    Json,
    /// Emit human-readable lines.
    Pretty,
}

impl LogFormat {
    /// Choose a sensible default for the current build.
    #[must_use]
    pub const fn infer() -> Self {
        if cfg!(debug_assertions) {
            Self::Pretty
        } else {
            Self::Json
        }
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            other => Err(format!("unknown log format '{other}' (expected json or pretty)")),
        }
    }
}

/// Access the build SHA recorded during logging initialisation.
#[must_use]
pub fn build_sha() -> &'static str {
    BUILD_SHA.get().map_or("dev", String::as_str)
}

/// Configure and install the global tracing subscriber.
///
/// Events are written to standard error.
///
/// # Errors
///
/// Returns an error if the filter cannot be built or a subscriber has already
/// been installed globally.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    BUILD_SHA
        .set(config.build_sha.to_string())
        .ok()
        .or(Some(()));

    let filter = build_env_filter(config.level)?;
    let installed = match config.format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .with_thread_ids(false),
            )
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .with_thread_ids(false),
            )
            .try_init(),
    };

    installed.map_err(|source| TelemetryError::SubscriberInstall { source })
}

fn filter_directives(level: LogLevel) -> String {
    let mut directives = String::from(LogLevel::Error.as_str());
    for target in FERRY_TARGETS {
        directives.push(',');
        directives.push_str(target);
        directives.push('=');
        directives.push_str(level.as_str());
    }
    directives
}

fn build_env_filter(level: LogLevel) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    let directives = filter_directives(level);
    EnvFilter::try_new(&directives).map_err(|source| TelemetryError::FilterDirective {
        directive: directives,
        source,
    })
}
