//! Command-line surface of the `ferry` binary.

use std::ffi::OsString;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use ferry_config::{
    AgentConfig, ConfigResult, DEFAULT_INCLUDE_PATTERN, OverflowPolicy, UploadLimits,
};
use ferry_telemetry::{LogFormat, LogLevel, LoggingConfig, build_sha};

/// Watch directories and stream completed files to an HTTP endpoint.
#[derive(Debug, Parser)]
#[command(
    name = "ferry",
    version,
    about = "Watch directories and POST completed files to an HTTP endpoint"
)]
pub struct Cli {
    /// Destination receiving a multipart POST per file (http or https).
    #[arg(value_name = "POST_URL")]
    pub post_url: String,

    /// Directories to watch (default: current directory).
    #[arg(value_name = "WATCH_DIRS")]
    pub watch_dirs: Vec<PathBuf>,

    /// Glob applied to file base names.
    #[arg(
        short = 'i',
        long = "include",
        env = "FERRY_INCLUDE",
        default_value = DEFAULT_INCLUDE_PATTERN,
        value_name = "PATTERN"
    )]
    pub include: String,

    /// Keep files after a successful upload.
    #[arg(short = 'k', long = "keep")]
    pub keep: bool,

    /// Skip the initial scan of watch directories.
    #[arg(long = "ns", visible_alias = "no-scan")]
    pub no_scan: bool,

    /// Log per-file detail.
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Maximum number of uploads running at once (default: unbounded).
    #[arg(long = "max-in-flight", value_name = "N")]
    pub max_in_flight: Option<NonZeroUsize>,

    /// What to do with notifications once the in-flight cap is reached.
    #[arg(long = "overflow", value_name = "wait|reject", default_value = "wait")]
    pub overflow: OverflowPolicy,

    /// Per-request timeout in seconds (default: none).
    #[arg(long = "timeout", value_name = "SECS")]
    pub timeout_secs: Option<u64>,

    /// Log output format.
    #[arg(long = "log-format", value_name = "pretty|json")]
    pub log_format: Option<LogFormat>,
}

impl Cli {
    /// Parse the process arguments, accepting the single-dash `-ns` spelling.
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse_from(normalize_legacy_flags(std::env::args_os()))
    }

    /// Validate the arguments into an immutable configuration.
    ///
    /// # Errors
    ///
    /// Fails when the include pattern does not compile, the URL is not
    /// `http(s)`, or the timeout is zero.
    pub fn into_config(self) -> ConfigResult<AgentConfig> {
        AgentConfig::builder(self.post_url)
            .include(self.include)
            .watch_dirs(self.watch_dirs)
            .keep_files(self.keep)
            .initial_scan(!self.no_scan)
            .verbose(self.verbose)
            .limits(UploadLimits {
                max_in_flight: self.max_in_flight,
                overflow: self.overflow,
            })
            .request_timeout(self.timeout_secs.map(Duration::from_secs))
            .build()
    }

    /// Logging settings implied by the flags.
    #[must_use]
    pub fn logging(&self) -> LoggingConfig<'static> {
        LoggingConfig {
            level: LogLevel::from_verbose(self.verbose),
            format: self.log_format.unwrap_or(LogFormat::Pretty),
            build_sha: build_sha(),
        }
    }
}

/// Rewrite `-ns` to `--ns` so clap accepts the historical spelling.
///
/// Arguments after `--` are left alone.
pub fn normalize_legacy_flags<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut positional_only = false;
    args.into_iter()
        .map(Into::into)
        .map(|arg| {
            if positional_only {
                return arg;
            }
            if arg == "--" {
                positional_only = true;
                arg
            } else if arg == "-ns" {
                OsString::from("--ns")
            } else {
                arg
            }
        })
        .collect()
}
