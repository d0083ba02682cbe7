//! Fallback values applied when the operator leaves a setting unspecified.

/// Include pattern used when `-i` is not supplied; accepts every visible file.
pub const DEFAULT_INCLUDE_PATTERN: &str = "*";
/// Directory watched when no watch directories are listed.
pub const DEFAULT_WATCH_DIR: &str = ".";
