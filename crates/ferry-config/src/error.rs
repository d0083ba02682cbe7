//! Error types for configuration operations.
//!
//! # Design
//! - Messages stay constant; offending inputs travel in context fields.
//! - Source errors are preserved so the binary can print the full chain.

use thiserror::Error;

/// Result alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Primary error type for configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Destination URL could not be parsed.
    #[error("invalid destination url")]
    InvalidUrl {
        /// Raw value supplied by the operator.
        value: String,
        /// Underlying URL parse error.
        source: url::ParseError,
    },
    /// Destination URL used a scheme other than `http` or `https`.
    #[error("destination url must use http or https")]
    UnsupportedScheme {
        /// Raw value supplied by the operator.
        value: String,
        /// Scheme found in the parsed URL.
        scheme: String,
    },
    /// Include pattern failed to compile.
    #[error("invalid include pattern")]
    InvalidPattern {
        /// Pattern supplied by the operator.
        pattern: String,
        /// Underlying globset error.
        source: globset::Error,
    },
    /// Field contained an invalid value.
    #[error("invalid configuration field")]
    InvalidField {
        /// Field that failed validation.
        field: &'static str,
        /// Machine-readable reason for the failure.
        reason: &'static str,
        /// Offending value when available.
        value: Option<String>,
    },
}
