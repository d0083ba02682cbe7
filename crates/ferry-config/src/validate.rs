//! Validation helpers for operator-supplied settings.

use std::ffi::OsStr;
use std::fmt;

use globset::{GlobBuilder, GlobMatcher};
use url::Url;

use crate::error::{ConfigError, ConfigResult};

/// Parse the destination URL, accepting only `http` and `https` schemes.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidUrl`] when the value does not parse and
/// [`ConfigError::UnsupportedScheme`] for any other scheme.
pub fn parse_destination(input: &str) -> ConfigResult<Url> {
    let url = Url::parse(input).map_err(|source| ConfigError::InvalidUrl {
        value: input.to_string(),
        source,
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::UnsupportedScheme {
            value: input.to_string(),
            scheme: other.to_string(),
        }),
    }
}

/// Compiled include glob applied to file base names.
///
/// The pattern is compiled once at startup. `*` and `?` never match a path
/// separator, and a backslash escapes the following character.
#[derive(Clone)]
pub struct IncludePattern {
    raw: String,
    matcher: GlobMatcher,
}

impl IncludePattern {
    /// Compile `pattern` into a matcher.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidPattern`] when the glob is malformed.
    pub fn new(pattern: &str) -> ConfigResult<Self> {
        let glob = GlobBuilder::new(pattern)
            .literal_separator(true)
            .backslash_escape(true)
            .build()
            .map_err(|source| ConfigError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })?;

        Ok(Self {
            raw: pattern.to_string(),
            matcher: glob.compile_matcher(),
        })
    }

    /// Test a base name against the pattern.
    #[must_use]
    pub fn is_match(&self, name: &OsStr) -> bool {
        self.matcher.is_match(name)
    }

    /// The pattern as supplied by the operator.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Debug for IncludePattern {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_tuple("IncludePattern")
            .field(&self.raw)
            .finish()
    }
}
