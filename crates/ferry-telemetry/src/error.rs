//! Error types for telemetry operations.

use std::error::Error;
use std::fmt::{self, Display, Formatter};

/// Result alias for telemetry operations.
pub type Result<T> = std::result::Result<T, TelemetryError>;

/// Errors raised by telemetry helpers.
#[derive(Debug)]
pub enum TelemetryError {
    /// Installing the tracing subscriber failed.
    SubscriberInstall {
        /// Underlying tracing subscriber error.
        source: tracing_subscriber::util::TryInitError,
    },
    /// A filter directive could not be parsed.
    FilterDirective {
        /// Directive that failed to parse.
        directive: String,
        /// Underlying directive parse error.
        source: tracing_subscriber::filter::ParseError,
    },
}

impl Display for TelemetryError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::SubscriberInstall { .. } => {
                formatter.write_str("failed to install tracing subscriber")
            }
            Self::FilterDirective { .. } => formatter.write_str("invalid log filter directive"),
        }
    }
}

impl Error for TelemetryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::SubscriberInstall { source } => Some(source),
            Self::FilterDirective { source, .. } => Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::util::SubscriberInitExt;

    fn try_init_error()
    -> std::result::Result<tracing_subscriber::util::TryInitError, Box<dyn Error>> {
        match tracing_subscriber::registry().try_init() {
            Ok(()) => match tracing_subscriber::registry().try_init() {
                Ok(()) => Err(io::Error::other("expected init error").into()),
                Err(err) => Ok(err),
            },
            Err(err) => Ok(err),
        }
    }

    #[test]
    fn telemetry_error_display_and_source() -> std::result::Result<(), Box<dyn Error>> {
        let init_error = try_init_error()?;
        let parse_error = EnvFilter::try_new("ferry=notalevel")
            .err()
            .ok_or_else(|| io::Error::other("expected directive error"))?;
        let cases = vec![
            (
                TelemetryError::SubscriberInstall { source: init_error },
                "failed to install tracing subscriber",
            ),
            (
                TelemetryError::FilterDirective {
                    directive: "ferry=notalevel".to_string(),
                    source: parse_error,
                },
                "invalid log filter directive",
            ),
        ];

        for (err, message) in cases {
            assert_eq!(err.to_string(), message);
            assert!(err.source().is_some());
        }
        Ok(())
    }
}
