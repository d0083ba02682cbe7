#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    unreachable_pub,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Immutable agent configuration shared by every ferry component.
//!
//! Layout: `model.rs` (the `AgentConfig` value and its builder), `validate.rs`
//! (URL and include-pattern validation), `defaults.rs` (fallback values).

mod defaults;
pub mod error;
pub mod model;
pub mod validate;

pub use defaults::{DEFAULT_INCLUDE_PATTERN, DEFAULT_WATCH_DIR};
pub use error::{ConfigError, ConfigResult};
pub use model::{AgentConfig, AgentConfigBuilder, OverflowPolicy, UploadLimits};
pub use validate::{IncludePattern, parse_destination};
