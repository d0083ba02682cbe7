#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    unreachable_pub,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Logging primitives shared across the ferry workspace.
//!
//! Layout: `init.rs` (subscriber installation and level selection),
//! `context.rs` (process and per-upload spans), `error.rs` (error type).

pub mod context;
pub mod error;
pub mod init;

pub use context::{GlobalContextGuard, upload_span};
pub use error::{Result, TelemetryError};
pub use init::{LogFormat, LogLevel, LoggingConfig, build_sha, init_logging};
