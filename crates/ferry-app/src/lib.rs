#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    unreachable_pub,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! ferry agent wiring.
//!
//! Layout: `cli.rs` (arguments), `bootstrap.rs` (process wiring),
//! `source.rs` (change notifications), `dispatcher.rs` (event loop),
//! `limiter.rs` (admission control), `error.rs`.

/// Process wiring.
pub mod bootstrap;
/// Command-line arguments.
pub mod cli;
/// Notification loop and check-and-upload pipeline.
pub mod dispatcher;
/// Application errors and exit codes.
pub mod error;
/// In-flight upload cap.
pub mod limiter;
/// Change notification sources.
pub mod source;

pub use bootstrap::{BootstrapDependencies, run_app, run_app_with};
pub use cli::Cli;
pub use dispatcher::{Dispatcher, Pipeline};
pub use error::{AppError, AppResult};
pub use limiter::{Admission, UploadLimiter};
pub use source::{ChangeSource, Notification, NotifySource, WatchError};
