#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    unreachable_pub,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Filesystem side of the ferry agent: deciding which paths are eligible for
//! upload and enumerating watched directories at startup.
//!
//! Layout: `matcher.rs` (eligibility), `scanner.rs` (initial scan),
//! `error.rs` (error types).

pub mod error;
pub mod matcher;
pub mod scanner;

pub use error::{FsOpsError, FsOpsResult};
pub use matcher::{FileMatcher, MatchDecision};
pub use scanner::{list_entries, scan_directory};
