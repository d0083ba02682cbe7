#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    unreachable_pub,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Streaming multipart uploads for the ferry agent.
//!
//! Each upload reads the source file once: bytes flow through a SHA-1
//! accumulator and straight into the request body, and the digest is sent as
//! a trailing form field. On a status below 400 the file is deleted unless
//! keep-files is set.
//!
//! Layout: `multipart.rs` (framing), `body.rs` (producer task),
//! `uploader.rs` (request and keep/delete policy), `outcome.rs`,
//! `error.rs`.

pub mod body;
pub mod error;
pub mod multipart;
pub mod outcome;
pub mod uploader;

pub use body::{BodyProducer, BodySource, spawn_body_producer};
pub use error::{UploadError, UploadResult, error_chain};
pub use multipart::{MultipartEncoder, generate_boundary};
pub use outcome::{Disposition, EXCERPT_LIMIT, UploadOutcome};
pub use uploader::{Uploader, clean_path, is_success};
