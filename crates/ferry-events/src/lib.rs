#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    unreachable_pub,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Diagnostics event bus for the ferry agent.
//!
//! Components receive an [`EventBus`] handle at construction and publish a
//! typed [`Event`] for every upload outcome, so callers and tests can observe
//! what happened to each file without scraping logs.

pub mod bus;
pub mod payloads;

pub use bus::{EventBus, EventStream};
pub use payloads::{DEFAULT_CHANNEL_CAPACITY, Event, EventEnvelope, EventId, FailureStage};
