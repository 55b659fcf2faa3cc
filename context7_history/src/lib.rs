#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

//! Durable, multi-conversation turn history.
//!
//! The whole mapping lives in memory behind one lock and is rewritten to a
//! single JSON file on every mutation:
//!
//! ```json
//! {
//!   "default": [
//!     { "user": "What is X?", "assistant": "X is ...", "timestamp": "2026-01-01T00:00:00Z" }
//!   ]
//! }
//! ```

mod error;
mod store;

pub use error::{HistoryError, Result};
pub use store::{History, HistoryStore, PREVIEW_CHARS};
