#![warn(
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

//! Turn handling for the Context7 assistant.
//!
//! `Context7Agent` turns one utterance into one persisted turn: it reads the
//! conversation's prior turns, asks a `Synthesizer` for exactly one answer
//! and commits `(message, answer)` to the history store only on success.
//!
//! `ToolAgent` is the production `Synthesizer`. It lets the completion model
//! call knowledge-base tools for a bounded number of rounds before answering.

mod manager;
mod synthesizer;
mod turn;

pub use manager::{Context7Agent, ConversationError};
pub use synthesizer::{DEFAULT_MAX_TOOL_ROUNDS, SynthesisError, ToolAgent};
pub use turn::TurnState;
