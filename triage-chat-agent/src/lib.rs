//! Conversation logic for triage-chat
//!
//! This crate turns one user input into one normalized assistant message:
//! it bounds the context sent to the model, classifies the model's raw reply
//! and records both sides of the turn in the session store.

pub mod context;
pub mod markup;
pub mod normalizer;
pub mod tags;
pub mod turn;

pub use context::{ContextBuilder, ContextEntry, ContextWindow, DEFAULT_CONTEXT_LIMIT};
pub use markup::{MarkdownFormatter, MarkupFormatter};
pub use normalizer::{ResponseNormalizer, APOLOGY_TEXT};
pub use tags::extract_tags;
pub use turn::{TurnHandler, TurnOutcome, GENERIC_ERROR};
