//! Conversation session state
//!
//! Messages are held in memory by a [`SessionStore`] and mirrored to a
//! [`SessionMedium`] as a JSON array of compact records after every
//! mutation.

pub mod medium;
pub mod message;
pub mod reconcile;
pub mod store;

pub use medium::{FileMedium, MemoryMedium, SessionMedium};
pub use message::{Body, Message, Possibility, Risk, Role, Session, StructuredResponse};
pub use reconcile::{decode_session, encode_session};
pub use store::SessionStore;
