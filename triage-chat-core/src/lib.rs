//! Core types and session state for triage-chat
//!
//! This crate provides the message model shared by every other component,
//! the persisted session store, configuration loading and logging setup.

pub mod config;
pub mod error;
pub mod logging;
pub mod session;
pub mod utils;

pub use error::{Error, Result};
