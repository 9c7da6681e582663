//! Session store: the single owner of the conversation and its persisted mirror

use tracing::{debug, info, warn};

use super::medium::SessionMedium;
use super::message::{Message, Session};
use super::reconcile::{decode_session, encode_session};

/// Owns one in-memory session plus its persisted mirror.
///
/// Every mutation persists immediately. Persistence failures are returned to
/// the caller, but the in-memory session stays authoritative either way.
#[derive(Debug)]
pub struct SessionStore {
    medium: Box<dyn SessionMedium>,
    session: Session,
}

impl SessionStore {
    /// Create a store with an empty session, without reading the medium
    pub fn new(medium: impl SessionMedium + 'static) -> Self {
        Self {
            medium: Box::new(medium),
            session: Session::new(),
        }
    }

    /// Create a store and load whatever the medium holds.
    ///
    /// A medium read failure leaves the session empty and is logged.
    pub fn open(medium: impl SessionMedium + 'static) -> Self {
        let mut store = Self::new(medium);
        if let Err(e) = store.load() {
            warn!("Failed to read persisted session, starting empty: {}", e);
        }
        store
    }

    /// Replace the in-memory session with the reconciled persisted one.
    ///
    /// An absent or malformed value yields an empty session and is not an
    /// error; only a failure to read the medium is reported.
    pub fn load(&mut self) -> crate::Result<()> {
        self.session.clear();
        let Some(raw) = self.medium.read()? else {
            debug!("No persisted session found");
            return Ok(());
        };

        if let Some(session) = decode_session(&raw) {
            self.session = session;
        }
        info!("Loaded session with {} messages", self.session.len());
        Ok(())
    }

    /// Append a message and persist.
    ///
    /// The message is kept in memory even when persisting fails.
    pub fn append(&mut self, message: Message) -> crate::Result<()> {
        self.session.push(message);
        self.persist()
    }

    /// Clear the session and delete its persisted value
    pub fn reset(&mut self) -> crate::Result<()> {
        self.session.clear();
        info!("Session reset");
        self.medium.remove()
    }

    /// Write the whole session to the medium
    pub fn persist(&self) -> crate::Result<()> {
        let encoded = encode_session(&self.session)?;
        self.medium.write(&encoded)?;
        debug!("Persisted {} messages", self.session.len());
        Ok(())
    }

    /// Read-only view of the session
    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn messages(&self) -> &[Message] {
        self.session.messages()
    }

    pub fn len(&self) -> usize {
        self.session.len()
    }

    pub fn is_empty(&self) -> bool {
        self.session.is_empty()
    }
}
