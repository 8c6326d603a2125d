use std::sync::Arc;

use parking_lot::Mutex;

use super::error::SessionError;
use super::record::SessionData;
use super::storage::{MemoryStorage, SessionStorage};
use crate::clock::{Clock, SystemClock};

/// Owner of the single live session.
///
/// Cheap to clone; clones share the same storage, clock and lock.
#[derive(Clone)]
pub struct SessionStore {
    storage: Arc<dyn SessionStorage>,
    clock: Arc<dyn Clock>,
    // load() may remove an expired record; without this a save() landing
    // between its read and its remove would be erased.
    guard: Arc<Mutex<()>>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    #[must_use]
    pub fn new(storage: impl SessionStorage) -> Self {
        Self {
            storage: Arc::new(storage),
            clock: Arc::new(SystemClock),
            guard: Arc::new(Mutex::new(())),
        }
    }

    /// Store backed by process memory only.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(MemoryStorage::new())
    }

    /// Use a custom clock (for tests or simulations).
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub(crate) fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Read the current session.
    ///
    /// An expired, undecodable or otherwise invalid record (one `save` would
    /// have refused) is removed and reported as absent.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Storage`] if the storage cannot be read or the
    /// stale record cannot be removed.
    pub fn load(&self) -> Result<Option<SessionData>, SessionError> {
        let _guard = self.guard.lock();

        let session = match self.storage.read() {
            Ok(Some(session)) => session,
            Ok(None) => return Ok(None),
            Err(SessionError::Corrupt(detail)) => {
                tracing::warn!(error = %detail, "Discarding corrupt session record");
                self.storage.remove()?;
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let now_ms = self.clock.now_ms();
        if session.is_expired_at(now_ms) {
            tracing::info!(
                user_id = %session.user_id,
                expires_at = session.expires_at,
                "Session expired, clearing"
            );
            self.storage.remove()?;
            return Ok(None);
        }
        if let Some(reason) = session.invalid_reason(now_ms) {
            tracing::warn!(reason, user_id = %session.user_id, "Discarding invalid session record");
            self.storage.remove()?;
            return Ok(None);
        }

        Ok(Some(session))
    }

    /// Atomically replace the current session.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidSession`] if the session is not
    /// authenticated, has an empty access token, or is not strictly in the
    /// future. That is a caller bug and is logged at error level.
    /// Returns [`SessionError::Storage`] if persistence fails.
    pub fn save(&self, session: &SessionData) -> Result<(), SessionError> {
        let _guard = self.guard.lock();

        if let Some(reason) = session.invalid_reason(self.clock.now_ms()) {
            tracing::error!(reason, user_id = %session.user_id, "Refusing to persist invalid session");
            return Err(SessionError::InvalidSession(reason));
        }

        self.storage.write(session)?;
        tracing::debug!(user_id = %session.user_id, "Session saved");
        Ok(())
    }

    /// Remove the current session unconditionally.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Storage`] if the record cannot be removed.
    pub fn clear(&self) -> Result<(), SessionError> {
        let _guard = self.guard.lock();
        self.storage.remove()
    }

    /// Explicit user logout.
    ///
    /// # Errors
    ///
    /// Same as [`clear`](Self::clear).
    pub fn logout(&self) -> Result<(), SessionError> {
        self.clear()?;
        tracing::info!("Logged out");
        Ok(())
    }

    /// `true` iff a session exists and has not expired.
    ///
    /// The only predicate the application should use for "authenticated or
    /// not". Storage failures read as not authenticated.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        match self.load() {
            Ok(session) => session.is_some(),
            Err(e) => {
                tracing::warn!(error = %e, "Session lookup failed");
                false
            }
        }
    }
}
