//! Session persistence.
//!
//! Sessions live in the private store. Platform secure stores cap the size of
//! a single value, so a session too large for that cap is written to the
//! general store instead and the private store keeps a marker pointing at it.

use std::sync::Arc;

use tracing::debug;

use crate::{
    auth::Session,
    storage::{KeyValueStore, StorageError},
};

/// Key the session is stored under.
pub const SESSION_KEY: &str = "auth-session";

/// Largest value the private store accepts.
pub const SECURE_VALUE_LIMIT: usize = 2048;

const OVERFLOW_MARKER: &str = "overflow:general";

#[derive(Clone)]
pub struct SessionStorage {
    secure: Arc<dyn KeyValueStore>,
    general: Arc<dyn KeyValueStore>,
    limit: usize,
}

impl std::fmt::Debug for SessionStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStorage")
            .field("limit", &self.limit)
            .finish_non_exhaustive()
    }
}

impl SessionStorage {
    #[must_use]
    pub fn new(secure: Arc<dyn KeyValueStore>, general: Arc<dyn KeyValueStore>) -> Self {
        Self {
            secure,
            general,
            limit: SECURE_VALUE_LIMIT,
        }
    }

    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Persist the session, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error when serialization or either store fails.
    pub fn save(&self, session: &Session) -> Result<(), StorageError> {
        let serialized = serde_json::to_string(session)?;

        if serialized.len() <= self.limit {
            self.secure.set(SESSION_KEY, &serialized)?;
            self.general.remove(SESSION_KEY)?;
        } else {
            debug!(
                size = serialized.len(),
                limit = self.limit,
                "session exceeds secure store limit, using general store"
            );

            self.general.set(SESSION_KEY, &serialized)?;
            self.secure.set(SESSION_KEY, OVERFLOW_MARKER)?;
        }

        Ok(())
    }

    /// Load the persisted session, if any.
    ///
    /// # Errors
    ///
    /// Returns an error when a store fails or the stored value is corrupt.
    pub fn load(&self) -> Result<Option<Session>, StorageError> {
        let stored = match self.secure.get(SESSION_KEY)? {
            Some(marker) if marker == OVERFLOW_MARKER => self.general.get(SESSION_KEY)?,
            other => other,
        };

        stored
            .map(|value| serde_json::from_str(&value))
            .transpose()
            .map_err(StorageError::from)
    }

    /// Forget the persisted session.
    ///
    /// # Errors
    ///
    /// Returns an error when either store fails.
    pub fn clear(&self) -> Result<(), StorageError> {
        self.secure.remove(SESSION_KEY)?;
        self.general.remove(SESSION_KEY)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;
    use crate::{
        auth::{SecretToken, User, UserUuid},
        storage::FileStore,
    };

    fn session(token_len: usize) -> Session {
        Session {
            access_token: SecretToken::new("a".repeat(token_len)),
            refresh_token: Some(SecretToken::new("refresh")),
            token_type: "bearer".to_string(),
            expires_at: None,
            user: User {
                uuid: UserUuid::new(),
                email: Some("shopper@example.com".to_string()),
                created_at: None,
            },
        }
    }

    fn stores() -> Result<(tempfile::TempDir, Arc<FileStore>, Arc<FileStore>), std::io::Error> {
        let dir = tempfile::tempdir()?;
        let secure = Arc::new(FileStore::private(dir.path().join("secure")));
        let general = Arc::new(FileStore::new(dir.path().join("general")));

        Ok((dir, secure, general))
    }

    #[test]
    fn small_session_stays_in_secure_store() -> TestResult {
        let (_dir, secure, general) = stores()?;
        let storage = SessionStorage::new(secure.clone(), general.clone());
        let saved = session(16);

        storage.save(&saved)?;

        assert!(general.get(SESSION_KEY)?.is_none());
        assert_eq!(
            storage.load()?.map(|s| s.user),
            Some(saved.user),
            "session should round trip"
        );

        Ok(())
    }

    #[test]
    fn oversized_session_overflows_to_general_store() -> TestResult {
        let (_dir, secure, general) = stores()?;
        let storage = SessionStorage::new(secure.clone(), general.clone());
        let saved = session(SECURE_VALUE_LIMIT * 2);

        storage.save(&saved)?;

        assert_eq!(secure.get(SESSION_KEY)?.as_deref(), Some(OVERFLOW_MARKER));
        assert!(general.get(SESSION_KEY)?.is_some());

        let loaded = storage.load()?;

        assert_eq!(
            loaded.map(|s| s.access_token.expose().len()),
            Some(SECURE_VALUE_LIMIT * 2)
        );

        Ok(())
    }

    #[test]
    fn shrinking_session_clears_stale_overflow() -> TestResult {
        let (_dir, secure, general) = stores()?;
        let storage = SessionStorage::new(secure, general.clone());

        storage.save(&session(SECURE_VALUE_LIMIT * 2))?;
        storage.save(&session(8))?;

        assert!(general.get(SESSION_KEY)?.is_none());
        assert_eq!(
            storage.load()?.map(|s| s.access_token.expose().len()),
            Some(8)
        );

        Ok(())
    }

    #[test]
    fn clear_removes_everything() -> TestResult {
        let (_dir, secure, general) = stores()?;
        let storage = SessionStorage::new(secure, general);

        storage.save(&session(SECURE_VALUE_LIMIT * 2))?;
        storage.clear()?;

        assert!(storage.load()?.is_none());

        Ok(())
    }
}
