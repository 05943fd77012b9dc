//! In-memory Credential Store
//!
//! Keeps the session in a `watch` channel only. Useful for tests and for
//! short-lived tools that should not touch the disk.

use async_trait::async_trait;
use tokio::sync::watch;

use crate::domain::user::StoredSession;
use crate::ports::{CredentialStore, CredentialStoreError};

/// In-memory credential store
#[derive(Debug)]
pub struct InMemoryCredentialStore {
    current: watch::Sender<Option<StoredSession>>,
}

impl InMemoryCredentialStore {
    /// Creates a signed-out store.
    pub fn new() -> Self {
        let (current, _) = watch::channel(None);
        Self { current }
    }

    /// Creates a store that starts signed in.
    pub fn with_session(session: StoredSession) -> Self {
        let (current, _) = watch::channel(Some(session));
        Self { current }
    }

    /// Synchronous peek, for assertions.
    pub fn snapshot(&self) -> Option<StoredSession> {
        self.current.borrow().clone()
    }
}

impl Default for InMemoryCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn load(&self) -> Result<Option<StoredSession>, CredentialStoreError> {
        Ok(self.current.borrow().clone())
    }

    async fn save(&self, session: &StoredSession) -> Result<(), CredentialStoreError> {
        self.current.send_replace(Some(session.clone()));
        Ok(())
    }

    async fn clear(&self) -> Result<(), CredentialStoreError> {
        self.current.send_replace(None);
        Ok(())
    }

    fn subscribe(&self) -> watch::Receiver<Option<StoredSession>> {
        self.current.subscribe()
    }
}
