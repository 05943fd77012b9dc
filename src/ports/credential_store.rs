//! Credential store port - where tokens and the cached user live.
//!
//! Implementations keep the current session in memory and expose it through
//! a `watch` channel so other components (the REST client, the real-time
//! transport, UI state) observe logins, refreshes and logouts.

use async_trait::async_trait;
use tokio::sync::watch;

use crate::domain::user::StoredSession;

/// Errors that can occur while persisting credentials.
#[derive(Debug, thiserror::Error)]
pub enum CredentialStoreError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Failed to serialize credentials: {0}")]
    Serialization(String),

    #[error("Failed to deserialize credentials: {0}")]
    Deserialization(String),
}

/// Port for persisting and observing the signed-in session.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Current session, if signed in.
    async fn load(&self) -> Result<Option<StoredSession>, CredentialStoreError>;

    /// Replaces the stored session and notifies subscribers.
    async fn save(&self, session: &StoredSession) -> Result<(), CredentialStoreError>;

    /// Removes stored credentials and notifies subscribers.
    async fn clear(&self) -> Result<(), CredentialStoreError>;

    /// Receiver that yields the session after every change.
    fn subscribe(&self) -> watch::Receiver<Option<StoredSession>>;
}
