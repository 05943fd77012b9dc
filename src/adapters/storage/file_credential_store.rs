//! File-based Credential Store
//!
//! Persists tokens and the cached user as a single YAML file. The file is
//! read once on `open` and again on `reload`; every other read is served
//! from memory. `reload` is how a second process sharing the file picks up
//! a login, refresh or logout written by the first.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::watch;

use crate::domain::user::{AuthTokens, StoredSession, UserProfile};
use crate::ports::{CredentialStore, CredentialStoreError};

/// On-disk layout of the session file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct PersistedSession {
    access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user: Option<UserProfile>,
}

impl From<&StoredSession> for PersistedSession {
    fn from(session: &StoredSession) -> Self {
        Self {
            access_token: session.tokens.access_token().to_string(),
            refresh_token: session.tokens.refresh_token().map(str::to_string),
            user: session.user.clone(),
        }
    }
}

impl From<PersistedSession> for StoredSession {
    fn from(persisted: PersistedSession) -> Self {
        StoredSession::new(
            AuthTokens::new(persisted.access_token, persisted.refresh_token),
            persisted.user,
        )
    }
}

/// Credential store backed by a YAML file
#[derive(Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
    current: watch::Sender<Option<StoredSession>>,
}

impl FileCredentialStore {
    /// Opens the store at `path`, loading any session already on disk.
    ///
    /// A missing file means "signed out"; a corrupt file is an error.
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self, CredentialStoreError> {
        let (current, _) = watch::channel(None);
        let store = Self {
            path: path.as_ref().to_path_buf(),
            current,
        };
        store.reload().await?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Re-reads the file and notifies subscribers if it changed.
    ///
    /// Returns true when the in-memory session was updated.
    pub async fn reload(&self) -> Result<bool, CredentialStoreError> {
        let on_disk = self.read_file().await?;
        let in_memory = self
            .current
            .borrow()
            .as_ref()
            .map(PersistedSession::from);

        if on_disk == in_memory {
            return Ok(false);
        }

        tracing::debug!(
            path = %self.path.display(),
            signed_in = on_disk.is_some(),
            "credential file changed on disk"
        );
        self.current.send_replace(on_disk.map(StoredSession::from));
        Ok(true)
    }

    async fn read_file(&self) -> Result<Option<PersistedSession>, CredentialStoreError> {
        let yaml = match fs::read_to_string(&self.path).await {
            Ok(yaml) => yaml,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CredentialStoreError::Io(e.to_string())),
        };

        if yaml.trim().is_empty() {
            return Ok(None);
        }

        serde_yaml::from_str(&yaml)
            .map(Some)
            .map_err(|e| CredentialStoreError::Deserialization(e.to_string()))
    }

    async fn ensure_parent_dir(&self) -> Result<(), CredentialStoreError> {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => fs::create_dir_all(dir)
                .await
                .map_err(|e| CredentialStoreError::Io(e.to_string())),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn load(&self) -> Result<Option<StoredSession>, CredentialStoreError> {
        Ok(self.current.borrow().clone())
    }

    async fn save(&self, session: &StoredSession) -> Result<(), CredentialStoreError> {
        self.ensure_parent_dir().await?;

        let yaml = serde_yaml::to_string(&PersistedSession::from(session))
            .map_err(|e| CredentialStoreError::Serialization(e.to_string()))?;

        fs::write(&self.path, yaml)
            .await
            .map_err(|e| CredentialStoreError::Io(e.to_string()))?;

        self.current.send_replace(Some(session.clone()));
        Ok(())
    }

    async fn clear(&self) -> Result<(), CredentialStoreError> {
        match fs::remove_file(&self.path).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(CredentialStoreError::Io(e.to_string())),
        }

        self.current.send_replace(None);
        Ok(())
    }

    fn subscribe(&self) -> watch::Receiver<Option<StoredSession>> {
        self.current.subscribe()
    }
}
