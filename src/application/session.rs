//! ClientSession - everything that lives between sign-in and sign-out.
//!
//! Owns the REST client, the real-time transport and the messaging
//! service. Constructed explicitly at login (or from a stored session) and
//! torn down with `dispose`; nothing here is process-global.

use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;
use tokio::task::JoinHandle;

use crate::adapters::http::{
    AdminQuestionsClient, ApiClient, AssessmentClient, AuthClient, EventsClient, FriendsClient,
    HttpMessagingApi, NewsClient, TagsClient, UsersClient,
};
use crate::adapters::websocket::{InMemoryTransport, WebSocketTransport};
use crate::config::ClientConfig;
use crate::domain::user::{LoginCredentials, StoredSession, UserProfile};
use crate::ports::{
    ApiError, ConnectionState, CredentialStore, CredentialStoreError, MessagingApi,
    RealtimeTransport, UserDirectory,
};

use super::messaging::{Contacts, MessagingError, MessagingService};

/// Errors from session construction and lifecycle.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("No stored session; sign in first")]
    NotSignedIn,

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Credential store error: {0}")]
    Credentials(#[from] CredentialStoreError),

    #[error(transparent)]
    Messaging(#[from] MessagingError),
}

impl SessionError {
    /// True when the user must sign in again.
    pub fn requires_login(&self) -> bool {
        match self {
            SessionError::NotSignedIn => true,
            SessionError::Api(e) => e.is_auth_failure(),
            SessionError::Messaging(e) => e.is_auth_failure(),
            SessionError::Credentials(_) => false,
        }
    }
}

/// A signed-in client.
pub struct ClientSession {
    client: ApiClient,
    user: UserProfile,
    messaging: Arc<MessagingService>,
    realtime_enabled: bool,
    watcher: Mutex<Option<JoinHandle<()>>>,
}

impl ClientSession {
    /// Resumes the session held by `credentials`.
    ///
    /// Uses the cached user when present, otherwise asks `/users/me`.
    pub async fn restore(
        config: &ClientConfig,
        credentials: Arc<dyn CredentialStore>,
    ) -> Result<Self, SessionError> {
        let stored = credentials.load().await?.ok_or(SessionError::NotSignedIn)?;
        let client = ApiClient::new(&config.api, credentials)?;
        let user = Self::resolve_user(&client, stored).await?;
        Ok(Self::assemble(config, client, user))
    }

    /// Signs in and builds a session.
    pub async fn login(
        config: &ClientConfig,
        credentials: Arc<dyn CredentialStore>,
        login: &LoginCredentials,
    ) -> Result<Self, SessionError> {
        let client = ApiClient::new(&config.api, credentials)?;
        let stored = AuthClient::new(client.clone()).login(login).await?;
        let user = Self::resolve_user(&client, stored).await?;
        Ok(Self::assemble(config, client, user))
    }

    /// Builds a session from explicit parts.
    pub fn from_parts(
        client: ApiClient,
        user: UserProfile,
        api: Arc<dyn MessagingApi>,
        transport: Arc<dyn RealtimeTransport>,
        directory: Arc<dyn UserDirectory>,
        realtime_enabled: bool,
    ) -> Self {
        let messaging = MessagingService::new(api, transport, directory, user.id.clone());
        Self {
            client,
            user,
            messaging: Arc::new(messaging),
            realtime_enabled,
            watcher: Mutex::new(None),
        }
    }

    fn assemble(config: &ClientConfig, client: ApiClient, user: UserProfile) -> Self {
        let transport: Arc<dyn RealtimeTransport> = if config.realtime.enabled {
            Arc::new(WebSocketTransport::new(
                config.realtime.clone(),
                Arc::clone(client.credentials()),
            ))
        } else {
            Arc::new(InMemoryTransport::new())
        };

        Self::from_parts(
            client.clone(),
            user,
            Arc::new(HttpMessagingApi::new(client.clone())),
            transport,
            Arc::new(UsersClient::new(client)),
            config.realtime.enabled,
        )
    }

    async fn resolve_user(client: &ApiClient, stored: StoredSession) -> Result<UserProfile, ApiError> {
        match stored.user {
            Some(user) => Ok(user),
            None => UsersClient::new(client.clone()).current_user().await,
        }
    }

    // ════════════════════════════════════════════════════════════════════════
    // Accessors
    // ════════════════════════════════════════════════════════════════════════

    pub fn user(&self) -> &UserProfile {
        &self.user
    }

    pub fn messaging(&self) -> &Arc<MessagingService> {
        &self.messaging
    }

    pub fn api_client(&self) -> &ApiClient {
        &self.client
    }

    pub fn auth(&self) -> AuthClient {
        AuthClient::new(self.client.clone())
    }

    pub fn users(&self) -> UsersClient {
        UsersClient::new(self.client.clone())
    }

    pub fn friends(&self) -> FriendsClient {
        FriendsClient::new(self.client.clone())
    }

    pub fn events(&self) -> EventsClient {
        EventsClient::new(self.client.clone())
    }

    pub fn news(&self) -> NewsClient {
        NewsClient::new(self.client.clone())
    }

    pub fn tags(&self) -> TagsClient {
        TagsClient::new(self.client.clone())
    }

    pub fn assessments(&self) -> AssessmentClient {
        AssessmentClient::new(self.client.clone())
    }

    pub fn admin(&self) -> AdminQuestionsClient {
        AdminQuestionsClient::new(self.client.clone())
    }

    // ════════════════════════════════════════════════════════════════════════
    // Lifecycle
    // ════════════════════════════════════════════════════════════════════════

    /// Reloads friends and matches for participant resolution.
    pub async fn refresh_contacts(&self) -> Result<(), SessionError> {
        let friends_client = self.friends();
        let friends = friends_client.list_friends().await?;
        let matches = friends_client.list_matches().await?;
        tracing::debug!(friends = friends.len(), matches = matches.len(), "contacts refreshed");

        self.messaging.set_contacts(Contacts::new(friends, matches));
        self.messaging.resolve_participants().await;
        Ok(())
    }

    /// Opens the real-time channel and watches the credential store.
    ///
    /// When the stored session is cleared (logout elsewhere, failed
    /// refresh) the real-time connection is closed.
    pub async fn start(&self) -> ConnectionState {
        let state = if self.realtime_enabled {
            self.messaging.start().await
        } else {
            tracing::info!("real-time disabled, running REST-only");
            self.messaging.connection_state()
        };

        let mut watcher = self.watcher.lock().unwrap_or_else(PoisonError::into_inner);
        if watcher.is_none() {
            *watcher = Some(self.spawn_credential_watch());
        }
        state
    }

    /// Stops background work and closes the real-time channel.
    pub async fn dispose(&self) {
        let watcher = self
            .watcher
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = watcher {
            handle.abort();
        }
        self.messaging.stop().await;
        tracing::debug!(user_id = %self.user.id, "session disposed");
    }

    /// Disposes the session and forgets the stored credentials.
    pub async fn logout(self) -> Result<(), SessionError> {
        self.dispose().await;
        self.auth().logout().await?;
        Ok(())
    }

    fn spawn_credential_watch(&self) -> JoinHandle<()> {
        let mut sessions = self.client.credentials().subscribe();
        let transport = Arc::clone(self.messaging.transport());

        tokio::spawn(async move {
            while sessions.changed().await.is_ok() {
                let signed_out = sessions.borrow_and_update().is_none();
                if signed_out {
                    tracing::warn!("stored session cleared, closing real-time channel");
                    transport.disconnect().await;
                    break;
                }
            }
        })
    }
}
