//! Generic REST client with bearer attachment and one-shot token refresh.
//!
//! Every typed client in this module funnels through [`ApiClient::request`]:
//!
//! 1. Reads the current session from the credential store
//! 2. Sends the request with `Authorization: Bearer <access>` if signed in
//! 3. On 401 with a refresh token: one `POST /auth/refresh`, then one retry
//! 4. On refresh failure: clears the store and returns `SessionExpired`
//!
//! Refreshes are single-flight across all clones of a client. A request
//! whose 401 arrives after another request already rotated the token reuses
//! the stored token instead of spending the refresh token again.
//!
//! Empty 2xx bodies decode as JSON `null`, so `()` and `Option<T>` work
//! as response types for endpoints that return nothing.

use std::sync::Arc;

use reqwest::{Method, Response, StatusCode};
use tokio::sync::Mutex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::ApiConfig;
use crate::domain::user::StoredSession;
use crate::ports::{ApiError, CredentialStore};

/// One file part of a multipart upload.
#[derive(Debug, Clone)]
pub struct FilePart {
    pub field: String,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl FilePart {
    pub fn new(
        field: impl Into<String>,
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            field: field.into(),
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }
}

/// Request body.
///
/// `Binary` and `Multipart` skip JSON serialization and let reqwest set
/// the content framing. Bodies are rebuilt per attempt so a refreshed
/// request can be resent.
#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(serde_json::Value),
    Text(String),
    Binary {
        content_type: String,
        bytes: Vec<u8>,
    },
    Multipart {
        fields: Vec<(String, String)>,
        files: Vec<FilePart>,
    },
}

impl RequestBody {
    /// Serializes `value` into a JSON body.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self, ApiError> {
        serde_json::to_value(value)
            .map(RequestBody::Json)
            .map_err(|e| ApiError::invalid_request(e.to_string()))
    }

    /// Multipart body with a single file part.
    pub fn file(part: FilePart) -> Self {
        RequestBody::Multipart {
            fields: Vec::new(),
            files: vec![part],
        }
    }

    fn apply(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::RequestBuilder, ApiError> {
        Ok(match self {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Text(text) => builder
                .header(reqwest::header::CONTENT_TYPE, "text/plain; charset=utf-8")
                .body(text.clone()),
            RequestBody::Binary {
                content_type,
                bytes,
            } => builder
                .header(reqwest::header::CONTENT_TYPE, content_type.as_str())
                .body(bytes.clone()),
            RequestBody::Multipart { fields, files } => {
                let mut form = reqwest::multipart::Form::new();
                for (name, value) in fields {
                    form = form.text(name.clone(), value.clone());
                }
                for file in files {
                    let part = reqwest::multipart::Part::bytes(file.bytes.clone())
                        .file_name(file.file_name.clone())
                        .mime_str(&file.content_type)
                        .map_err(|e| ApiError::invalid_request(e.to_string()))?;
                    form = form.part(file.field.clone(), part);
                }
                builder.multipart(form)
            }
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

/// Body of a successful `/auth/refresh`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// Shared REST client.
///
/// Cheap to clone; all clones share the connection pool and the
/// credential store.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    timeout_secs: u64,
    credentials: Arc<dyn CredentialStore>,
    refresh_lock: Arc<Mutex<()>>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl ApiClient {
    /// Builds a client from config.
    pub fn new(config: &ApiConfig, credentials: Arc<dyn CredentialStore>) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ApiError::invalid_request(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url().to_string(),
            timeout_secs: config.request_timeout_secs,
            credentials,
            refresh_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn credentials(&self) -> &Arc<dyn CredentialStore> {
        &self.credentials
    }

    /// Sends a request and decodes the JSON response.
    ///
    /// # Errors
    ///
    /// - `Unauthorized` on 401 without a refresh token, or 401 after the retry
    /// - `SessionExpired` when the refresh itself fails
    /// - `Status` for any other non-2xx
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: RequestBody,
    ) -> Result<T, ApiError> {
        self.execute(method, path, &[], body).await
    }

    /// `GET` with query parameters, URL-encoded by reqwest.
    pub async fn get_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        self.execute(Method::GET, path, query, RequestBody::Empty)
            .await
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: RequestBody,
    ) -> Result<T, ApiError> {
        let session = self.current_session().await?;
        let token = session.as_ref().map(|s| s.tokens.access_token());

        let response = self.send(&method, path, query, &body, token).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return self.decode(response).await;
        }

        let refresh_available = session
            .as_ref()
            .and_then(|s| s.tokens.refresh_token())
            .is_some();

        match session {
            Some(session) if refresh_available => {
                tracing::debug!(%method, path, "access token rejected, refreshing");
                let refreshed = self.refresh_rejected(&session).await?;

                let retry = self
                    .send(
                        &method,
                        path,
                        query,
                        &body,
                        Some(refreshed.tokens.access_token()),
                    )
                    .await?;
                if retry.status() == StatusCode::UNAUTHORIZED {
                    let text = retry.text().await.unwrap_or_default();
                    return Err(ApiError::Unauthorized(text));
                }
                self.decode(retry).await
            }
            _ => {
                let text = response.text().await.unwrap_or_default();
                Err(ApiError::Unauthorized(text))
            }
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request(Method::GET, path, RequestBody::Empty).await
    }

    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::POST, path, RequestBody::json(body)?)
            .await
    }

    pub async fn put<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::PUT, path, RequestBody::json(body)?)
            .await
    }

    pub async fn patch<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::PATCH, path, RequestBody::json(body)?)
            .await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request(Method::DELETE, path, RequestBody::Empty).await
    }

    /// Exchanges the stored refresh token for a new access token.
    ///
    /// Clears the store and returns `SessionExpired` if the server refuses.
    pub async fn refresh(&self) -> Result<StoredSession, ApiError> {
        let _guard = self.refresh_lock.lock().await;
        match self.current_session().await? {
            Some(session) if session.tokens.refresh_token().is_some() => {
                self.refresh_session(&session).await
            }
            _ => Err(ApiError::SessionExpired),
        }
    }

    /// Refreshes after `rejected`'s access token got a 401.
    ///
    /// Waits for any refresh already in flight, then re-reads the store: if
    /// the access token changed meanwhile that session is returned as is.
    async fn refresh_rejected(&self, rejected: &StoredSession) -> Result<StoredSession, ApiError> {
        let _guard = self.refresh_lock.lock().await;
        match self.current_session().await? {
            Some(current)
                if current.tokens.access_token() != rejected.tokens.access_token() =>
            {
                tracing::debug!("access token already rotated by a concurrent request");
                Ok(current)
            }
            Some(current) => self.refresh_session(&current).await,
            None => Err(ApiError::SessionExpired),
        }
    }

    async fn refresh_session(&self, session: &StoredSession) -> Result<StoredSession, ApiError> {
        let Some(refresh_token) = session.tokens.refresh_token() else {
            return Err(ApiError::SessionExpired);
        };

        match self.exchange_refresh_token(refresh_token).await {
            Ok(tokens) => {
                let refreshed = StoredSession::new(
                    session
                        .tokens
                        .rotated(tokens.access_token, tokens.refresh_token),
                    session.user.clone(),
                );
                self.credentials
                    .save(&refreshed)
                    .await
                    .map_err(|e| ApiError::Credentials(e.to_string()))?;
                tracing::debug!("access token refreshed");
                Ok(refreshed)
            }
            Err(e) => {
                tracing::warn!(error = %e, "token refresh failed, clearing session");
                if let Err(clear_err) = self.credentials.clear().await {
                    tracing::error!(error = %clear_err, "failed to clear stored credentials");
                }
                Err(ApiError::SessionExpired)
            }
        }
    }

    async fn exchange_refresh_token(&self, refresh_token: &str) -> Result<TokenResponse, ApiError> {
        let body = RequestBody::json(&RefreshRequest { refresh_token })?;
        let response = self.send(&Method::POST, "/auth/refresh", &[], &body, None).await?;
        self.decode(response).await
    }

    async fn current_session(&self) -> Result<Option<StoredSession>, ApiError> {
        self.credentials
            .load()
            .await
            .map_err(|e| ApiError::Credentials(e.to_string()))
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    async fn send(
        &self,
        method: &Method,
        path: &str,
        query: &[(&str, &str)],
        body: &RequestBody,
        token: Option<&str>,
    ) -> Result<Response, ApiError> {
        let mut builder = self.http.request(method.clone(), self.url(path));
        if !query.is_empty() {
            builder = builder.query(query);
        }
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }
        let builder = body.apply(builder)?;

        builder.send().await.map_err(|e| self.transport_error(e))
    }

    async fn decode<T: DeserializeOwned>(&self, response: Response) -> Result<T, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!(status = status.as_u16(), body = %body, "request failed");
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(e))?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return serde_json::from_value(serde_json::Value::Null)
                .map_err(|e| ApiError::decode(e.to_string()));
        }

        serde_json::from_slice(&bytes).map_err(|e| ApiError::decode(e.to_string()))
    }

    fn transport_error(&self, error: reqwest::Error) -> ApiError {
        if error.is_timeout() {
            ApiError::Timeout {
                timeout_secs: self.timeout_secs,
            }
        } else {
            ApiError::network(error.to_string())
        }
    }
}
