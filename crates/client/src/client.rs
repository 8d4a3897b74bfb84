//! REST client for the beacon API.
//!
//! Wraps the `/api/v1` endpoints using [`reqwest`]. Authenticated calls
//! read the access token from the shared [`SessionStore`]; a 401 triggers a
//! single refresh-and-retry before the session is dropped.

use std::sync::Arc;

use beacon_api::handlers::auth::{AuthResponse, CredentialsRequest, RefreshRequest};
use beacon_api::handlers::character::PublicCharacter;
use beacon_api::handlers::music_link::{ParseLinkRequest, ParseLinkResponse};
use beacon_api::handlers::status::{CharacterStatus, ReportStatus};
use beacon_api::models::{Character, CreateCharacter, UpdateCharacter};
use beacon_api::response::DataResponse;
use beacon_core::status::StatusDataPoint;
use beacon_core::types::DbId;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::session::{AuthSession, SessionStore};

/// Errors from the client layer.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// An authenticated call was made with no session in the store.
    #[error("Not logged in")]
    NotLoggedIn,

    /// The server rejected the credentials and the session could not be
    /// recovered. The store has been cleared.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The server returned a non-2xx status other than 401.
    #[error("API error ({status}) {code}: {message}")]
    Api {
        status: u16,
        /// Machine-readable code from the error body, e.g. `NOT_FOUND`.
        code: String,
        message: String,
    },
}

/// Error body produced by the API's `AppError`.
#[derive(Deserialize)]
struct ErrorBody {
    error: String,
    code: String,
}

/// HTTP client for one beacon deployment.
pub struct BeaconClient {
    http: reqwest::Client,
    base_url: String,
    session: Arc<SessionStore>,
    /// Serializes refreshes so concurrent 401s rotate the token only once.
    refresh_lock: Mutex<()>,
}

impl BeaconClient {
    /// Create a client with its own session store.
    ///
    /// * `base_url` - Server origin, e.g. `http://localhost:3000`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(
            reqwest::Client::new(),
            base_url,
            Arc::new(SessionStore::default()),
        )
    }

    /// Create a client reusing an existing [`reqwest::Client`] and a
    /// session store shared with the rest of the application.
    pub fn with_client(
        http: reqwest::Client,
        base_url: impl Into<String>,
        session: Arc<SessionStore>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http,
            base_url,
            session,
            refresh_lock: Mutex::new(()),
        }
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    // ---- auth ----

    /// Create an account and store the resulting session.
    pub async fn register(&self, username: &str, password: &str) -> Result<AuthSession, ClientError> {
        self.authenticate("/auth/register", username, password).await
    }

    /// Log in and store the resulting session.
    pub async fn login(&self, username: &str, password: &str) -> Result<AuthSession, ClientError> {
        self.authenticate("/auth/login", username, password).await
    }

    /// Revoke the server-side sessions and clear the local one.
    ///
    /// The local session is cleared even when the server call fails, so a
    /// user can always log out of an unreachable deployment.
    pub async fn logout(&self) -> Result<(), ClientError> {
        if !self.session.is_logged_in().await {
            return Ok(());
        }

        let result = match self.send_authed(|| self.http.post(self.url("/auth/logout"))).await {
            Ok(response) => Self::ensure_success(response).await.map(drop),
            Err(e) => Err(e),
        };
        self.session.clear().await;

        match result {
            Err(ClientError::Unauthorized(_)) => Ok(()),
            other => other,
        }
    }

    /// Exchange the stored refresh token for a new token pair.
    pub async fn refresh_session(&self) -> Result<(), ClientError> {
        let _guard = self.refresh_lock.lock().await;
        self.refresh_locked().await
    }

    // ---- characters ----

    /// Public characters with their resolved status.
    pub async fn list_public(&self) -> Result<Vec<PublicCharacter>, ClientError> {
        let response = self
            .http
            .get(self.url("/characters/public"))
            .send()
            .await?;
        Self::parse_data(response).await
    }

    /// Fetch one character. Private characters are only returned to their
    /// owner, so the session token is sent when there is one.
    pub async fn get_character(&self, id: DbId) -> Result<Character, ClientError> {
        let url = self.url(&format!("/characters/{id}"));
        let response = self.send_with_session(|| self.http.get(&url)).await?;
        Self::parse_data(response).await
    }

    pub async fn create_character(&self, input: &CreateCharacter) -> Result<Character, ClientError> {
        let url = self.url("/characters");
        let response = self.send_authed(|| self.http.post(&url).json(input)).await?;
        Self::parse_data(response).await
    }

    /// Partially update a character the logged-in user owns.
    pub async fn update_character(
        &self,
        id: DbId,
        input: &UpdateCharacter,
    ) -> Result<Character, ClientError> {
        let url = self.url(&format!("/characters/{id}"));
        let response = self.send_authed(|| self.http.put(&url).json(input)).await?;
        Self::parse_data(response).await
    }

    // ---- status ----

    /// Raw buckets plus the server-resolved view.
    pub async fn get_status(&self, id: DbId) -> Result<CharacterStatus, ClientError> {
        let url = self.url(&format!("/characters/{id}/status"));
        let response = self.send_with_session(|| self.http.get(&url)).await?;
        Self::parse_data(response).await
    }

    /// Replace one status bucket. `data` must be a JSON object.
    pub async fn report_status(
        &self,
        id: DbId,
        bucket: &str,
        data: serde_json::Value,
    ) -> Result<StatusDataPoint, ClientError> {
        let url = self.url(&format!("/characters/{id}/status/{bucket}"));
        let body = ReportStatus { data };
        let response = self.send_authed(|| self.http.put(&url).json(&body)).await?;
        Self::parse_data(response).await
    }

    // ---- music links ----

    pub async fn parse_music_link(&self, link: &str) -> Result<ParseLinkResponse, ClientError> {
        let response = self
            .http
            .post(self.url("/music-links/parse"))
            .json(&ParseLinkRequest {
                link: link.to_string(),
            })
            .send()
            .await?;
        Self::parse_data(response).await
    }

    // ---- private helpers ----

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{path}", self.base_url)
    }

    async fn authenticate(
        &self,
        path: &str,
        username: &str,
        password: &str,
    ) -> Result<AuthSession, ClientError> {
        let response = self
            .http
            .post(self.url(path))
            .json(&CredentialsRequest {
                username: username.to_string(),
                password: password.to_string(),
            })
            .send()
            .await?;

        let session = AuthSession::from(Self::parse_response::<AuthResponse>(response).await?);
        tracing::debug!(user_id = session.user_id, "Session established");
        self.session.set_session(session.clone()).await;
        Ok(session)
    }

    /// Send a request with the stored bearer token. On 401, refresh once
    /// and resend; a second 401 clears the session.
    ///
    /// `build` is called once per attempt because a `RequestBuilder` cannot
    /// be reused after sending.
    async fn send_authed<F>(&self, build: F) -> Result<Response, ClientError>
    where
        F: Fn() -> RequestBuilder,
    {
        let token = self
            .session
            .access_token()
            .await
            .ok_or(ClientError::NotLoggedIn)?;
        let response = build().bearer_auth(&token).send().await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        tracing::debug!("Access token rejected, refreshing session");
        let token = self.recover_access_token(&token).await?;
        let response = build().bearer_auth(&token).send().await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            tracing::warn!("Refreshed access token rejected, clearing session");
            self.session.clear().await;
        }
        Ok(response)
    }

    /// Send authenticated when logged in, anonymously otherwise.
    async fn send_with_session<F>(&self, build: F) -> Result<Response, ClientError>
    where
        F: Fn() -> RequestBuilder,
    {
        if self.session.is_logged_in().await {
            self.send_authed(build).await
        } else {
            Ok(build().send().await?)
        }
    }

    /// Obtain a usable access token after `rejected` got a 401. If another
    /// task already rotated the tokens, their result is reused.
    async fn recover_access_token(&self, rejected: &str) -> Result<String, ClientError> {
        let _guard = self.refresh_lock.lock().await;
        match self.session.access_token().await {
            None => return Err(ClientError::Unauthorized("Session ended".into())),
            Some(current) if current != rejected => return Ok(current),
            Some(_) => {}
        }

        self.refresh_locked().await?;
        self.session
            .access_token()
            .await
            .ok_or_else(|| ClientError::Unauthorized("Session ended".into()))
    }

    /// Refresh without taking `refresh_lock`; callers must hold it.
    ///
    /// Any rejection from the server ends the session. Transport errors
    /// leave it in place since the tokens may still be valid.
    async fn refresh_locked(&self) -> Result<(), ClientError> {
        let refresh_token = self
            .session
            .refresh_token()
            .await
            .ok_or(ClientError::NotLoggedIn)?;

        let response = self
            .http
            .post(self.url("/auth/refresh"))
            .json(&RefreshRequest { refresh_token })
            .send()
            .await?;

        match Self::parse_response::<AuthResponse>(response).await {
            Ok(auth) => {
                self.session.refreshed(auth.into()).await;
                Ok(())
            }
            Err(ClientError::Request(e)) => Err(ClientError::Request(e)),
            Err(e) => {
                tracing::info!(error = %e, "Refresh rejected, logging out");
                self.session.clear().await;
                Err(ClientError::Unauthorized(e.to_string()))
            }
        }
    }

    /// Parse a `{ "data": ... }` envelope.
    async fn parse_data<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
        Self::parse_response::<DataResponse<T>>(response)
            .await
            .map(|envelope| envelope.data)
    }

    async fn parse_response<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json().await?)
    }

    /// Map a non-2xx response to [`ClientError`], decoding the API's
    /// `{ error, code }` body when present.
    async fn ensure_success(response: Response) -> Result<Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        let (code, message) = match serde_json::from_str::<ErrorBody>(&body) {
            Ok(parsed) => (parsed.code, parsed.error),
            Err(_) => ("UNKNOWN".to_string(), body),
        };

        if status == StatusCode::UNAUTHORIZED {
            return Err(ClientError::Unauthorized(message));
        }
        Err(ClientError::Api {
            status: status.as_u16(),
            code,
            message,
        })
    }
}
