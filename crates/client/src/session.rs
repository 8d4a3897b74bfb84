//! Explicit authentication state shared between the client and its UI.
//!
//! [`SessionStore`] owns the current tokens and fans out a [`SessionEvent`]
//! on every transition through a `tokio::sync::broadcast` channel.

use beacon_api::handlers::auth::{AuthResponse, UserInfo};
use beacon_core::types::DbId;
use tokio::sync::{broadcast, RwLock};

/// Tokens and identity of a logged-in user.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    pub user_id: DbId,
    pub username: String,
}

impl From<AuthResponse> for AuthSession {
    fn from(response: AuthResponse) -> Self {
        let UserInfo { id, username } = response.user;
        Self {
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            user_id: id,
            username,
        }
    }
}

/// A change of login state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    LoggedIn { user_id: DbId, username: String },
    /// Tokens were rotated; the user is unchanged.
    Refreshed { user_id: DbId },
    LoggedOut,
}

/// Default buffer capacity for the event channel.
const DEFAULT_CAPACITY: usize = 16;

/// Current session plus a broadcast of its transitions.
pub struct SessionStore {
    current: RwLock<Option<AuthSession>>,
    sender: broadcast::Sender<SessionEvent>,
}

impl SessionStore {
    /// Create a store with a specific channel capacity.
    ///
    /// Slow receivers observe `RecvError::Lagged` once the buffer is full.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            current: RwLock::new(None),
            sender,
        }
    }

    /// Subscribe to every future session transition.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }

    /// Install a session from a fresh login or registration.
    pub async fn set_session(&self, session: AuthSession) {
        let event = SessionEvent::LoggedIn {
            user_id: session.user_id,
            username: session.username.clone(),
        };
        *self.current.write().await = Some(session);
        self.publish(event);
    }

    /// Replace the tokens after a successful refresh.
    pub async fn refreshed(&self, session: AuthSession) {
        let event = SessionEvent::Refreshed {
            user_id: session.user_id,
        };
        *self.current.write().await = Some(session);
        self.publish(event);
    }

    /// Drop the session. Emits [`SessionEvent::LoggedOut`] only if there
    /// was one to drop.
    pub async fn clear(&self) {
        let previous = self.current.write().await.take();
        if previous.is_some() {
            self.publish(SessionEvent::LoggedOut);
        }
    }

    pub async fn current(&self) -> Option<AuthSession> {
        self.current.read().await.clone()
    }

    pub async fn is_logged_in(&self) -> bool {
        self.current.read().await.is_some()
    }

    pub async fn access_token(&self) -> Option<String> {
        self.current
            .read()
            .await
            .as_ref()
            .map(|s| s.access_token.clone())
    }

    pub async fn refresh_token(&self) -> Option<String> {
        self.current
            .read()
            .await
            .as_ref()
            .map(|s| s.refresh_token.clone())
    }

    fn publish(&self, event: SessionEvent) {
        // A send error only means nobody is subscribed.
        let _ = self.sender.send(event);
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
