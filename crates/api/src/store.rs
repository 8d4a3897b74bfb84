//! In-memory backing store for users, sessions, and characters.
//!
//! The backend's persistence format is opaque to clients; this store is the
//! single seam handlers go through. Every method takes the lock for the
//! duration of one logical operation, so each call is atomic.

use std::collections::{BTreeMap, HashMap};

use beacon_core::error::CoreError;
use beacon_core::status::StatusDataPoint;
use beacon_core::types::{DbId, Timestamp};
use chrono::Utc;
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use crate::models::{Character, CreateCharacter, Session, UpdateCharacter, User};

#[derive(Default)]
struct Inner {
    next_user_id: DbId,
    next_character_id: DbId,
    users: HashMap<DbId, User>,
    user_ids_by_name: HashMap<String, DbId>,
    /// Keyed by SHA-256 hash of the refresh token.
    sessions: HashMap<String, Session>,
    characters: BTreeMap<DbId, Character>,
}

/// Process-local store shared through `AppState`.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    // -- users ------------------------------------------------------------

    /// Register a user. Usernames are unique, compared case-insensitively.
    pub async fn create_user(&self, username: &str, password_hash: String) -> Result<User, CoreError> {
        let mut inner = self.inner.write().await;
        let name_key = username.to_lowercase();
        if inner.user_ids_by_name.contains_key(&name_key) {
            return Err(CoreError::Conflict(format!(
                "Username '{username}' is already taken"
            )));
        }

        inner.next_user_id += 1;
        let user = User {
            id: inner.next_user_id,
            username: username.to_string(),
            password_hash,
            created_at: Utc::now(),
        };
        inner.user_ids_by_name.insert(name_key, user.id);
        inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    pub async fn find_user_by_username(&self, username: &str) -> Option<User> {
        let inner = self.inner.read().await;
        inner
            .user_ids_by_name
            .get(&username.to_lowercase())
            .and_then(|id| inner.users.get(id))
            .cloned()
    }

    pub async fn find_user_by_id(&self, id: DbId) -> Option<User> {
        self.inner.read().await.users.get(&id).cloned()
    }

    // -- sessions ---------------------------------------------------------

    pub async fn create_session(&self, refresh_token_hash: String, session: Session) {
        self.inner
            .write()
            .await
            .sessions
            .insert(refresh_token_hash, session);
    }

    /// Remove and return the session for `refresh_token_hash` if it has not
    /// expired. Removing on use is what makes refresh tokens single-use.
    pub async fn take_session(&self, refresh_token_hash: &str, now: Timestamp) -> Option<Session> {
        let session = self.inner.write().await.sessions.remove(refresh_token_hash)?;
        (session.expires_at > now).then_some(session)
    }

    /// Revoke every session of a user. Returns how many were dropped.
    pub async fn revoke_sessions_for_user(&self, user_id: DbId) -> usize {
        let mut inner = self.inner.write().await;
        let before = inner.sessions.len();
        inner.sessions.retain(|_, s| s.user_id != user_id);
        before - inner.sessions.len()
    }

    // -- characters -------------------------------------------------------

    pub async fn create_character(&self, owner_id: DbId, input: CreateCharacter) -> Character {
        let mut inner = self.inner.write().await;
        inner.next_character_id += 1;
        let now = Utc::now();
        let character = Character {
            id: inner.next_character_id,
            owner_id,
            name: input.name,
            bio: input.bio,
            avatar_url: input.avatar_url,
            is_public: input.is_public.unwrap_or(true),
            config: input.config.unwrap_or_default(),
            status: Default::default(),
            created_at: now,
            updated_at: now,
        };
        inner.characters.insert(character.id, character.clone());
        character
    }

    pub async fn find_character(&self, id: DbId) -> Option<Character> {
        self.inner.read().await.characters.get(&id).cloned()
    }

    /// Characters owned by `owner_id`, in id order.
    pub async fn list_characters_by_owner(&self, owner_id: DbId) -> Vec<Character> {
        self.inner
            .read()
            .await
            .characters
            .values()
            .filter(|c| c.owner_id == owner_id)
            .cloned()
            .collect()
    }

    /// Characters flagged public, in id order.
    pub async fn list_public_characters(&self) -> Vec<Character> {
        self.inner
            .read()
            .await
            .characters
            .values()
            .filter(|c| c.is_public)
            .cloned()
            .collect()
    }

    /// Apply the non-`None` fields of `input`. Returns `None` if the
    /// character does not exist.
    pub async fn update_character(&self, id: DbId, input: UpdateCharacter) -> Option<Character> {
        let mut inner = self.inner.write().await;
        let character = inner.characters.get_mut(&id)?;

        if let Some(name) = input.name {
            character.name = name;
        }
        if let Some(bio) = input.bio {
            character.bio = Some(bio);
        }
        if let Some(avatar_url) = input.avatar_url {
            character.avatar_url = Some(avatar_url);
        }
        if let Some(is_public) = input.is_public {
            character.is_public = is_public;
        }
        if let Some(config) = input.config {
            character.config = config;
        }
        character.updated_at = Utc::now();
        Some(character.clone())
    }

    /// Returns `true` if a character was removed.
    pub async fn delete_character(&self, id: DbId) -> bool {
        self.inner.write().await.characters.remove(&id).is_some()
    }

    /// Replace one status bucket, stamping it with `now`.
    pub async fn put_status_bucket(
        &self,
        character_id: DbId,
        bucket: &str,
        data: Map<String, Value>,
        now: Timestamp,
    ) -> Option<StatusDataPoint> {
        let mut inner = self.inner.write().await;
        let character = inner.characters.get_mut(&character_id)?;
        let point = StatusDataPoint {
            data,
            updated_at: now,
        };
        character.status.insert(bucket.to_string(), point.clone());
        Some(point)
    }
}
