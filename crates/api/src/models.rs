//! Entity models and request DTOs for the in-memory store.

use beacon_core::character_config::CharacterConfig;
use beacon_core::status::StatusBuckets;
use beacon_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};

/// A registered account. Never serialized: the hash stays server-side.
#[derive(Debug, Clone)]
pub struct User {
    pub id: DbId,
    pub username: String,
    pub password_hash: String,
    pub created_at: Timestamp,
}

/// A refresh-token session, keyed in the store by the token's hash.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: DbId,
    pub expires_at: Timestamp,
}

/// A character profile with its display config and reported status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Character {
    pub id: DbId,
    pub owner_id: DbId,
    pub name: String,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    /// Listed on the public display page.
    pub is_public: bool,
    pub config: CharacterConfig,
    pub status: StatusBuckets,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new character.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CreateCharacter {
    pub name: String,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    /// Defaults to `true` if omitted.
    pub is_public: Option<bool>,
    /// Defaults to an empty config if omitted.
    pub config: Option<CharacterConfig>,
}

/// DTO for updating an existing character. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct UpdateCharacter {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub is_public: Option<bool>,
    /// Replaces the whole config blob when present.
    pub config: Option<CharacterConfig>,
}
