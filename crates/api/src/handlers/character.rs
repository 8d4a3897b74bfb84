//! Handlers for the `/characters` resource.
//!
//! Public profiles are readable by anyone. A private one is visible only
//! to its owner and reads as 404 for everyone else. Only the owner may
//! change or delete a character. Config blobs are validated with the core validators before they
//! are stored.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use beacon_core::character_config::{resolve_status_view, StatusView};
use beacon_core::error::CoreError;
use beacon_core::types::DbId;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::models::{Character, CreateCharacter, UpdateCharacter};
use crate::response::DataResponse;
use crate::state::AppState;

/// Maximum character name length, in characters.
const MAX_NAME_LENGTH: usize = 64;

/// Entry on the public display page.
#[derive(Debug, Serialize, Deserialize)]
pub struct PublicCharacter {
    pub id: DbId,
    pub name: String,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub status: StatusView,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/characters
///
/// List the authenticated user's characters.
pub async fn list_mine(
    user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let characters = state.store.list_characters_by_owner(user.user_id).await;
    Ok(Json(DataResponse { data: characters }))
}

/// GET /api/v1/characters/public
///
/// Public characters with their currently resolved status, as polled by the
/// display page.
pub async fn list_public(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let now = Utc::now();
    let listing: Vec<PublicCharacter> = state
        .store
        .list_public_characters()
        .await
        .into_iter()
        .map(|c| PublicCharacter {
            status: resolve_status_view(&c.config, &c.status, now),
            id: c.id,
            name: c.name,
            bio: c.bio,
            avatar_url: c.avatar_url,
        })
        .collect();

    Ok(Json(DataResponse { data: listing }))
}

/// POST /api/v1/characters
pub async fn create(
    user: AuthUser,
    State(state): State<AppState>,
    Json(mut input): Json<CreateCharacter>,
) -> AppResult<impl IntoResponse> {
    input.name = validate_name(&input.name)?;
    if let Some(config) = &input.config {
        config.validate()?;
    }

    let character = state.store.create_character(user.user_id, input).await;

    tracing::info!(
        character_id = character.id,
        user_id = user.user_id,
        name = %character.name,
        "Character created",
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: character })))
}

/// GET /api/v1/characters/{id}
pub async fn get_by_id(
    user: Option<AuthUser>,
    State(state): State<AppState>,
    Path(character_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let character = find_visible_character(&state, user.as_ref(), character_id).await?;
    Ok(Json(DataResponse { data: character }))
}

/// PUT /api/v1/characters/{id}
///
/// Partially update a character. A present `config` replaces the stored
/// blob wholesale.
pub async fn update(
    user: AuthUser,
    State(state): State<AppState>,
    Path(character_id): Path<DbId>,
    Json(mut input): Json<UpdateCharacter>,
) -> AppResult<impl IntoResponse> {
    find_owned_character(&state, &user, character_id).await?;

    if let Some(name) = &input.name {
        input.name = Some(validate_name(name)?);
    }
    if let Some(config) = &input.config {
        config.validate()?;
    }

    let character = state
        .store
        .update_character(character_id, input)
        .await
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Character",
            id: character_id,
        }))?;

    tracing::info!(character_id, user_id = user.user_id, "Character updated");

    Ok(Json(DataResponse { data: character }))
}

/// DELETE /api/v1/characters/{id}
pub async fn delete(
    user: AuthUser,
    State(state): State<AppState>,
    Path(character_id): Path<DbId>,
) -> AppResult<StatusCode> {
    find_owned_character(&state, &user, character_id).await?;
    state.store.delete_character(character_id).await;

    tracing::info!(character_id, user_id = user.user_id, "Character deleted");

    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn find_character(state: &AppState, id: DbId) -> AppResult<Character> {
    state
        .store
        .find_character(id)
        .await
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Character",
            id,
        }))
}

/// Load a character that `viewer` may read: any public one, or a private
/// one they own.
pub(crate) async fn find_visible_character(
    state: &AppState,
    viewer: Option<&AuthUser>,
    id: DbId,
) -> AppResult<Character> {
    let character = find_character(state, id).await?;
    let is_owner = viewer.is_some_and(|u| u.user_id == character.owner_id);
    if !character.is_public && !is_owner {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Character",
            id,
        }));
    }
    Ok(character)
}

/// Load a character and require that `user` owns it.
pub(crate) async fn find_owned_character(
    state: &AppState,
    user: &AuthUser,
    id: DbId,
) -> AppResult<Character> {
    let character = find_character(state, id).await?;
    if character.owner_id != user.user_id {
        return Err(AppError::Core(CoreError::Forbidden(
            "Only the owner may modify this character".into(),
        )));
    }
    Ok(character)
}

/// Trim and bound-check a character name, returning the trimmed form.
fn validate_name(name: &str) -> Result<String, CoreError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("Character name must not be empty".into()));
    }
    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err(CoreError::Validation(format!(
            "Character name must be at most {MAX_NAME_LENGTH} characters"
        )));
    }
    Ok(trimmed.to_string())
}
