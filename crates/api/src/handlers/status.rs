//! Handlers for character status buckets.
//!
//! Sync clients report readings with `PUT .../status/{bucket}`; the display
//! page polls `GET .../status` for the buckets plus the resolved view.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use beacon_core::character_config::{resolve_status_view, StatusView};
use beacon_core::error::CoreError;
use beacon_core::status::StatusBuckets;
use beacon_core::types::DbId;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::handlers::character::{find_owned_character, find_visible_character};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Maximum bucket name length, in bytes.
const MAX_BUCKET_NAME_LEN: usize = 64;

/// Request body for `PUT /characters/{id}/status/{bucket}`.
#[derive(Debug, Deserialize, Serialize)]
pub struct ReportStatus {
    /// Must be a JSON object.
    pub data: serde_json::Value,
}

/// Response for `GET /characters/{id}/status`.
#[derive(Debug, Serialize, Deserialize)]
pub struct CharacterStatus {
    pub character_id: DbId,
    pub buckets: StatusBuckets,
    pub view: StatusView,
}

/// GET /api/v1/characters/{id}/status
///
/// Private characters' status is only returned to the owner.
pub async fn get_status(
    user: Option<AuthUser>,
    State(state): State<AppState>,
    Path(character_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let character = find_visible_character(&state, user.as_ref(), character_id).await?;
    let view = resolve_status_view(&character.config, &character.status, Utc::now());

    Ok(Json(DataResponse {
        data: CharacterStatus {
            character_id,
            buckets: character.status,
            view,
        },
    }))
}

/// PUT /api/v1/characters/{id}/status/{bucket}
///
/// Replace one bucket's readings. The server stamps `updated_at` so that
/// staleness is measured against a single clock.
pub async fn report_status(
    user: AuthUser,
    State(state): State<AppState>,
    Path((character_id, bucket)): Path<(DbId, String)>,
    Json(input): Json<ReportStatus>,
) -> AppResult<impl IntoResponse> {
    find_owned_character(&state, &user, character_id).await?;
    validate_bucket_name(&bucket)?;

    let serde_json::Value::Object(data) = input.data else {
        return Err(AppError::BadRequest(
            "Status data must be a JSON object".into(),
        ));
    };

    let point = state
        .store
        .put_status_bucket(character_id, &bucket, data, Utc::now())
        .await
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Character",
            id: character_id,
        }))?;

    tracing::debug!(
        character_id,
        bucket = %bucket,
        keys = point.data.len(),
        "Status bucket reported",
    );

    Ok(Json(DataResponse { data: point }))
}

fn validate_bucket_name(bucket: &str) -> Result<(), CoreError> {
    let valid = !bucket.is_empty()
        && bucket.len() <= MAX_BUCKET_NAME_LEN
        && bucket
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if !valid {
        return Err(CoreError::Validation(format!(
            "Bucket name must be 1-{MAX_BUCKET_NAME_LEN} characters of [A-Za-z0-9_-], got '{bucket}'"
        )));
    }
    Ok(())
}
