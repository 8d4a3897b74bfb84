//! Bearer-token extractor.

use axum::extract::{FromRequestParts, OptionalFromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use beacon_core::types::DbId;

use crate::error::AppError;
use crate::state::AppState;

/// The caller behind a valid access token.
///
/// Taking `AuthUser` as a handler argument makes the route require login;
/// owner checks are then done against `user_id`. `Option<AuthUser>` is for
/// routes anyone may call: no header yields `None`, but a header carrying a
/// bad or expired token is still a 401 so clients know to refresh.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: DbId,
    pub username: String,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?;
        authenticate(state, token)
    }
}

impl OptionalFromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Option<Self>, Self::Rejection> {
        if !parts.headers.contains_key(AUTHORIZATION) {
            return Ok(None);
        }
        let token = bearer_token(&parts.headers)?;
        authenticate(state, token).map(Some)
    }
}

fn authenticate(state: &AppState, token: &str) -> Result<AuthUser, AppError> {
    let claims = state
        .config
        .jwt
        .decode_access_token(token)
        .map_err(|_| AppError::unauthorized("Invalid or expired token"))?;

    Ok(AuthUser {
        user_id: claims.sub,
        username: claims.username,
    })
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| AppError::unauthorized("Missing Authorization header"))?
        .to_str()
        .map_err(|_| AppError::unauthorized("Authorization header is not valid ASCII"))?;

    value
        .strip_prefix("Bearer ")
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::unauthorized("Expected Authorization: Bearer <token>"))
}
