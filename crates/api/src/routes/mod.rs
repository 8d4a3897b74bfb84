pub mod character;
pub mod health;

use axum::routing::post;
use axum::Router;

use crate::handlers::{auth, music_link};
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/register                                   register (public)
/// /auth/login                                      login (public)
/// /auth/refresh                                    refresh (public)
/// /auth/logout                                     logout (requires auth)
///
/// /characters                                      list own, create (auth)
/// /characters/public                               public listing with resolved status
/// /characters/{id}                                 get (public, or owner if private), update, delete (owner)
/// /characters/{id}/status                          buckets + resolved view (same visibility as get)
/// /characters/{id}/status/{bucket}                 report readings (owner, PUT)
///
/// /music-links/parse                               parse a share link (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes())
        .nest("/characters", character::router())
        .route("/music-links/parse", post(music_link::parse))
}

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh))
        .route("/logout", post(auth::logout))
}
