//! Route definitions for characters and their status buckets.

use axum::routing::{get, put};
use axum::Router;

use crate::handlers::{character, status};
use crate::state::AppState;

/// Routes mounted at `/characters`.
///
/// ```text
/// GET    /                          -> list_mine
/// POST   /                          -> create
/// GET    /public                    -> list_public
/// GET    /{id}                      -> get_by_id
/// PUT    /{id}                      -> update
/// DELETE /{id}                      -> delete
/// GET    /{id}/status               -> get_status
/// PUT    /{id}/status/{bucket}      -> report_status
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(character::list_mine).post(character::create))
        .route("/public", get(character::list_public))
        .route(
            "/{id}",
            get(character::get_by_id)
                .put(character::update)
                .delete(character::delete),
        )
        .route("/{id}/status", get(status::get_status))
        .route("/{id}/status/{bucket}", put(status::report_status))
}
