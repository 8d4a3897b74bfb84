//! Liveness check, mounted at the root rather than under `/api/v1`.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_secs: u64,
}

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/health",
        get(|State(state): State<AppState>| async move {
            Json(HealthResponse {
                status: "ok",
                version: env!("CARGO_PKG_VERSION"),
                uptime_secs: state.started_at.elapsed().as_secs(),
            })
        }),
    )
}
