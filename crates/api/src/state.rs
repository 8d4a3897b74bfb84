use std::sync::Arc;
use std::time::Instant;

use crate::config::ServerConfig;
use crate::store::MemoryStore;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheap to clone: everything lives behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Users, sessions, characters and their status buckets.
    pub store: Arc<MemoryStore>,
    /// Server configuration (JWT settings are read by the auth extractor).
    pub config: Arc<ServerConfig>,
    /// When the process built its state; `/health` reports uptime from it.
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            store: Arc::new(MemoryStore::default()),
            config: Arc::new(config),
            started_at: Instant::now(),
        }
    }
}
