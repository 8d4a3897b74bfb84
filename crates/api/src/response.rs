//! Shared response envelope types for API handlers.
//!
//! All API responses use a `{ "data": ... }` envelope. Use [`DataResponse`]
//! instead of ad-hoc `serde_json::json!({ "data": ... })` so handlers stay
//! typed.

use serde::{Deserialize, Serialize};

/// Standard `{ "data": T }` response envelope.
///
/// Also deserializable so typed clients can unwrap it.
#[derive(Debug, Serialize, Deserialize)]
pub struct DataResponse<T> {
    pub data: T,
}
