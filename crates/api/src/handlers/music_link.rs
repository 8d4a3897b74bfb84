//! Link check used by the settings form while the owner types.

use axum::Json;
use beacon_core::music_link::parse_music_link;
use serde::{Deserialize, Serialize};

use crate::response::DataResponse;

/// Request body for `POST /music-links/parse`.
#[derive(Debug, Deserialize, Serialize)]
pub struct ParseLinkRequest {
    pub link: String,
}

/// Parse outcome. `empty` lets the form stay quiet for an unset link while
/// still flagging a non-empty link that did not parse.
#[derive(Debug, Serialize, Deserialize)]
pub struct ParseLinkResponse {
    pub empty: bool,
    pub valid: bool,
    pub url: Option<String>,
}

/// POST /api/v1/music-links/parse
pub async fn parse(Json(input): Json<ParseLinkRequest>) -> Json<DataResponse<ParseLinkResponse>> {
    let url = parse_music_link(&input.link);
    Json(DataResponse {
        data: ParseLinkResponse {
            empty: input.link.trim().is_empty(),
            valid: url.is_some(),
            url,
        },
    })
}
