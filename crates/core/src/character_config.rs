//! Per-character display configuration and the combined status view.
//!
//! The config blob is authored in the settings UI and stored with the
//! character. [`resolve_status_view`] is what the public page renders.

use serde::{Deserialize, Serialize};

use crate::display_rules::{
    resolve_display_message, validate_default_message, validate_timeout_rules, DefaultMessage,
    DisplayMessage, TimeoutRule,
};
use crate::error::CoreError;
use crate::music_link::parse_music_link;
use crate::status::{
    latest_update, most_recent_update_label, resolve_fields, ResolvedField, StatusBuckets,
};
use crate::status_fields::{validate_status_fields, StatusFieldConfig};
use crate::types::Timestamp;

/// Display rules and field definitions for one character.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CharacterConfig {
    #[serde(default)]
    pub timeout_messages: Vec<TimeoutRule>,
    #[serde(default)]
    pub default_message: DefaultMessage,
    #[serde(default)]
    pub status_fields: Vec<StatusFieldConfig>,
}

impl CharacterConfig {
    /// Run every edit-time check. The first failure is returned.
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_timeout_rules(&self.timeout_messages)?;
        validate_default_message(&self.default_message)?;
        validate_status_fields(&self.status_fields)?;
        Ok(())
    }
}

/// Everything the status page needs, derived at a single instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusView {
    pub display: DisplayMessage,
    /// Player URL for `display.music_link`, only ever built by the link parser.
    pub music_embed_url: Option<String>,
    pub fields: Vec<ResolvedField>,
    pub last_updated: Option<Timestamp>,
    pub last_updated_label: Option<String>,
}

pub fn resolve_status_view(
    config: &CharacterConfig,
    buckets: &StatusBuckets,
    now: Timestamp,
) -> StatusView {
    let display = resolve_display_message(
        buckets,
        &config.timeout_messages,
        &config.default_message,
        now,
    );
    let music_embed_url = display.music_link.as_deref().and_then(parse_music_link);

    StatusView {
        display,
        music_embed_url,
        fields: resolve_fields(buckets, &config.status_fields),
        last_updated: latest_update(buckets),
        last_updated_label: most_recent_update_label(buckets, now),
    }
}
