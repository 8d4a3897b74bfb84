//! Status buckets reported by a character's sync client.
//!
//! A sync client (phone widget, desktop agent, ...) pushes readings grouped
//! into named buckets such as `battery` or `location`. Each bucket carries
//! its own `updated_at`. This module derives per-field values and the
//! "last seen" label from those buckets.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::status_fields::{format_field_value, StatusFieldConfig};
use crate::types::Timestamp;

/// One bucket of readings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusDataPoint {
    pub data: Map<String, Value>,
    pub updated_at: Timestamp,
}

/// All buckets of a character, keyed by bucket name.
///
/// A `BTreeMap` so that iteration (and therefore every tie-break between
/// equal timestamps) follows bucket-name order.
pub type StatusBuckets = BTreeMap<String, StatusDataPoint>;

/// A configured field together with its current value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedField {
    pub key: String,
    pub label: String,
    /// Raw value from the freshest bucket containing the key.
    pub value: Option<Value>,
    /// `value` rendered via [`format_field_value`]; `None` when absent.
    pub display: Option<String>,
    /// Name of the bucket the value came from.
    pub bucket: Option<String>,
    pub updated_at: Option<Timestamp>,
}

/// Most recent `updated_at` across all buckets.
pub fn latest_update(buckets: &StatusBuckets) -> Option<Timestamp> {
    buckets.values().map(|b| b.updated_at).max()
}

/// Find the bucket that supplies `key`: among buckets whose data contains
/// the key, the one with the greatest `updated_at`. On equal timestamps the
/// bucket whose name sorts first wins.
pub fn resolve_field_source<'a>(
    buckets: &'a StatusBuckets,
    key: &str,
) -> Option<(&'a str, &'a StatusDataPoint, &'a Value)> {
    let mut best: Option<(&str, &StatusDataPoint, &Value)> = None;
    for (name, point) in buckets {
        let Some(value) = point.data.get(key) else {
            continue;
        };
        let is_newer = best.map_or(true, |(_, current, _)| point.updated_at > current.updated_at);
        if is_newer {
            best = Some((name.as_str(), point, value));
        }
    }
    best
}

/// Current value of a single status field, or `None` if no bucket has it.
pub fn resolve_field_value<'a>(buckets: &'a StatusBuckets, key: &str) -> Option<&'a Value> {
    resolve_field_source(buckets, key).map(|(_, _, value)| value)
}

/// Resolve every configured field, in config order.
pub fn resolve_fields(buckets: &StatusBuckets, configs: &[StatusFieldConfig]) -> Vec<ResolvedField> {
    configs
        .iter()
        .map(|config| {
            let source = resolve_field_source(buckets, &config.key);
            ResolvedField {
                key: config.key.clone(),
                label: config.label.clone(),
                value: source.map(|(_, _, v)| v.clone()),
                display: source.map(|(_, _, v)| format_field_value(config, v)),
                bucket: source.map(|(name, _, _)| name.to_string()),
                updated_at: source.map(|(_, point, _)| point.updated_at),
            }
        })
        .collect()
}

/// Coarse relative-time label for `then` as seen at `now`.
///
/// Breakpoints: under a minute, under an hour, under a day, then days.
/// Every count is floored. Future timestamps read as "just now".
pub fn relative_time_label(then: Timestamp, now: Timestamp) -> String {
    let minutes = (now - then).num_minutes().max(0);
    if minutes < 1 {
        return "just now".to_string();
    }
    if minutes < 60 {
        return format!("{minutes} minutes ago");
    }
    let hours = minutes / 60;
    if hours < 24 {
        return format!("{hours} hours ago");
    }
    format!("{} days ago", hours / 24)
}

/// Label for the freshest bucket, or `None` when there are no buckets.
pub fn most_recent_update_label(buckets: &StatusBuckets, now: Timestamp) -> Option<String> {
    latest_update(buckets).map(|latest| relative_time_label(latest, now))
}
