//! Status message selection.
//!
//! Owners configure a default message plus any number of timeout rules
//! ("if I have been silent for 24h, show ..."). The displayed message is the
//! rule with the largest threshold that the current silence satisfies.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::music_link::validate_music_link;
use crate::status::{latest_update, StatusBuckets};
use crate::types::Timestamp;

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Show `message` once the freshest bucket is at least `hours` old.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeoutRule {
    pub hours: f64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub music_link: Option<String>,
}

/// Shown when no timeout rule applies.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DefaultMessage {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub music_url: Option<String>,
}

/// The message currently on display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayMessage {
    pub message: String,
    pub music_link: Option<String>,
}

impl From<&DefaultMessage> for DisplayMessage {
    fn from(fallback: &DefaultMessage) -> Self {
        Self {
            message: fallback.message.clone(),
            music_link: fallback.music_url.clone(),
        }
    }
}

impl From<&TimeoutRule> for DisplayMessage {
    fn from(rule: &TimeoutRule) -> Self {
        Self {
            message: rule.message.clone(),
            music_link: rule.music_link.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Hours between `latest` and `now` as a real number, never negative.
pub fn elapsed_hours(latest: Timestamp, now: Timestamp) -> f64 {
    let hours = (now - latest).num_milliseconds() as f64 / MILLIS_PER_HOUR;
    hours.max(0.0)
}

/// Pick the rule to show after `elapsed` hours of silence.
///
/// Rules are tried from the largest threshold down; the first one with
/// `elapsed >= hours` wins, shadowing smaller satisfied thresholds.
pub fn select_timeout_rule(rules: &[TimeoutRule], elapsed: f64) -> Option<&TimeoutRule> {
    let mut ordered: Vec<&TimeoutRule> = rules.iter().collect();
    ordered.sort_by(|a, b| b.hours.total_cmp(&a.hours));
    ordered.into_iter().find(|rule| elapsed >= rule.hours)
}

/// Resolve the message to display for a character right now.
///
/// With no buckets at all there is nothing to measure silence against and
/// the fallback is returned.
pub fn resolve_display_message(
    buckets: &StatusBuckets,
    rules: &[TimeoutRule],
    fallback: &DefaultMessage,
    now: Timestamp,
) -> DisplayMessage {
    let Some(latest) = latest_update(buckets) else {
        return fallback.into();
    };

    match select_timeout_rule(rules, elapsed_hours(latest, now)) {
        Some(rule) => rule.into(),
        None => fallback.into(),
    }
}

// ---------------------------------------------------------------------------
// Validation (edit time)
// ---------------------------------------------------------------------------

/// Validate timeout rules before they are stored.
///
/// Each rule needs a positive finite threshold and a message, thresholds
/// must be unique, and a non-empty music link must be recognisable.
pub fn validate_timeout_rules(rules: &[TimeoutRule]) -> Result<(), CoreError> {
    let mut seen = HashSet::with_capacity(rules.len());
    for (index, rule) in rules.iter().enumerate() {
        let location = format!("timeout_messages[{index}]");

        if !rule.hours.is_finite() || rule.hours <= 0.0 {
            return Err(CoreError::invalid_at(
                location,
                format!("hours must be greater than 0, got {}", rule.hours),
            ));
        }
        if rule.message.trim().is_empty() {
            return Err(CoreError::invalid_at(location, "message must not be empty"));
        }
        if !seen.insert(rule.hours.to_bits()) {
            return Err(CoreError::invalid_at(
                location,
                format!("a rule for {} hours already exists", rule.hours),
            ));
        }
        if let Some(link) = &rule.music_link {
            validate_music_link(link).map_err(|e| e.within(&location))?;
        }
    }
    Ok(())
}

/// Validate the fallback message's music URL, if one is set.
pub fn validate_default_message(fallback: &DefaultMessage) -> Result<(), CoreError> {
    if let Some(url) = &fallback.music_url {
        validate_music_link(url).map_err(|e| e.within("default_message"))?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::{Duration, TimeZone, Utc};

    use super::*;
    use crate::status::StatusDataPoint;

    fn now() -> Timestamp {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn rule(hours: f64, message: &str) -> TimeoutRule {
        TimeoutRule {
            hours,
            message: message.to_string(),
            music_link: None,
        }
    }

    fn fallback() -> DefaultMessage {
        DefaultMessage {
            message: "online".to_string(),
            music_url: Some("https://music.163.com/outchain/player?type=2&id=1".into()),
        }
    }

    fn buckets_updated(ago: Duration) -> StatusBuckets {
        let mut b = StatusBuckets::new();
        b.insert(
            "battery".to_string(),
            StatusDataPoint {
                data: Default::default(),
                updated_at: now() - ago,
            },
        );
        b
    }

    fn abc_rules() -> Vec<TimeoutRule> {
        vec![rule(24.0, "A"), rule(48.0, "B"), rule(72.0, "C")]
    }

    // -- elapsed_hours ----------------------------------------------------

    #[test]
    fn elapsed_is_fractional() {
        let e = elapsed_hours(now() - Duration::minutes(90), now());
        assert!((e - 1.5).abs() < 1e-9);
    }

    #[test]
    fn elapsed_clamps_future_to_zero() {
        assert_eq!(elapsed_hours(now() + Duration::hours(3), now()), 0.0);
    }

    // -- select / resolve -------------------------------------------------

    #[test]
    fn largest_satisfied_threshold_wins() {
        let shown = resolve_display_message(
            &buckets_updated(Duration::hours(100)),
            &abc_rules(),
            &fallback(),
            now(),
        );
        assert_eq!(shown.message, "C");
    }

    #[test]
    fn middle_threshold_when_only_two_satisfied() {
        let shown = resolve_display_message(
            &buckets_updated(Duration::hours(50)),
            &abc_rules(),
            &fallback(),
            now(),
        );
        assert_eq!(shown.message, "B");
    }

    #[test]
    fn below_every_threshold_returns_fallback() {
        let shown = resolve_display_message(
            &buckets_updated(Duration::hours(2)),
            &[rule(24.0, "A")],
            &fallback(),
            now(),
        );
        assert_eq!(shown, DisplayMessage::from(&fallback()));
        assert_eq!(
            shown.music_link.as_deref(),
            Some("https://music.163.com/outchain/player?type=2&id=1")
        );
    }

    #[test]
    fn exact_threshold_is_satisfied() {
        let shown = resolve_display_message(
            &buckets_updated(Duration::hours(24)),
            &[rule(24.0, "A")],
            &fallback(),
            now(),
        );
        assert_eq!(shown.message, "A");
    }

    #[test]
    fn one_minute_short_of_threshold_returns_fallback() {
        let shown = resolve_display_message(
            &buckets_updated(Duration::hours(23) + Duration::minutes(59)),
            &[rule(24.0, "A")],
            &fallback(),
            now(),
        );
        assert_eq!(shown.message, "online");
    }

    #[test]
    fn fractional_threshold() {
        let rules = [rule(1.5, "ninety minutes")];

        let before = resolve_display_message(
            &buckets_updated(Duration::minutes(89)),
            &rules,
            &fallback(),
            now(),
        );
        assert_eq!(before.message, "online");

        let at = resolve_display_message(
            &buckets_updated(Duration::minutes(90)),
            &rules,
            &fallback(),
            now(),
        );
        assert_eq!(at.message, "ninety minutes");
    }

    #[test]
    fn no_buckets_returns_fallback() {
        let shown =
            resolve_display_message(&StatusBuckets::new(), &abc_rules(), &fallback(), now());
        assert_eq!(shown.message, "online");
    }

    #[test]
    fn future_update_never_triggers_rules() {
        let mut b = StatusBuckets::new();
        b.insert(
            "battery".into(),
            StatusDataPoint {
                data: Default::default(),
                updated_at: now() + Duration::hours(500),
            },
        );
        let shown = resolve_display_message(&b, &abc_rules(), &fallback(), now());
        assert_eq!(shown.message, "online");
    }

    #[test]
    fn rule_music_link_is_carried() {
        let mut rules = abc_rules();
        rules[2].music_link = Some("https://music.163.com/song/185868".into());
        let shown = resolve_display_message(
            &buckets_updated(Duration::hours(80)),
            &rules,
            &fallback(),
            now(),
        );
        assert_eq!(
            shown.music_link.as_deref(),
            Some("https://music.163.com/song/185868")
        );
    }

    #[test]
    fn select_ignores_input_order() {
        let rules = vec![rule(72.0, "C"), rule(24.0, "A"), rule(48.0, "B")];
        assert_eq!(select_timeout_rule(&rules, 49.0).map(|r| r.message.as_str()), Some("B"));
        assert_eq!(select_timeout_rule(&rules, 1.0), None);
    }

    // -- validation -------------------------------------------------------

    #[test]
    fn valid_rules_pass() {
        assert!(validate_timeout_rules(&abc_rules()).is_ok());
        assert!(validate_timeout_rules(&[]).is_ok());
    }

    #[test]
    fn non_positive_hours_rejected() {
        assert_matches!(
            validate_timeout_rules(&[rule(0.0, "x")]),
            Err(CoreError::Validation(_))
        );
        assert!(validate_timeout_rules(&[rule(-3.0, "x")]).is_err());
        assert!(validate_timeout_rules(&[rule(f64::NAN, "x")]).is_err());
    }

    #[test]
    fn duplicate_hours_rejected() {
        let err = validate_timeout_rules(&[rule(24.0, "A"), rule(24.0, "B")]).unwrap_err();
        assert!(err.to_string().contains("timeout_messages[1]"));
    }

    #[test]
    fn empty_message_rejected() {
        assert!(validate_timeout_rules(&[rule(5.0, "  ")]).is_err());
    }

    #[test]
    fn music_links_empty_ok_garbage_rejected() {
        let mut r = rule(5.0, "away");
        r.music_link = Some(String::new());
        assert!(validate_timeout_rules(&[r.clone()]).is_ok());

        r.music_link = Some("definitely not music".into());
        let err = validate_timeout_rules(&[r]).unwrap_err();
        assert!(err.to_string().contains("timeout_messages[0]"));
    }

    #[test]
    fn default_message_music_url_checked() {
        assert!(validate_default_message(&fallback()).is_ok());
        assert!(validate_default_message(&DefaultMessage::default()).is_ok());
        let bad = DefaultMessage {
            message: "hi".into(),
            music_url: Some("nope".into()),
        };
        assert_matches!(validate_default_message(&bad), Err(CoreError::Validation(_)));
    }
}
