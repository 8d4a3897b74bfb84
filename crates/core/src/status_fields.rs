//! Status field configuration.
//!
//! A character owner decides which keys of the reported status buckets are
//! shown on the public page and how. This module holds the config type, its
//! edit-time validation, and the value formatter used when rendering.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// How a field's raw JSON value should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldValueType {
    Number,
    Text,
    String,
    Boolean,
}

/// One configured status field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusFieldConfig {
    /// Key looked up in every bucket's `data` map.
    pub key: String,
    pub label: String,
    #[serde(alias = "valueType")]
    pub value_type: FieldValueType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Unit appended when rendering, e.g. `"%"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
}

/// Position of a field inside the list being edited.
///
/// Passed alongside a config instead of being stored in it, so the config
/// value stays a plain record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldContext {
    pub index: usize,
}

impl fmt::Display for FieldContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "status_fields[{}]", self.index)
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a single field in the context of its position.
pub fn validate_status_field(
    config: &StatusFieldConfig,
    ctx: FieldContext,
) -> Result<(), CoreError> {
    if config.key.trim().is_empty() {
        return Err(CoreError::invalid_at(ctx, "key must not be empty"));
    }
    if config.label.trim().is_empty() {
        return Err(CoreError::invalid_at(
            ctx,
            format!("label for '{}' must not be empty", config.key),
        ));
    }
    Ok(())
}

/// Validate a full field list: every entry individually, then key
/// uniqueness across the list.
pub fn validate_status_fields(configs: &[StatusFieldConfig]) -> Result<(), CoreError> {
    let mut seen = HashSet::with_capacity(configs.len());
    for (index, config) in configs.iter().enumerate() {
        let ctx = FieldContext { index };
        validate_status_field(config, ctx)?;
        if !seen.insert(config.key.as_str()) {
            return Err(CoreError::invalid_at(
                ctx,
                format!("duplicate key '{}'", config.key),
            ));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

/// Render a raw value for display according to the field config.
pub fn format_field_value(config: &StatusFieldConfig, value: &Value) -> String {
    let body = match (config.value_type, value) {
        (FieldValueType::Boolean, Value::Bool(b)) => return yes_no(*b).to_string(),
        (FieldValueType::Boolean, Value::String(s)) => match s.as_str() {
            "true" => return yes_no(true).to_string(),
            "false" => return yes_no(false).to_string(),
            _ => s.clone(),
        },
        (_, Value::Number(n)) => format_number(n),
        (_, Value::String(s)) => s.clone(),
        (_, Value::Bool(b)) => b.to_string(),
        (_, Value::Null) => String::new(),
        (_, other) => other.to_string(),
    };

    match config.suffix.as_deref() {
        Some(suffix) if !body.is_empty() => format!("{body}{suffix}"),
        _ => body,
    }
}

fn yes_no(b: bool) -> &'static str {
    if b {
        "yes"
    } else {
        "no"
    }
}

/// Integral floats (`87.0`) render without the fractional part.
fn format_number(n: &serde_json::Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
        _ => n.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
