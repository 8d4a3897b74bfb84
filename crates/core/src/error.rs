//! Domain error type shared by the core validators and the API layer.

use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Build a [`CoreError::Validation`] scoped to a named location, e.g.
    /// `timeout_messages[2]`.
    pub fn invalid_at(location: impl std::fmt::Display, message: impl std::fmt::Display) -> Self {
        CoreError::Validation(format!("{location}: {message}"))
    }

    /// Prefix a validation message with `location`; other variants pass
    /// through untouched.
    pub fn within(self, location: impl std::fmt::Display) -> Self {
        match self {
            CoreError::Validation(msg) => CoreError::invalid_at(location, msg),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_at_prefixes_location() {
        let err = CoreError::invalid_at("status_fields[1]", "key must not be empty");
        assert_eq!(
            err.to_string(),
            "Validation failed: status_fields[1]: key must not be empty"
        );
    }

    #[test]
    fn within_only_touches_validation() {
        let err = CoreError::Validation("bad link".into()).within("default_message");
        assert_eq!(err.to_string(), "Validation failed: default_message: bad link");

        let err = CoreError::Conflict("taken".into()).within("default_message");
        assert_eq!(err.to_string(), "Conflict: taken");
    }

    #[test]
    fn not_found_names_entity_and_id() {
        let err = CoreError::NotFound {
            entity: "Character",
            id: 7,
        };
        assert_eq!(err.to_string(), "Entity not found: Character with id 7");
    }
}
