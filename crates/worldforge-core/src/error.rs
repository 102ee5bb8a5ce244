//! Domain error types.

use thiserror::Error;
use uuid::Uuid;

/// Top-level domain error type.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A requested entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of entity that was looked up (e.g. `"world"`).
        entity: &'static str,
        /// The identifier that was looked up.
        id: Uuid,
    },

    /// Input rejected by domain validation.
    #[error("validation error: {0}")]
    Validation(String),

    /// A persistence or other infrastructure failure.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}

impl DomainError {
    /// Shorthand for a `NotFound` error.
    #[must_use]
    pub fn not_found(entity: &'static str, id: Uuid) -> Self {
        Self::NotFound { entity, id }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message_names_entity_and_id() {
        let id = Uuid::nil();

        let err = DomainError::not_found("region", id);

        assert_eq!(
            err.to_string(),
            "region not found: 00000000-0000-0000-0000-000000000000"
        );
    }
}
