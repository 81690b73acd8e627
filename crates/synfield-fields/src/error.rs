//! Error types for the field graph layer.

use thiserror::Error;

/// Errors raised while declaring a schema, running the queue, or updating
/// a field's value.
#[derive(Debug, Error)]
pub enum FieldsError {
    /// A type or field was declared after [`crate::registry::TypeRegistry::flatten_type_hierarchy`]
    /// had already run.
    #[error("schema is frozen, cannot declare `{what}`")]
    SchemaFrozen { what: String },

    /// The same (synapse/field, input, output) triple was linked twice.
    #[error("duplicate link: {0}")]
    DuplicateLink(String),

    /// An internal invariant was violated (re-entrant field update without
    /// an interceptor, missing required input link, etc).
    #[error("logic error: {0}")]
    Logic(String),

    /// [`crate::queue::Queue::process`] ran past its configured timeout.
    #[error("queue processing timed out after {millis}ms")]
    Timeout { millis: u64 },

    /// A lock could not be acquired (poisoned, or a reentrant write
    /// attempt detected).
    #[error("lock error: {0}")]
    Lock(String),
}

impl FieldsError {
    pub fn schema_frozen(what: impl Into<String>) -> Self {
        Self::SchemaFrozen { what: what.into() }
    }

    pub fn duplicate_link(what: impl Into<String>) -> Self {
        Self::DuplicateLink(what.into())
    }

    pub fn logic(what: impl Into<String>) -> Self {
        Self::Logic(what.into())
    }

    pub fn timeout(millis: u64) -> Self {
        Self::Timeout { millis }
    }

    pub fn lock(what: impl Into<String>) -> Self {
        Self::Lock(what.into())
    }
}

/// Crate-local result alias.
pub type Result<T> = std::result::Result<T, FieldsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_frozen_message_includes_what() {
        let e = FieldsError::schema_frozen("FieldDefinition(foo)");
        assert!(e.to_string().contains("FieldDefinition(foo)"));
    }

    #[test]
    fn timeout_message_includes_millis() {
        let e = FieldsError::timeout(250);
        assert!(e.to_string().contains("250"));
    }
}
