//! Error types for domain model construction.

use thiserror::Error;

/// Errors raised while building or validating domain values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// An identifier (policy name, scope segment) is not well formed.
    #[error("invalid identifier '{value}' for {field}")]
    InvalidIdentifier { field: String, value: String },

    /// A scope path does not have the number of segments its type requires.
    #[error("scope path '{path}' is not a valid {scope_type} name (expected {expected} segments)")]
    InvalidScopePath {
        scope_type: String,
        path: String,
        expected: usize,
    },

    /// A parameter name collides with a field the approval token binds itself.
    #[error("parameter name '{0}' is reserved")]
    ReservedParameter(String),

    /// A value could not be parsed from its textual form.
    #[error("unknown {kind}: '{value}'")]
    UnknownVariant { kind: &'static str, value: String },
}
