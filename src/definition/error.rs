//! Definition errors.

use thiserror::Error;

/// Errors detected while validating a machine definition.
///
/// All of these are fatal: no machine is produced.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DefinitionError {
    #[error("Ambiguous transition: event '{event}' declared more than once from state '{source_state}'")]
    AmbiguousTransition { event: String, source_state: String },

    #[error("Invalid identifier '{value}' used as {role}")]
    InvalidIdentifier { role: &'static str, value: String },

    #[error("Initial event '{event}' collides with a declared event of the same name")]
    NameCollision { event: String },

    #[error("Malformed definition: {0}")]
    Malformed(String),
}
