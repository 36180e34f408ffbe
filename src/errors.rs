//! Unified error types for the pipeline engine.
//!
//! Every failure is scoped to the single requested operation; nothing here is
//! fatal to the process. Validation, state-conflict, dependency and not-found
//! errors are raised before any write. Authorization is deliberately distinct
//! from not-found; callers that must not leak record existence can collapse
//! the two at their own boundary.

use thiserror::Error;
use uuid::Uuid;

/// Engine error taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or out-of-range input on a single field. Always caller-fixable.
    #[error("Validation failed on `{field}`: {message}")]
    Validation {
        /// Name of the offending request field
        field: &'static str,
        /// Human-readable description of the rule that was violated
        message: String,
    },

    /// A referenced id did not resolve to a record.
    #[error("{entity} {id} not found")]
    NotFound {
        /// Entity kind, e.g. "lead"
        entity: &'static str,
        /// The id that failed to resolve
        id: Uuid,
    },

    /// The actor lacks permission for this record.
    #[error("Actor {actor} is not permitted to {action} this {entity}")]
    Authorization {
        /// The denied actor's id
        actor: Uuid,
        /// "read" or "write"
        action: &'static str,
        /// Entity kind the denial applies to
        entity: &'static str,
    },

    /// The operation is not valid for the record's current status.
    #[error("Cannot {action} a {entity} in status `{status}`")]
    StateConflict {
        /// Entity kind
        entity: &'static str,
        /// The status that blocks the operation
        status: String,
        /// The attempted operation
        action: &'static str,
    },

    /// A related entity (user, client, inventory unit) is missing or inactive.
    #[error("Dependency `{entity}` cannot be used: {message}")]
    Dependency {
        /// The related entity kind
        entity: &'static str,
        /// Why the dependency is unusable
        message: String,
    },

    /// Failure surfaced by an external store implementation.
    #[error("Store error: {message}")]
    Store {
        /// Backend-specific description
        message: String,
    },

    /// Configuration could not be read or parsed.
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong while loading configuration
        message: String,
    },
}

impl Error {
    /// Shorthand for a [`Error::Validation`] with an owned message.
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Shorthand for a [`Error::Dependency`] with an owned message.
    pub fn dependency(entity: &'static str, message: impl Into<String>) -> Self {
        Self::Dependency {
            entity,
            message: message.into(),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
