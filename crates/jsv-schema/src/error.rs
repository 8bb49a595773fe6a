//! # Schema Errors
//!
//! Errors that mean the schema (or one of its references) is unusable, as
//! opposed to the instance being invalid. Load-time variants are returned
//! from compilation; reference variants are also carried inside
//! [`ReferenceFault`](crate::output::ReferenceFault)s when met mid-run.

use jsv_core::CoreError;
use thiserror::Error;

/// A problem with a schema document or its references.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    /// A keyword has a value its definition does not allow.
    #[error("invalid schema at '{location}': {reason}")]
    InvalidSchema {
        /// Absolute URI plus JSON Pointer of the offending keyword.
        location: String,
        /// What is wrong.
        reason: String,
    },

    /// A `$ref` names a document or anchor that is not registered, or has
    /// a malformed fragment.
    #[error("unresolvable reference '{reference}': {reason}")]
    UnresolvableReference {
        /// The reference target.
        reference: String,
        /// Why it could not be resolved.
        reason: String,
    },

    /// A `$ref` re-entered itself at the same instance location.
    #[error("cyclic reference '{reference}' at instance location '{instance_path}'")]
    CyclicReference {
        /// The reference target that was re-entered.
        reference: String,
        /// Instance location where the cycle was detected.
        instance_path: String,
    },

    /// A `$ref` fragment pointer has a segment that does not exist.
    #[error("invalid pointer in reference '{reference}': {reason}")]
    InvalidPointer {
        /// The reference target.
        reference: String,
        /// Which segment failed.
        reason: String,
    },

    /// Nested reference resolution exceeded the configured depth.
    #[error("reference depth limit of {limit} exceeded at '{reference}'")]
    RecursionLimit {
        /// The reference being followed when the limit was hit.
        reference: String,
        /// Configured maximum depth.
        limit: usize,
    },

    /// The schema text could not be parsed.
    #[error(transparent)]
    Parse(#[from] CoreError),
}

impl SchemaError {
    /// Stable name of the error class, used in serialized output.
    pub fn code(&self) -> &'static str {
        match self {
            SchemaError::InvalidSchema { .. } => "InvalidSchema",
            SchemaError::UnresolvableReference { .. } => "UnresolvableReference",
            SchemaError::CyclicReference { .. } => "CyclicReference",
            SchemaError::InvalidPointer { .. } => "InvalidPointer",
            SchemaError::RecursionLimit { .. } => "RecursionLimit",
            SchemaError::Parse(CoreError::MalformedJson { .. }) => "MalformedJSON",
            SchemaError::Parse(_) => "ParseError",
        }
    }

    pub(crate) fn invalid(location: impl Into<String>, reason: impl Into<String>) -> Self {
        SchemaError::InvalidSchema {
            location: location.into(),
            reason: reason.into(),
        }
    }
}
