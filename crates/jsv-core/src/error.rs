//! # Error Types
//!
//! Errors raised while turning text into values or walking a value with a
//! JSON Pointer. Schema-level errors live in `jsv-schema`; these are the
//! parser and pointer failures it wraps.

use thiserror::Error;

/// Errors produced by the value model.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// Serialized text could not be parsed.
    #[error("malformed JSON in '{source_name}': {reason}")]
    MalformedJson {
        /// File name or other label for the text that failed to parse.
        source_name: String,
        /// Parser message, including line/column where available.
        reason: String,
    },

    /// YAML text could not be parsed or has no JSON equivalent.
    #[error("malformed YAML in '{source_name}': {reason}")]
    MalformedYaml {
        /// File name or other label for the text that failed to parse.
        source_name: String,
        /// Parser or conversion message.
        reason: String,
    },

    /// A JSON Pointer string is not syntactically valid.
    #[error("malformed JSON pointer '{pointer}': {reason}")]
    MalformedPointer {
        /// The pointer as written.
        pointer: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A JSON Pointer names a location that does not exist in the document.
    #[error("JSON pointer '{pointer}' does not resolve: {reason}")]
    InvalidPointer {
        /// The pointer being resolved.
        pointer: String,
        /// Which segment failed and why.
        reason: String,
    },
}
