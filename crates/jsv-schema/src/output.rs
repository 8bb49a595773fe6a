//! # Validation Output
//!
//! What a validation run reports:
//!
//! - [`ValidationError`]: one failed assertion, with the instance location,
//!   the schema location of the keyword, the keyword, and a message.
//! - [`ReferenceFault`]: a schema-level problem met while following a
//!   `$ref` (cycle, missing document, bad pointer). The branch that hit it
//!   counts as failed, and the fault is never absorbed by `anyOf`,
//!   `oneOf` or `not`.
//! - [`Annotation`]: a `title`/`description`/`default`/`examples`/`format`
//!   value attached to an instance location. Annotations from subschemas
//!   that failed are dropped.

use std::fmt;

use jsv_core::JsonPointer;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::error::SchemaError;
use crate::keyword::Keyword;

/// A single failed assertion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationError {
    /// JSON Pointer to the violating value in the instance.
    pub instance_path: JsonPointer,
    /// JSON Pointer to the keyword in the schema, through any `$ref`s taken.
    pub schema_path: JsonPointer,
    /// The keyword that failed.
    pub keyword: Keyword,
    /// Human-readable description.
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.instance_path.is_root() {
            write!(f, "  (root): {}", self.message)
        } else {
            write!(f, "  {}: {}", self.instance_path, self.message)
        }
    }
}

/// A schema-level error encountered during a run.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceFault {
    /// Instance location being validated when the fault occurred.
    pub instance_path: JsonPointer,
    /// Schema location of the `$ref` that could not be followed.
    pub schema_path: JsonPointer,
    /// The underlying error.
    pub error: SchemaError,
}

impl fmt::Display for ReferenceFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "  {} [{}]: {}", self.schema_path, self.error.code(), self.error)
    }
}

impl Serialize for ReferenceFault {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ReferenceFault", 4)?;
        state.serialize_field("instance_path", &self.instance_path)?;
        state.serialize_field("schema_path", &self.schema_path)?;
        state.serialize_field("kind", self.error.code())?;
        state.serialize_field("message", &self.error.to_string())?;
        state.end()
    }
}

/// An annotation value collected at an instance location.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Annotation {
    pub instance_path: JsonPointer,
    pub schema_path: JsonPointer,
    pub keyword: Keyword,
    pub value: Value,
}

/// Outcome of one validation run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationResult {
    valid: bool,
    errors: Vec<ValidationError>,
    reference_faults: Vec<ReferenceFault>,
    annotations: Vec<Annotation>,
}

impl ValidationResult {
    pub(crate) fn from_output(output: Output) -> Self {
        Self {
            valid: output.is_valid(),
            errors: output.errors,
            reference_faults: output.faults,
            annotations: output.annotations,
        }
    }

    /// True when there are no assertion failures and no reference faults.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Assertion failures in evaluation order.
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Schema-level errors met during the run.
    pub fn reference_faults(&self) -> &[ReferenceFault] {
        &self.reference_faults
    }

    /// Collected annotations in evaluation order.
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// Failures only, for error reporting.
    pub fn violations(&self) -> ValidationViolations {
        ValidationViolations {
            errors: self.errors.clone(),
            faults: self.reference_faults.clone(),
        }
    }
}

/// Collection of failures from a rejected document.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationViolations {
    errors: Vec<ValidationError>,
    faults: Vec<ReferenceFault>,
}

impl ValidationViolations {
    /// Total number of failures of both kinds.
    pub fn len(&self) -> usize {
        self.errors.len() + self.faults.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.faults.is_empty()
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    pub fn faults(&self) -> &[ReferenceFault] {
        &self.faults
    }
}

impl fmt::Display for ValidationViolations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lines = self
            .errors
            .iter()
            .map(|e| e.to_string())
            .chain(self.faults.iter().map(|e| e.to_string()));
        for (i, line) in lines.enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            f.write_str(&line)?;
        }
        Ok(())
    }
}

/// Accumulator for one subschema evaluation.
#[derive(Debug, Default)]
pub(crate) struct Output {
    pub(crate) errors: Vec<ValidationError>,
    pub(crate) faults: Vec<ReferenceFault>,
    pub(crate) annotations: Vec<Annotation>,
}

impl Output {
    pub(crate) fn is_valid(&self) -> bool {
        self.errors.is_empty() && self.faults.is_empty()
    }

    /// Take everything from a subschema whose outcome propagates.
    /// Its annotations survive only if it passed.
    pub(crate) fn merge(&mut self, sub: Output) {
        let passed = sub.is_valid();
        self.errors.extend(sub.errors);
        self.faults.extend(sub.faults);
        if passed {
            self.annotations.extend(sub.annotations);
        }
    }

    /// Take from a subschema whose assertion failures are consumed by the
    /// caller: faults always propagate, annotations only if it passed.
    pub(crate) fn absorb(&mut self, sub: Output) {
        let passed = sub.is_valid();
        self.faults.extend(sub.faults);
        if passed {
            self.annotations.extend(sub.annotations);
        }
    }

    pub(crate) fn fail(
        &mut self,
        instance_path: &JsonPointer,
        schema_path: JsonPointer,
        keyword: Keyword,
        message: String,
    ) {
        self.errors.push(ValidationError {
            instance_path: instance_path.clone(),
            schema_path,
            keyword,
            message,
        });
    }

    pub(crate) fn fault(&mut self, instance_path: &JsonPointer, schema_path: JsonPointer, error: SchemaError) {
        tracing::debug!(
            instance = %instance_path,
            schema = %schema_path,
            code = error.code(),
            "reference fault"
        );
        self.faults.push(ReferenceFault {
            instance_path: instance_path.clone(),
            schema_path,
            error,
        });
    }
}
