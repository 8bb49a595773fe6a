//! # jsv-cli — JSON Schema Validation Command-Line Interface
//!
//! A clap-based front end over `jsv-schema`.
//!
//! ## Subcommands
//!
//! - `validate` — Validate JSON/YAML documents against a schema file
//! - `check-schema` — Compile schema files and report load-time errors
//! - `list` — List the schemas in a schema directory
//!
//! ## Exit Status
//!
//! `0` when everything checked is valid, `1` when a document or schema is
//! invalid, `2` when a file cannot be loaded or a schema cannot be built.
//!
//! ## Crate Policy
//!
//! - CLI construction (argument parsing) is separated from business logic.
//! - Handler functions delegate to `jsv-schema` and write to a caller-supplied
//!   writer so they can be tested without a process.

pub mod inspect;
pub mod validate;

use std::io::Write;
use std::process::ExitCode;

use anyhow::Context;

/// Outcome of a handler that ran to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Everything checked was valid.
    Valid,
    /// At least one document or schema was rejected.
    Invalid,
}

impl Outcome {
    pub fn exit_code(self) -> ExitCode {
        match self {
            Outcome::Valid => ExitCode::SUCCESS,
            Outcome::Invalid => ExitCode::from(1),
        }
    }
}

/// Exit status for load and build failures.
pub const EXIT_ERROR: u8 = 2;

/// Flush the handler's output. A handler error wins over a flush error;
/// otherwise output that never reached its destination is an error too.
///
/// # Errors
///
/// The handler's error, or the flush failure.
pub fn finish(outcome: anyhow::Result<Outcome>, out: &mut dyn Write) -> anyhow::Result<Outcome> {
    let flushed = out.flush();
    let outcome = outcome?;
    flushed.context("cannot write output")?;
    Ok(outcome)
}
