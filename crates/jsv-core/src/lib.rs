//! # jsv-core — JSON Value Model
//!
//! The leaf crate of the jsv workspace. Instances and schemas are carried as
//! `serde_json::Value` (with insertion-ordered objects); this crate adds the
//! operations the validator needs on top of that model.
//!
//! ## Key Design Principles
//!
//! 1. **Closed kind set.** [`JsonKind`] names the seven JSON Schema kinds.
//!    `integer` is a refinement of `number`, never a separate representation.
//!
//! 2. **Structural equality, not `PartialEq`.** `enum`, `const` and
//!    `uniqueItems` compare with [`json_equal`], which treats `1` and `1.0`
//!    as equal and ignores object key order.
//!
//! 3. **Exact integer arithmetic where possible.** Numeric comparison and
//!    divisibility in [`numeric`] stay in `i64`/`u64` until a float forces
//!    the `f64` path.
//!
//! 4. **One pointer type.** [`JsonPointer`] is used both for `$ref` fragments
//!    and for the instance/schema locations reported in validation output.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `jsv-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod equality;
pub mod error;
pub mod kind;
pub mod numeric;
pub mod parse;
pub mod pointer;

// Re-export primary types for ergonomic imports.
pub use equality::{find_duplicate, json_equal};
pub use error::CoreError;
pub use kind::{JsonKind, UnknownKind};
pub use numeric::{compare_numbers, is_integral, is_multiple_of};
pub use parse::{parse_json, parse_yaml};
pub use pointer::JsonPointer;
