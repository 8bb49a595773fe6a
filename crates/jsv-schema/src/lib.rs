//! # jsv-schema — JSON Schema Validation Engine
//!
//! Compiles JSON Schema documents into an immutable node tree, resolves
//! `$ref`/`$id` through a pre-loaded document registry, and validates
//! instances keyword by keyword.
//!
//! ## Pipeline
//!
//! 1. **Compile** ([`compile`]): a schema value becomes an `Arc<Schema>`.
//!    Malformed schemas (negative `minLength`, non-positive `multipleOf`,
//!    duplicate `enum` values, bad regexes, ...) fail here with
//!    [`SchemaError::InvalidSchema`]. Every `$ref` is joined against the
//!    nearest enclosing `$id`, and every subschema is indexed by its JSON
//!    Pointer so references resolve to existing node handles.
//!
//! 2. **Register** ([`registry`]): compiled documents live in a
//!    [`SchemaRegistry`] keyed by absolute URI. The registry is the only
//!    place the resolver looks; it never fetches anything. A `$ref` back
//!    into its own document must resolve when the document is added, so a
//!    dangling pointer fails with [`SchemaError::InvalidPointer`] before
//!    any instance is seen.
//!
//! 3. **Validate** ([`validator`]): a [`Validator`] walks the schema against
//!    an instance. Assertion failures accumulate in a [`ValidationResult`];
//!    reference problems met on the way (`CyclicReference`,
//!    `UnresolvableReference`, ...) are reported separately as
//!    [`ReferenceFault`]s.
//!
//! ## Loading from disk
//!
//! [`SchemaCatalog`] loads a directory of schema files into a registry and
//! validates JSON or YAML documents against schemas by file name.
//!
//! ## Example
//!
//! ```
//! use serde_json::json;
//!
//! let validator = jsv_schema::options()
//!     .build(&json!({"type": "object", "required": ["username", "password"]}))
//!     .unwrap();
//! let result = validator.validate(&json!({"username": "AUser", "location": "UK"}));
//! assert!(!result.is_valid());
//! assert!(result.errors()[0].message.contains("password"));
//! ```
//!
//! ## Crate Policy
//!
//! - Depends only on `jsv-core` internally.
//! - Validation performs no I/O and mutates no shared state; a `Validator`
//!   is `Send + Sync` and may be used from many threads at once.

pub mod catalog;
pub mod compile;
pub mod error;
pub mod format;
pub mod keyword;
pub mod options;
pub mod output;
pub mod registry;
pub mod resolver;
pub mod schema;
pub mod validator;

// Re-export primary types for ergonomic imports.
pub use catalog::{load_dir, load_document, CatalogError, SchemaCatalog};
pub use error::SchemaError;
pub use keyword::Keyword;
pub use options::{options, ValidationOptions, DEFAULT_BASE_URI};
pub use output::{Annotation, ReferenceFault, ValidationError, ValidationResult, ValidationViolations};
pub use registry::SchemaRegistry;
pub use resolver::{Resolved, Resolver};
pub use schema::{Dependency, Items, ObjectSchema, Pattern, Reference, Schema};
pub use validator::Validator;
