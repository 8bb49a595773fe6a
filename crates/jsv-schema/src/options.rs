//! # Validation Options
//!
//! Builder for [`Validator`]s, in the style of `jsonschema::options()`:
//!
//! ```
//! use serde_json::json;
//!
//! let mut opts = jsv_schema::options();
//! opts.assert_formats(true).max_reference_depth(64);
//! let validator = opts.build(&json!({"format": "ipv4"})).unwrap();
//! assert!(!validator.is_valid(&json!("300.1.1.1")));
//! ```
//!
//! The plain settings also deserialize from configuration:
//!
//! ```
//! let opts: jsv_schema::ValidationOptions =
//!     serde_json::from_str(r#"{"assert_formats": true}"#).unwrap();
//! assert!(opts.asserts_formats());
//! ```

use std::sync::Arc;

use serde::Deserialize;

use crate::error::SchemaError;
use crate::registry::SchemaRegistry;
use crate::validator::Validator;

/// Base URI for documents that do not declare an absolute `$id`.
pub const DEFAULT_BASE_URI: &str = "jsv://local/";

/// Default bound on nested `$ref` resolution within one run.
pub const DEFAULT_MAX_REFERENCE_DEPTH: usize = 256;

/// Start building a validator with default options.
pub fn options() -> ValidationOptions {
    ValidationOptions::default()
}

/// Settings applied when building and running a [`Validator`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidationOptions {
    base_uri: String,
    assert_formats: bool,
    max_reference_depth: usize,
    collect_annotations: bool,
    #[serde(skip)]
    registry: Option<Arc<SchemaRegistry>>,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            base_uri: DEFAULT_BASE_URI.to_string(),
            assert_formats: false,
            max_reference_depth: DEFAULT_MAX_REFERENCE_DEPTH,
            collect_annotations: true,
            registry: None,
        }
    }
}

impl ValidationOptions {
    /// Documents to resolve cross-document `$ref`s against.
    pub fn with_registry(&mut self, registry: Arc<SchemaRegistry>) -> &mut Self {
        self.registry = Some(registry);
        self
    }

    /// URI the root schema is registered under when it has no absolute
    /// `$id`. Relative references in the root resolve against it.
    pub fn with_base_uri(&mut self, uri: impl Into<String>) -> &mut Self {
        self.base_uri = uri.into();
        self
    }

    /// Make recognized `format` values assertions instead of annotations.
    pub fn assert_formats(&mut self, yes: bool) -> &mut Self {
        self.assert_formats = yes;
        self
    }

    /// Maximum number of nested `$ref`s followed in one run.
    pub fn max_reference_depth(&mut self, depth: usize) -> &mut Self {
        self.max_reference_depth = depth;
        self
    }

    /// Record `title`, `description`, `default`, `examples` and `format`.
    pub fn collect_annotations(&mut self, yes: bool) -> &mut Self {
        self.collect_annotations = yes;
        self
    }

    pub fn asserts_formats(&self) -> bool {
        self.assert_formats
    }

    pub fn reference_depth_limit(&self) -> usize {
        self.max_reference_depth
    }

    pub fn collects_annotations(&self) -> bool {
        self.collect_annotations
    }

    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    /// Compile `schema` and build a validator for it.
    ///
    /// The schema is added to a copy of the configured registry (or to an
    /// empty one) under the base URI; the configured registry itself is
    /// left untouched. With a configured registry, `$ref`s to other
    /// documents must resolve too. Without one they are left to fault at
    /// validation time.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::InvalidSchema` if the schema fails load-time
    /// checks, and `UnresolvableReference` or `InvalidPointer` for a `$ref`
    /// that leads nowhere.
    pub fn build(&self, schema: &serde_json::Value) -> Result<Validator, SchemaError> {
        let mut registry = self
            .registry
            .as_deref()
            .cloned()
            .unwrap_or_default();
        let uri = registry.add_document(&self.base_uri, schema.clone())?;
        if self.registry.is_some() {
            registry.check_references(uri.as_str())?;
        }
        self.build_in(Arc::new(registry), uri.as_str())
    }

    /// Build a validator for a document already in the configured registry.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::UnresolvableReference` if no registry is
    /// configured or it has no document under `uri`, and
    /// `UnresolvableReference` or `InvalidPointer` if one of the document's
    /// `$ref`s leads nowhere.
    pub fn build_for_uri(&self, uri: &str) -> Result<Validator, SchemaError> {
        let registry = self
            .registry
            .clone()
            .ok_or_else(|| SchemaError::UnresolvableReference {
                reference: uri.to_string(),
                reason: "no schema registry configured".to_string(),
            })?;
        registry.check_references(uri)?;
        self.build_in(registry, uri)
    }

    fn build_in(&self, registry: Arc<SchemaRegistry>, uri: &str) -> Result<Validator, SchemaError> {
        let root = registry
            .root(uri)
            .ok_or_else(|| SchemaError::UnresolvableReference {
                reference: uri.to_string(),
                reason: "no document is registered under this URI".to_string(),
            })?;
        let mut runtime = self.clone();
        runtime.registry = None;
        Ok(Validator::new(registry, root, runtime))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let opts = options();
        assert!(!opts.asserts_formats());
        assert!(opts.collects_annotations());
        assert_eq!(opts.reference_depth_limit(), DEFAULT_MAX_REFERENCE_DEPTH);
        assert_eq!(opts.base_uri(), DEFAULT_BASE_URI);
    }

    #[test]
    fn test_deserialize_rejects_unknown_fields() {
        let err = serde_json::from_str::<ValidationOptions>(r#"{"strict": true}"#).unwrap_err();
        assert!(err.to_string().contains("strict"));
        let opts: ValidationOptions =
            serde_json::from_str(r#"{"max_reference_depth": 8, "collect_annotations": false}"#)
                .unwrap();
        assert_eq!(opts.reference_depth_limit(), 8);
        assert!(!opts.collects_annotations());
    }

    #[test]
    fn test_build_leaves_configured_registry_untouched() {
        let registry = Arc::new(SchemaRegistry::new());
        let mut opts = options();
        opts.with_registry(Arc::clone(&registry));
        opts.build(&json!({"type": "string"})).unwrap();
        assert_eq!(registry.document_count(), 0);
    }

    #[test]
    fn test_build_for_uri_requires_registry() {
        let err = options().build_for_uri("person.json").unwrap_err();
        assert!(matches!(err, SchemaError::UnresolvableReference { .. }));

        let mut registry = SchemaRegistry::new();
        registry.add_document("person.json", json!({"type": "object"})).unwrap();
        let mut opts = options();
        opts.with_registry(Arc::new(registry));
        let validator = opts.build_for_uri("person.json").unwrap();
        assert!(validator.is_valid(&json!({})));
        assert!(opts.build_for_uri("missing.json").is_err());
    }

    #[test]
    fn test_cross_document_references_checked_with_registry() {
        let schema = json!({"properties": {"home": {"$ref": "address.json"}}});
        assert!(options().build(&schema).is_ok());

        let mut opts = options();
        opts.with_registry(Arc::new(SchemaRegistry::new()));
        let err = opts.build(&schema).unwrap_err();
        assert_eq!(err.code(), "UnresolvableReference");

        let mut registry = SchemaRegistry::new();
        registry.add_document("address.json", json!({"type": "object"})).unwrap();
        opts.with_registry(Arc::new(registry));
        assert!(opts.build(&schema).unwrap().is_valid(&json!({"home": {}})));
    }

    #[test]
    fn test_invalid_schema_fails_build() {
        let err = options().build(&json!({"multipleOf": 0})).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidSchema { .. }));
    }
}
