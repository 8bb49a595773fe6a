//! # Schema Catalog
//!
//! Loads a directory of schema files into a [`SchemaRegistry`] and
//! validates documents against schemas by file name.
//!
//! ## Schema Resolution
//!
//! Every `*.json` file in the directory (including `*.schema.json`) is
//! registered under `jsv://local/<filename>` and under its own `$id`, if it
//! declares one. A cross-file `$ref` such as `"address.schema.json"` or
//! `"https://example.com/schemas/address.schema.json"` therefore resolves
//! to the loaded file: the registry falls back to the last path segment
//! when no document matches the full URI.
//!
//! Loading happens once; the catalog is read-only afterwards and is
//! `Send + Sync`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use crate::error::SchemaError;
use crate::options::ValidationOptions;
use crate::output::{ValidationResult, ValidationViolations};
use crate::registry::SchemaRegistry;
use crate::validator::Validator;

/// Error loading schemas or validating a document against one.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// The document did not conform to the schema.
    #[error("validation failed against schema '{schema_name}':\n{violations}")]
    ValidationFailed {
        /// Name of the schema that was validated against.
        schema_name: String,
        /// Every assertion failure and reference fault.
        violations: ValidationViolations,
    },

    /// A schema file could not be read, parsed or compiled.
    #[error("schema load error for '{schema_name}': {reason}")]
    SchemaLoadError { schema_name: String, reason: String },

    /// The document file could not be loaded or parsed.
    #[error("document load error for '{path}': {reason}")]
    DocumentLoadError { path: String, reason: String },

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Load every `*.json` file in `dir` into a new registry.
///
/// Files are registered by file name in sorted order. Subdirectories and
/// other extensions are skipped. Once all files are in, every `$ref`
/// between them must resolve.
///
/// # Errors
///
/// Returns `CatalogError::SchemaLoadError` if the directory cannot be read,
/// any schema file is malformed or fails load-time checks, or a `$ref`
/// leads nowhere.
pub fn load_dir(dir: impl AsRef<Path>) -> Result<SchemaRegistry, CatalogError> {
    let dir = dir.as_ref();
    let entries = std::fs::read_dir(dir).map_err(|e| CatalogError::SchemaLoadError {
        schema_name: dir.display().to_string(),
        reason: format!("cannot read schema directory: {e}"),
    })?;

    let mut files: Vec<(String, PathBuf)> = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            if name.ends_with(".json") {
                files.push((name.to_string(), path.clone()));
            }
        }
    }
    files.sort();

    let mut registry = SchemaRegistry::new();
    for (name, path) in &files {
        let content = std::fs::read_to_string(path)?;
        registry
            .add_text(name, &content)
            .map_err(|e| CatalogError::SchemaLoadError {
                schema_name: name.clone(),
                reason: e.to_string(),
            })?;
    }
    for (name, _) in &files {
        registry
            .check_references(name)
            .map_err(|e| CatalogError::SchemaLoadError {
                schema_name: name.clone(),
                reason: e.to_string(),
            })?;
    }

    tracing::info!(dir = %dir.display(), schemas = files.len(), "loaded schema directory");
    Ok(registry)
}

/// A directory of schemas with validation by file name.
#[derive(Debug, Clone)]
pub struct SchemaCatalog {
    schema_dir: PathBuf,
    registry: Arc<SchemaRegistry>,
    names: Vec<String>,
    options: ValidationOptions,
}

impl SchemaCatalog {
    /// Load all schemas from `schema_dir` with default options.
    ///
    /// # Errors
    ///
    /// As [`load_dir`].
    pub fn new(schema_dir: impl AsRef<Path>) -> Result<Self, CatalogError> {
        Self::with_options(schema_dir, ValidationOptions::default())
    }

    /// Load all schemas from `schema_dir`; validators are built with
    /// `options` (its registry, if any, is replaced by the catalog's).
    ///
    /// # Errors
    ///
    /// As [`load_dir`].
    pub fn with_options(
        schema_dir: impl AsRef<Path>,
        mut options: ValidationOptions,
    ) -> Result<Self, CatalogError> {
        let schema_dir = schema_dir.as_ref().to_path_buf();
        let registry = Arc::new(load_dir(&schema_dir)?);
        let mut names: Vec<String> = registry
            .document_uris()
            .into_iter()
            .filter_map(|uri| uri.rsplit('/').next())
            .map(str::to_string)
            .collect();
        names.sort();
        options.with_registry(Arc::clone(&registry));
        Ok(Self {
            schema_dir,
            registry,
            names,
            options,
        })
    }

    /// The directory schemas were loaded from.
    pub fn schema_dir(&self) -> &Path {
        &self.schema_dir
    }

    pub fn schema_count(&self) -> usize {
        self.names.len()
    }

    /// File names of all loaded schemas, sorted.
    pub fn schema_names(&self) -> Vec<&str> {
        self.names.iter().map(String::as_str).collect()
    }

    /// The JSON of a loaded schema.
    pub fn get_schema(&self, name: &str) -> Option<&Value> {
        self.registry.get_document(name)
    }

    pub fn registry(&self) -> &Arc<SchemaRegistry> {
        &self.registry
    }

    /// Build a validator for the named schema. Other loaded schemas are
    /// available to its `$ref`s.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::SchemaLoadError` if no schema has that name.
    pub fn build_validator(&self, schema_name: &str) -> Result<Validator, CatalogError> {
        if !self.names.iter().any(|n| n == schema_name) {
            return Err(CatalogError::SchemaLoadError {
                schema_name: schema_name.to_string(),
                reason: format!("schema not found in {}", self.schema_dir.display()),
            });
        }
        Ok(self.options.build_for_uri(schema_name)?)
    }

    /// Validate a parsed value against the named schema.
    ///
    /// Returns the full result (with annotations) when the document is
    /// valid.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::ValidationFailed` with every failure if the
    /// document is invalid.
    pub fn validate_document(
        &self,
        instance: &Value,
        schema_name: &str,
    ) -> Result<ValidationResult, CatalogError> {
        let result = self.build_validator(schema_name)?.validate(instance);
        if result.is_valid() {
            Ok(result)
        } else {
            Err(CatalogError::ValidationFailed {
                schema_name: schema_name.to_string(),
                violations: result.violations(),
            })
        }
    }

    /// Load a JSON or YAML document and validate it against the named
    /// schema. `.yaml`/`.yml` files are read as YAML, anything else as JSON.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::DocumentLoadError` if the file cannot be read
    /// or parsed, otherwise as [`validate_document`](Self::validate_document).
    pub fn validate_file(
        &self,
        document_path: &Path,
        schema_name: &str,
    ) -> Result<ValidationResult, CatalogError> {
        let instance = load_document(document_path)?;
        self.validate_document(&instance, schema_name)
            .map_err(|e| match e {
                CatalogError::ValidationFailed { violations, .. } => CatalogError::ValidationFailed {
                    schema_name: format!("{schema_name} ({})", document_path.display()),
                    violations,
                },
                other => other,
            })
    }
}

/// Read a JSON or YAML document from disk, choosing the parser by
/// extension.
///
/// # Errors
///
/// Returns `CatalogError::DocumentLoadError` on read or parse failure.
pub fn load_document(path: &Path) -> Result<Value, CatalogError> {
    let display = path.display().to_string();
    let content = std::fs::read_to_string(path).map_err(|e| CatalogError::DocumentLoadError {
        path: display.clone(),
        reason: format!("cannot read file: {e}"),
    })?;
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let parsed = match ext {
        "yaml" | "yml" => jsv_core::parse_yaml(&content, &display),
        _ => jsv_core::parse_json(&content, &display),
    };
    parsed.map_err(|e| CatalogError::DocumentLoadError {
        path: display,
        reason: e.to_string(),
    })
}
