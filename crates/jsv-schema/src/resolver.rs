//! # Reference Resolution
//!
//! Maps an absolute `$ref` target to a compiled node.
//!
//! A target is split into document and fragment. The document part selects
//! a resource in the [`SchemaRegistry`]. The fragment, after
//! percent-decoding, is one of:
//!
//! - empty: the resource root;
//! - starting with `/`: a JSON Pointer into the resource;
//! - anything else: a named anchor declared with `$id: "#name"` or
//!   `$anchor`.
//!
//! Pointer targets compiled as part of their document come straight from
//! the index, including nodes inside embedded `$id` resources. Other
//! locations (for example under an unrecognized keyword) are compiled on
//! demand from the stored JSON, under the base set by the nearest `$id`
//! above them; the registry is not modified.
//!
//! Cycle detection is not done here: it needs the instance location, so
//! the validator keeps the visited set.

use std::sync::Arc;

use jsv_core::JsonPointer;
use url::Url;

use crate::compile::{compile_fragment, resource_key};
use crate::error::SchemaError;
use crate::registry::SchemaRegistry;
use crate::schema::Schema;

/// A resolved reference.
#[derive(Debug, Clone)]
pub struct Resolved {
    /// The designated node.
    pub schema: Arc<Schema>,
    /// Canonical `resource#fragment` form of the target. Two spellings of
    /// the same pointer resolve to the same location.
    pub location: String,
}

/// Resolves references against a registry.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'r> {
    registry: &'r SchemaRegistry,
}

impl<'r> Resolver<'r> {
    /// A resolver over `registry`.
    pub fn new(registry: &'r SchemaRegistry) -> Self {
        Self { registry }
    }

    /// Resolve `reference` as written inside a schema whose base URI is
    /// `base`.
    ///
    /// # Errors
    ///
    /// As [`resolve_uri`](Self::resolve_uri); additionally
    /// `UnresolvableReference` if `reference` is not a URI reference.
    pub fn resolve(&self, base: &Url, reference: &str) -> Result<Resolved, SchemaError> {
        let target = base
            .join(reference)
            .map_err(|e| SchemaError::UnresolvableReference {
                reference: reference.to_string(),
                reason: format!("not a valid URI reference: {e}"),
            })?;
        self.resolve_uri(&target)
    }

    /// Resolve an absolute target URI.
    ///
    /// # Errors
    ///
    /// - `UnresolvableReference` if no document is registered for the
    ///   target, the anchor is unknown, or the fragment is malformed.
    /// - `InvalidPointer` if a pointer segment does not exist.
    /// - `InvalidSchema` if an on-demand compiled location is not a schema.
    pub fn resolve_uri(&self, target: &Url) -> Result<Resolved, SchemaError> {
        let reference = target.to_string();
        let unresolvable = |reason: String| SchemaError::UnresolvableReference {
            reference: reference.clone(),
            reason,
        };

        let resource = self.registry.lookup(target).ok_or_else(|| {
            unresolvable(format!(
                "no document is registered for '{}'",
                resource_key(target).1
            ))
        })?;
        let fragment = percent_decode(target.fragment().unwrap_or(""))
            .ok_or_else(|| unresolvable("fragment is not valid percent-encoded UTF-8".to_string()))?;

        if fragment.is_empty() {
            let schema = resource
                .root()
                .cloned()
                .ok_or_else(|| unresolvable("document has no root schema".to_string()))?;
            return Ok(Resolved {
                schema,
                location: format!("{}#", resource.uri),
            });
        }

        if fragment.starts_with('/') {
            let pointer = JsonPointer::parse(&fragment).map_err(|e| unresolvable(e.to_string()))?;
            let canonical = pointer.to_string();
            let location = format!("{}#{}", resource.uri, canonical);
            if let Some(schema) = resource.index.get(&canonical) {
                return Ok(Resolved {
                    schema: Arc::clone(schema),
                    location,
                });
            }
            let value = pointer
                .resolve(&resource.raw)
                .map_err(|e| SchemaError::InvalidPointer {
                    reference: reference.clone(),
                    reason: e.to_string(),
                })?;
            tracing::trace!(location = %location, "compiling reference target on demand");
            let schema = compile_fragment(resource, &pointer, value)?;
            return Ok(Resolved { schema, location });
        }

        let schema = resource
            .anchors
            .get(&fragment)
            .cloned()
            .ok_or_else(|| unresolvable(format!("no anchor named '{fragment}' in '{}'", resource.uri)))?;
        Ok(Resolved {
            schema,
            location: format!("{}#{}", resource.uri, fragment),
        })
    }
}

/// Decode `%XX` escapes. Returns `None` on a truncated escape, a non-hex
/// digit, or bytes that are not UTF-8.
fn percent_decode(text: &str) -> Option<String> {
    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = text.get(i + 1..i + 3)?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}
