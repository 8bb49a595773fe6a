//! # Schema Registry
//!
//! The document cache consulted by the resolver. Every compiled document
//! is stored as one or more resources keyed by absolute URI (without
//! fragment): the URI it was added under, plus one per embedded `$id`.
//!
//! The registry is filled before validation and is read-only while
//! validators use it. Adding a document resolves every `$ref` that points
//! back into that same document, so a dangling internal pointer is a load
//! error. References to other documents are checked on request with
//! [`SchemaRegistry::check_references`], once everything they may point at
//! has been added. Populating it from disk is the job of
//! [`load_dir`](crate::catalog::load_dir); nothing here performs I/O.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde_json::Value;
use url::Url;

use crate::compile::{compile_document, resource_key, RefSite};
use crate::error::SchemaError;
use crate::options::DEFAULT_BASE_URI;
use crate::resolver::Resolver;
use crate::schema::Schema;

/// One schema resource: a document root or a subschema with its own `$id`.
#[derive(Debug)]
pub(crate) struct Resource {
    /// Base URI of the resource (no fragment).
    pub(crate) uri: Url,
    /// The resource's JSON as written.
    pub(crate) raw: Value,
    /// Compiled nodes by JSON Pointer relative to the resource root.
    pub(crate) index: HashMap<String, Arc<Schema>>,
    /// Compiled nodes by anchor name.
    pub(crate) anchors: HashMap<String, Arc<Schema>>,
}

impl Resource {
    pub(crate) fn new(uri: Url, raw: Value) -> Self {
        Self {
            uri,
            raw,
            index: HashMap::new(),
            anchors: HashMap::new(),
        }
    }

    pub(crate) fn root(&self) -> Option<&Arc<Schema>> {
        self.index.get("")
    }
}

/// URI-keyed cache of compiled schema documents.
///
/// Cloning is cheap: resources are shared behind `Arc`.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    resources: HashMap<String, Arc<Resource>>,
    documents: Vec<String>,
    /// `$ref` sites of each document, keyed like `documents`.
    references: HashMap<String, Arc<[RefSite]>>,
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaRegistry {
    /// An empty registry whose relative document URIs are joined against
    /// [`DEFAULT_BASE_URI`].
    pub fn new() -> Self {
        Self {
            resources: HashMap::new(),
            documents: Vec::new(),
            references: HashMap::new(),
        }
    }

    /// Compile `document` and register it under `uri`.
    ///
    /// A relative `uri` (such as a bare file name) is joined against the
    /// default base, so `"address.json"` becomes `jsv://local/address.json`.
    /// If the document declares its own `$id`, it is also reachable under
    /// that URI, as is every embedded `$id` resource inside it. Adding a
    /// document under a URI that is already present replaces it.
    ///
    /// Returns the absolute URI the document was registered under.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::InvalidSchema` if the URI is not a valid URI
    /// reference or the document fails load-time checks, and
    /// `UnresolvableReference` or `InvalidPointer` if a `$ref` into the
    /// document itself leads nowhere. The registry is unchanged on error.
    pub fn add_document(&mut self, uri: &str, document: Value) -> Result<Url, SchemaError> {
        let joined = join_base(uri)
            .map_err(|e| SchemaError::invalid(uri, format!("not a valid document URI: {e}")))?;
        let (absolute, key) = resource_key(&joined);
        let compiled = compile_document(&absolute, &document)?;

        let own: HashSet<String> = compiled.resources.keys().cloned().collect();
        let mut shared: HashMap<String, Arc<Resource>> = compiled
            .resources
            .into_iter()
            .map(|(k, resource)| (k, Arc::new(resource)))
            .collect();
        if compiled.root_resource != key {
            if let Some(declared) = shared.get(&compiled.root_resource).cloned() {
                shared.insert(key.clone(), declared);
            }
        }

        let mut next = self.clone();
        next.resources.extend(shared);
        next.verify(&compiled.references, |target| own.contains(target))?;
        tracing::debug!(
            document = %key,
            resources = own.len(),
            references = compiled.references.len(),
            "registered schema document"
        );
        next.references.insert(key.clone(), compiled.references.into());
        if !next.documents.contains(&key) {
            next.documents.push(key);
        }
        *self = next;
        Ok(absolute)
    }

    /// Resolve every `$ref` in the document added under `uri`, including
    /// those that point into other documents.
    ///
    /// # Errors
    ///
    /// Returns the `UnresolvableReference` or `InvalidPointer` of the first
    /// `$ref` that does not resolve, or `InvalidSchema` if `uri` is not a
    /// valid URI reference. A `uri` that was never added has nothing to
    /// check.
    pub fn check_references(&self, uri: &str) -> Result<(), SchemaError> {
        let joined = join_base(uri)
            .map_err(|e| SchemaError::invalid(uri, format!("not a valid document URI: {e}")))?;
        let (_, key) = resource_key(&joined);
        match self.references.get(&key) {
            Some(sites) => self.verify(sites, |_| true),
            None => Ok(()),
        }
    }

    /// Resolve the sites whose target document passes `in_scope`.
    fn verify(&self, sites: &[RefSite], in_scope: impl Fn(&str) -> bool) -> Result<(), SchemaError> {
        let resolver = Resolver::new(self);
        for site in sites {
            if !in_scope(&resource_key(&site.target).1) {
                continue;
            }
            resolver
                .resolve_uri(&site.target)
                .map_err(|error| site.dangling(error))?;
        }
        Ok(())
    }

    /// Parse JSON text and register it under `uri`.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::Parse` for malformed JSON, otherwise as
    /// [`add_document`](Self::add_document).
    pub fn add_text(&mut self, uri: &str, text: &str) -> Result<Url, SchemaError> {
        let document = jsv_core::parse_json(text, uri)?;
        self.add_document(uri, document)
    }

    /// Base URI used for relative document URIs.
    pub fn base_uri(&self) -> &'static str {
        DEFAULT_BASE_URI
    }

    /// Number of documents added (embedded resources not counted).
    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    /// URIs of all added documents, sorted.
    pub fn document_uris(&self) -> Vec<&str> {
        let mut uris: Vec<&str> = self.documents.iter().map(String::as_str).collect();
        uris.sort_unstable();
        uris
    }

    /// Returns true if a resource is registered under `uri` (fragment ignored).
    pub fn contains(&self, uri: &str) -> bool {
        self.lookup_str(uri).is_some()
    }

    /// The JSON of the resource registered under `uri`.
    pub fn get_document(&self, uri: &str) -> Option<&Value> {
        self.lookup_str(uri).map(|resource| &resource.raw)
    }

    /// The compiled root node of the resource registered under `uri`.
    pub fn root(&self, uri: &str) -> Option<Arc<Schema>> {
        self.lookup_str(uri).and_then(|resource| resource.root().cloned())
    }

    fn lookup_str(&self, uri: &str) -> Option<&Arc<Resource>> {
        let joined = join_base(uri).ok()?;
        self.lookup(&joined)
    }

    /// Find the resource for a URI, ignoring its fragment.
    ///
    /// Exact match first. Otherwise the last path segment is tried as a
    /// file name under the default base, so that a document loaded from a
    /// directory is found whatever prefix a `$ref` used for it.
    pub(crate) fn lookup(&self, uri: &Url) -> Option<&Arc<Resource>> {
        let (_, key) = resource_key(uri);
        if let Some(resource) = self.resources.get(&key) {
            return Some(resource);
        }
        let filename = uri
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|name| !name.is_empty())?;
        let fallback = join_base(filename).ok()?;
        let found = self.resources.get(fallback.as_str());
        if found.is_some() {
            tracing::trace!(uri = %uri, fallback = %fallback, "resolved document by file name");
        }
        found
    }
}

/// Join `uri` against [`DEFAULT_BASE_URI`]. An absolute `uri` is returned
/// as is.
fn join_base(uri: &str) -> Result<Url, url::ParseError> {
    Url::parse(DEFAULT_BASE_URI)?.join(uri)
}
