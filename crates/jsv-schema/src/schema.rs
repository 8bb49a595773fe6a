//! # Schema Model
//!
//! Compiled schema nodes. A node is either the boolean form or an object
//! with one typed slot per recognized keyword. Subschemas are shared
//! `Arc<Schema>` handles so that the registry index and `$ref` resolution
//! hand out the same node the tree holds.
//!
//! Nodes are built only by the [`compile`](crate::compile) pass and are
//! never mutated afterwards.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use jsv_core::JsonKind;
use regex::Regex;
use serde_json::{Map, Number, Value};
use url::Url;

use crate::keyword::Keyword;

/// A compiled schema node.
#[derive(Debug)]
pub enum Schema {
    /// `true` accepts everything, `false` rejects everything.
    Bool(bool),
    /// A keyword object.
    Object(ObjectSchema),
}

impl Schema {
    /// The keyword object, if this is not a boolean schema.
    pub fn as_object(&self) -> Option<&ObjectSchema> {
        match self {
            Schema::Object(object) => Some(object),
            Schema::Bool(_) => None,
        }
    }

    /// Returns true for the boolean schema `false`.
    pub fn is_false(&self) -> bool {
        matches!(self, Schema::Bool(false))
    }
}

/// A `$ref` as written, with its target joined against the enclosing base.
#[derive(Debug, Clone)]
pub struct Reference {
    /// The reference string from the document.
    pub raw: String,
    /// Absolute target URI.
    pub target: Url,
}

/// A compiled regular expression that remembers its source text.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    pub(crate) fn new(source: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            source: source.to_string(),
            regex: Regex::new(source)?,
        })
    }

    /// The expression as written in the schema.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Unanchored search.
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// The two shapes of `items`.
#[derive(Debug)]
pub enum Items {
    /// Every element validates against one schema.
    List(Arc<Schema>),
    /// Element `i` validates against schema `i`.
    Tuple(Vec<Arc<Schema>>),
}

/// The two shapes of a `dependencies` entry.
#[derive(Debug)]
pub enum Dependency {
    /// Names that must also be present.
    Required(Vec<String>),
    /// A schema the whole object must satisfy.
    Schema(Arc<Schema>),
}

/// A schema in keyword-object form.
#[derive(Debug)]
pub struct ObjectSchema {
    pub(crate) base_uri: Url,
    pub(crate) reference: Option<Reference>,

    pub(crate) types: Option<Vec<JsonKind>>,
    pub(crate) enumeration: Option<Vec<Value>>,
    pub(crate) constant: Option<Value>,

    pub(crate) multiple_of: Option<Number>,
    pub(crate) minimum: Option<Number>,
    pub(crate) maximum: Option<Number>,
    pub(crate) exclusive_minimum: Option<Number>,
    pub(crate) exclusive_maximum: Option<Number>,

    pub(crate) min_length: Option<u64>,
    pub(crate) max_length: Option<u64>,
    pub(crate) pattern: Option<Pattern>,
    pub(crate) format: Option<String>,

    pub(crate) properties: Option<HashMap<String, Arc<Schema>>>,
    pub(crate) pattern_properties: Option<Vec<(Pattern, Arc<Schema>)>>,
    pub(crate) additional_properties: Option<Arc<Schema>>,
    pub(crate) required: Option<Vec<String>>,
    pub(crate) property_names: Option<Arc<Schema>>,
    pub(crate) min_properties: Option<u64>,
    pub(crate) max_properties: Option<u64>,
    pub(crate) dependencies: Option<Vec<(String, Dependency)>>,
    pub(crate) dependent_required: Option<Vec<(String, Vec<String>)>>,
    pub(crate) dependent_schemas: Option<Vec<(String, Arc<Schema>)>>,

    pub(crate) items: Option<Items>,
    pub(crate) additional_items: Option<Arc<Schema>>,
    pub(crate) contains: Option<Arc<Schema>>,
    pub(crate) min_items: Option<u64>,
    pub(crate) max_items: Option<u64>,
    pub(crate) unique_items: bool,

    pub(crate) all_of: Option<Vec<Arc<Schema>>>,
    pub(crate) any_of: Option<Vec<Arc<Schema>>>,
    pub(crate) one_of: Option<Vec<Arc<Schema>>>,
    pub(crate) not: Option<Arc<Schema>>,
    pub(crate) if_schema: Option<Arc<Schema>>,
    pub(crate) then_schema: Option<Arc<Schema>>,
    pub(crate) else_schema: Option<Arc<Schema>>,

    pub(crate) definitions: Vec<(String, Arc<Schema>)>,
    pub(crate) annotations: Vec<(Keyword, Value)>,
    pub(crate) metadata: Map<String, Value>,
    pub(crate) unknown: Map<String, Value>,
}

impl ObjectSchema {
    pub(crate) fn empty(base_uri: Url) -> Self {
        Self {
            base_uri,
            reference: None,
            types: None,
            enumeration: None,
            constant: None,
            multiple_of: None,
            minimum: None,
            maximum: None,
            exclusive_minimum: None,
            exclusive_maximum: None,
            min_length: None,
            max_length: None,
            pattern: None,
            format: None,
            properties: None,
            pattern_properties: None,
            additional_properties: None,
            required: None,
            property_names: None,
            min_properties: None,
            max_properties: None,
            dependencies: None,
            dependent_required: None,
            dependent_schemas: None,
            items: None,
            additional_items: None,
            contains: None,
            min_items: None,
            max_items: None,
            unique_items: false,
            all_of: None,
            any_of: None,
            one_of: None,
            not: None,
            if_schema: None,
            then_schema: None,
            else_schema: None,
            definitions: Vec::new(),
            annotations: Vec::new(),
            metadata: Map::new(),
            unknown: Map::new(),
        }
    }

    /// Base URI in effect for this node (set by the nearest `$id`).
    pub fn base_uri(&self) -> &Url {
        &self.base_uri
    }

    /// The node's `$ref`, if any.
    pub fn reference(&self) -> Option<&Reference> {
        self.reference.as_ref()
    }

    /// Kinds accepted by `type`, if present.
    pub fn types(&self) -> Option<&[JsonKind]> {
        self.types.as_deref()
    }

    /// Named subschemas from `definitions` and `$defs`.
    pub fn definitions(&self) -> &[(String, Arc<Schema>)] {
        &self.definitions
    }

    /// Annotation keywords with their values, in document order.
    pub fn annotations(&self) -> &[(Keyword, Value)] {
        &self.annotations
    }

    /// `$id`, `$anchor`, `$schema` and `$comment` as written.
    pub fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }

    /// Keywords this engine does not recognize, kept verbatim.
    pub fn unknown_keywords(&self) -> &Map<String, Value> {
        &self.unknown
    }
}
