//! # Schema Compilation
//!
//! Turns a schema document into `Arc<Schema>` nodes and indexes them for
//! reference resolution.
//!
//! ## Load-time checks
//!
//! Every keyword value is checked against its definition before any
//! instance is seen. Examples of what fails with
//! [`SchemaError::InvalidSchema`]:
//!
//! - `minLength: -1`, `maxItems: 1.5` (counts must be non-negative integers)
//! - `multipleOf: 0` (divisor must be positive)
//! - `enum: [1, 1.0]`, `required: ["a", "a"]` (duplicates)
//! - `pattern: "("` (regex does not compile)
//! - `properties: {"a": 3}` (subschemas must be booleans or objects)
//!
//! ## Scopes
//!
//! Compilation tracks the current resource: its base URI and the JSON
//! Pointer of the node inside it. A `$id` with a non-fragment part starts a
//! new resource whose pointers restart at the root. The node stays indexed
//! in every enclosing resource too, so a pointer from the outer document
//! that crosses into it still lands on the node compiled with the right
//! base. A `$id` that is only a fragment (`"#name"`), or an `$anchor`,
//! declares a named anchor in the current resource. `$ref` values are
//! joined against the base in effect where they appear, so the validator
//! only ever sees absolute targets.

use std::collections::HashMap;
use std::sync::Arc;

use jsv_core::{find_duplicate, is_integral, JsonKind, JsonPointer};
use serde_json::{Map, Number, Value};
use url::Url;

use crate::error::SchemaError;
use crate::keyword::Keyword;
use crate::registry::{Resource, SchemaRegistry};
use crate::schema::{Dependency, Items, ObjectSchema, Pattern, Reference, Schema};

/// Output of compiling one document.
#[derive(Debug)]
pub(crate) struct Compiled {
    pub(crate) root: Arc<Schema>,
    /// Key of the resource the document root belongs to (its `$id` if it
    /// declares one, otherwise the URI it was loaded under).
    pub(crate) root_resource: String,
    pub(crate) resources: HashMap<String, Resource>,
    /// Every `$ref` in the document, in document order.
    pub(crate) references: Vec<RefSite>,
}

/// A `$ref` as found at load time.
#[derive(Debug, Clone)]
pub(crate) struct RefSite {
    /// Where the `$ref` keyword is written.
    pub(crate) location: String,
    pub(crate) target: Url,
}

impl RefSite {
    /// Attach the `$ref` location to a resolution failure.
    pub(crate) fn dangling(&self, error: SchemaError) -> SchemaError {
        let located = |reason: String| format!("{reason} (referenced from '{}')", self.location);
        match error {
            SchemaError::UnresolvableReference { reference, reason } => {
                SchemaError::UnresolvableReference {
                    reference,
                    reason: located(reason),
                }
            }
            SchemaError::InvalidPointer { reference, reason } => SchemaError::InvalidPointer {
                reference,
                reason: located(reason),
            },
            other => other,
        }
    }
}

#[derive(Debug, Clone)]
struct Scope {
    base: Url,
    resource: String,
    pointer: JsonPointer,
    /// Resources this node is nested in, with its pointer inside each.
    enclosing: Vec<(String, JsonPointer)>,
}

impl Scope {
    fn new(base: Url, resource: String, pointer: JsonPointer) -> Scope {
        Scope {
            base,
            resource,
            pointer,
            enclosing: Vec::new(),
        }
    }

    fn child(&self, token: &str) -> Scope {
        Scope {
            base: self.base.clone(),
            resource: self.resource.clone(),
            pointer: self.pointer.join(token),
            enclosing: self
                .enclosing
                .iter()
                .map(|(resource, pointer)| (resource.clone(), pointer.join(token)))
                .collect(),
        }
    }

    /// Move into the embedded resource `resource`, remembering this one.
    fn enter(&self, base: Url, resource: String) -> Scope {
        let mut enclosing = self.enclosing.clone();
        enclosing.push((self.resource.clone(), self.pointer.clone()));
        Scope {
            base,
            resource,
            pointer: JsonPointer::root(),
            enclosing,
        }
    }

    fn here(&self) -> String {
        format!("{}#{}", self.resource, self.pointer)
    }

    fn location(&self, keyword: Keyword) -> String {
        format!("{}#{}", self.resource, self.pointer.join(keyword.as_str()))
    }
}

/// Strip the fragment from a URI and return it as a resource key.
pub(crate) fn resource_key(uri: &Url) -> (Url, String) {
    let mut base = uri.clone();
    base.set_fragment(None);
    let key = base.to_string();
    (base, key)
}

/// Compile a whole document loaded under `uri`.
pub(crate) fn compile_document(uri: &Url, document: &Value) -> Result<Compiled, SchemaError> {
    let (base, key) = resource_key(uri);
    let mut compiler = Compiler::default();
    compiler
        .resources
        .insert(key.clone(), Resource::new(base.clone(), document.clone()));
    let scope = Scope::new(base, key.clone(), JsonPointer::root());
    let root = compiler.schema(document, &scope)?;
    let root_resource = match &*root {
        Schema::Object(object) => resource_key(object.base_uri()).1,
        Schema::Bool(_) => key,
    };
    Ok(Compiled {
        root,
        root_resource,
        resources: compiler.resources,
        references: compiler.references,
    })
}

/// Compile the value at `pointer` inside an already-registered resource,
/// without touching the registry. Used when a pointer targets a location
/// that was not compiled as part of its document.
///
/// Every `$id` on the way down from the resource root still applies, so
/// the result has the base URI it would have had in place.
pub(crate) fn compile_fragment(
    resource: &Resource,
    pointer: &JsonPointer,
    value: &Value,
) -> Result<Arc<Schema>, SchemaError> {
    let mut base = resource.uri.clone();
    let mut current = &resource.raw;
    let tokens = pointer.tokens();
    for token in &tokens[..tokens.len().saturating_sub(1)] {
        let next = match current {
            Value::Object(map) => map.get(token),
            Value::Array(items) => token.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        };
        let Some(next) = next else {
            break;
        };
        current = next;
        let id = current
            .get("$id")
            .and_then(Value::as_str)
            .filter(|id| !id.starts_with('#'));
        if let Some(joined) = id.and_then(|id| base.join(id).ok()) {
            base = joined;
        }
    }

    let key = resource.uri.to_string();
    let mut compiler = Compiler::default();
    compiler
        .resources
        .insert(key.clone(), Resource::new(resource.uri.clone(), Value::Null));
    compiler.schema(value, &Scope::new(base, key, pointer.clone()))
}

/// Compile a standalone schema under the default base URI.
///
/// # Errors
///
/// Returns `SchemaError::InvalidSchema` for any keyword whose value its
/// definition does not allow, and `UnresolvableReference` or
/// `InvalidPointer` for a `$ref` into the schema itself that leads nowhere.
pub fn compile(schema: &Value) -> Result<Arc<Schema>, SchemaError> {
    let mut registry = SchemaRegistry::new();
    let uri = registry.add_document(crate::options::DEFAULT_BASE_URI, schema.clone())?;
    registry
        .root(uri.as_str())
        .ok_or_else(|| SchemaError::invalid(uri.as_str(), "document has no root schema"))
}

#[derive(Default)]
struct Compiler {
    resources: HashMap<String, Resource>,
    references: Vec<RefSite>,
}

impl Compiler {
    fn schema(&mut self, value: &Value, scope: &Scope) -> Result<Arc<Schema>, SchemaError> {
        let node = match value {
            Value::Bool(b) => Arc::new(Schema::Bool(*b)),
            Value::Object(map) => self.object(map, value, scope)?,
            other => {
                return Err(SchemaError::invalid(
                    scope.here(),
                    format!("a schema must be a boolean or an object, found {other}"),
                ))
            }
        };
        self.insert(scope, &node);
        Ok(node)
    }

    fn insert(&mut self, scope: &Scope, node: &Arc<Schema>) {
        let places = std::iter::once((&scope.resource, &scope.pointer))
            .chain(scope.enclosing.iter().map(|(resource, pointer)| (resource, pointer)));
        for (key, pointer) in places {
            if let Some(resource) = self.resources.get_mut(key) {
                resource.index.insert(pointer.to_string(), Arc::clone(node));
            }
        }
    }

    fn object(
        &mut self,
        map: &Map<String, Value>,
        raw: &Value,
        outer: &Scope,
    ) -> Result<Arc<Schema>, SchemaError> {
        let mut scope = outer.clone();
        let mut anchors = Vec::new();
        let mut switched = false;

        if let Some(id) = map.get("$id") {
            let id = id
                .as_str()
                .ok_or_else(|| SchemaError::invalid(scope.location(Keyword::Id), "$id must be a string"))?;
            let joined = scope.base.join(id).map_err(|e| {
                SchemaError::invalid(
                    scope.location(Keyword::Id),
                    format!("'{id}' is not a valid URI reference: {e}"),
                )
            })?;
            if let Some(name) = id.strip_prefix('#') {
                if !name.is_empty() {
                    anchors.push(name.to_string());
                }
            } else {
                let fragment = joined
                    .fragment()
                    .filter(|f| !f.is_empty())
                    .map(str::to_string);
                let (base, key) = resource_key(&joined);
                if key != scope.resource {
                    tracing::trace!(resource = %key, "entering embedded schema resource");
                    self.resources
                        .entry(key.clone())
                        .or_insert_with(|| Resource::new(base.clone(), raw.clone()));
                    scope = scope.enter(base, key);
                    switched = true;
                }
                anchors.extend(fragment);
            }
        }
        if let Some(anchor) = map.get("$anchor") {
            let anchor = anchor.as_str().ok_or_else(|| {
                SchemaError::invalid(scope.location(Keyword::Anchor), "$anchor must be a string")
            })?;
            anchors.push(anchor.to_string());
        }

        let mut node = ObjectSchema::empty(scope.base.clone());
        for (name, value) in map {
            match Keyword::from_name(name) {
                Some(keyword) => self.keyword(&mut node, keyword, value, &scope)?,
                None => {
                    node.unknown.insert(name.clone(), value.clone());
                }
            }
        }
        let node = Arc::new(Schema::Object(node));

        if switched {
            self.insert(&scope, &node);
        }
        if let Some(resource) = self.resources.get_mut(&scope.resource) {
            for anchor in anchors {
                if resource.anchors.contains_key(&anchor) {
                    return Err(SchemaError::invalid(
                        scope.here(),
                        format!("anchor '{anchor}' is declared more than once"),
                    ));
                }
                resource.anchors.insert(anchor, Arc::clone(&node));
            }
        }
        Ok(node)
    }

    fn keyword(
        &mut self,
        node: &mut ObjectSchema,
        keyword: Keyword,
        value: &Value,
        scope: &Scope,
    ) -> Result<(), SchemaError> {
        let location = || scope.location(keyword);
        let here = scope.child(keyword.as_str());
        match keyword {
            Keyword::Ref => {
                let raw = value
                    .as_str()
                    .ok_or_else(|| SchemaError::invalid(location(), "$ref must be a string"))?;
                let target = scope.base.join(raw).map_err(|e| {
                    SchemaError::invalid(location(), format!("'{raw}' is not a valid URI reference: {e}"))
                })?;
                self.references.push(RefSite {
                    location: location(),
                    target: target.clone(),
                });
                node.reference = Some(Reference {
                    raw: raw.to_string(),
                    target,
                });
            }
            Keyword::Id | Keyword::Anchor | Keyword::SchemaUri | Keyword::Comment => {
                node.metadata.insert(keyword.as_str().to_string(), value.clone());
            }
            Keyword::Defs | Keyword::Definitions => {
                let defs = self.schema_map(value, &here, keyword)?;
                node.definitions.extend(defs);
            }
            Keyword::Type => node.types = Some(kinds(value, &location())?),
            Keyword::Enum => {
                let items = value
                    .as_array()
                    .ok_or_else(|| SchemaError::invalid(location(), "enum must be an array"))?;
                if let Some((first, second)) = find_duplicate(items) {
                    return Err(SchemaError::invalid(
                        location(),
                        format!("enum values at {first} and {second} are equal"),
                    ));
                }
                node.enumeration = Some(items.clone());
            }
            Keyword::Const => node.constant = Some(value.clone()),
            Keyword::MultipleOf => {
                let divisor = number(value, &location())?;
                if divisor.as_f64().map_or(true, |d| d <= 0.0) {
                    return Err(SchemaError::invalid(
                        location(),
                        format!("multipleOf must be strictly positive, found {divisor}"),
                    ));
                }
                node.multiple_of = Some(divisor);
            }
            Keyword::Minimum => node.minimum = Some(number(value, &location())?),
            Keyword::Maximum => node.maximum = Some(number(value, &location())?),
            Keyword::ExclusiveMinimum => node.exclusive_minimum = Some(number(value, &location())?),
            Keyword::ExclusiveMaximum => node.exclusive_maximum = Some(number(value, &location())?),
            Keyword::MinLength => node.min_length = Some(count(value, &location())?),
            Keyword::MaxLength => node.max_length = Some(count(value, &location())?),
            Keyword::Pattern => node.pattern = Some(pattern(value, &location())?),
            Keyword::Format => {
                let name = value
                    .as_str()
                    .ok_or_else(|| SchemaError::invalid(location(), "format must be a string"))?;
                node.format = Some(name.to_string());
            }
            Keyword::Properties => {
                let properties = self.schema_map(value, &here, keyword)?;
                node.properties = Some(properties.into_iter().collect());
            }
            Keyword::PatternProperties => {
                let map = value.as_object().ok_or_else(|| {
                    SchemaError::invalid(location(), "patternProperties must be an object")
                })?;
                let mut compiled = Vec::with_capacity(map.len());
                for (source, subschema) in map {
                    let entry = here.child(source);
                    let regex = Pattern::new(source).map_err(|e| {
                        SchemaError::invalid(entry.here(), format!("invalid regular expression: {e}"))
                    })?;
                    compiled.push((regex, self.schema(subschema, &entry)?));
                }
                node.pattern_properties = Some(compiled);
            }
            Keyword::AdditionalProperties => {
                node.additional_properties = Some(self.schema(value, &here)?)
            }
            Keyword::Required => node.required = Some(names(value, &location())?),
            Keyword::PropertyNames => node.property_names = Some(self.schema(value, &here)?),
            Keyword::MinProperties => node.min_properties = Some(count(value, &location())?),
            Keyword::MaxProperties => node.max_properties = Some(count(value, &location())?),
            Keyword::Dependencies => {
                let map = value
                    .as_object()
                    .ok_or_else(|| SchemaError::invalid(location(), "dependencies must be an object"))?;
                let mut entries = Vec::with_capacity(map.len());
                for (property, dependency) in map {
                    let entry = here.child(property);
                    let dependency = match dependency {
                        Value::Array(_) => Dependency::Required(names(dependency, &entry.here())?),
                        _ => Dependency::Schema(self.schema(dependency, &entry)?),
                    };
                    entries.push((property.clone(), dependency));
                }
                node.dependencies = Some(entries);
            }
            Keyword::DependentRequired => {
                let map = value.as_object().ok_or_else(|| {
                    SchemaError::invalid(location(), "dependentRequired must be an object")
                })?;
                let entries = map
                    .iter()
                    .map(|(property, list)| {
                        names(list, &here.child(property).here()).map(|list| (property.clone(), list))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                node.dependent_required = Some(entries);
            }
            Keyword::DependentSchemas => {
                node.dependent_schemas = Some(self.schema_map(value, &here, keyword)?)
            }
            Keyword::Items => {
                node.items = Some(match value {
                    Value::Array(_) => Items::Tuple(self.schema_list(value, &here, keyword, false)?),
                    _ => Items::List(self.schema(value, &here)?),
                })
            }
            Keyword::AdditionalItems => node.additional_items = Some(self.schema(value, &here)?),
            Keyword::Contains => node.contains = Some(self.schema(value, &here)?),
            Keyword::MinItems => node.min_items = Some(count(value, &location())?),
            Keyword::MaxItems => node.max_items = Some(count(value, &location())?),
            Keyword::UniqueItems => {
                node.unique_items = value
                    .as_bool()
                    .ok_or_else(|| SchemaError::invalid(location(), "uniqueItems must be a boolean"))?
            }
            Keyword::AllOf => node.all_of = Some(self.schema_list(value, &here, keyword, true)?),
            Keyword::AnyOf => node.any_of = Some(self.schema_list(value, &here, keyword, true)?),
            Keyword::OneOf => node.one_of = Some(self.schema_list(value, &here, keyword, true)?),
            Keyword::Not => node.not = Some(self.schema(value, &here)?),
            Keyword::If => node.if_schema = Some(self.schema(value, &here)?),
            Keyword::Then => node.then_schema = Some(self.schema(value, &here)?),
            Keyword::Else => node.else_schema = Some(self.schema(value, &here)?),
            Keyword::Title | Keyword::Description | Keyword::Default | Keyword::Examples => {
                node.annotations.push((keyword, value.clone()))
            }
            Keyword::FalseSchema => {
                node.unknown.insert(keyword.as_str().to_string(), value.clone());
            }
        }
        Ok(())
    }

    fn schema_map(
        &mut self,
        value: &Value,
        scope: &Scope,
        keyword: Keyword,
    ) -> Result<Vec<(String, Arc<Schema>)>, SchemaError> {
        let map = value.as_object().ok_or_else(|| {
            SchemaError::invalid(scope.here(), format!("{keyword} must be an object"))
        })?;
        map.iter()
            .map(|(name, subschema)| {
                self.schema(subschema, &scope.child(name))
                    .map(|node| (name.clone(), node))
            })
            .collect()
    }

    fn schema_list(
        &mut self,
        value: &Value,
        scope: &Scope,
        keyword: Keyword,
        non_empty: bool,
    ) -> Result<Vec<Arc<Schema>>, SchemaError> {
        let items = value.as_array().ok_or_else(|| {
            SchemaError::invalid(scope.here(), format!("{keyword} must be an array of schemas"))
        })?;
        if non_empty && items.is_empty() {
            return Err(SchemaError::invalid(
                scope.here(),
                format!("{keyword} must contain at least one schema"),
            ));
        }
        items
            .iter()
            .enumerate()
            .map(|(i, subschema)| self.schema(subschema, &scope.child(&i.to_string())))
            .collect()
    }
}

fn number(value: &Value, location: &str) -> Result<Number, SchemaError> {
    match value {
        Value::Number(n) => Ok(n.clone()),
        other => Err(SchemaError::invalid(
            location,
            format!("expected a number, found {other}"),
        )),
    }
}

fn count(value: &Value, location: &str) -> Result<u64, SchemaError> {
    let parsed = match value {
        Value::Number(n) if is_integral(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        _ => None,
    };
    parsed.ok_or_else(|| {
        SchemaError::invalid(
            location,
            format!("expected a non-negative integer, found {value}"),
        )
    })
}

fn pattern(value: &Value, location: &str) -> Result<Pattern, SchemaError> {
    let source = value
        .as_str()
        .ok_or_else(|| SchemaError::invalid(location, "pattern must be a string"))?;
    Pattern::new(source)
        .map_err(|e| SchemaError::invalid(location, format!("invalid regular expression: {e}")))
}

fn names(value: &Value, location: &str) -> Result<Vec<String>, SchemaError> {
    let items = value
        .as_array()
        .ok_or_else(|| SchemaError::invalid(location, "expected an array of property names"))?;
    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        let name = item.as_str().ok_or_else(|| {
            SchemaError::invalid(location, format!("property names must be strings, found {item}"))
        })?;
        if out.iter().any(|existing| existing == name) {
            return Err(SchemaError::invalid(
                location,
                format!("property name \"{name}\" is listed more than once"),
            ));
        }
        out.push(name.to_string());
    }
    Ok(out)
}

fn kinds(value: &Value, location: &str) -> Result<Vec<JsonKind>, SchemaError> {
    let parse = |item: &Value| -> Result<JsonKind, SchemaError> {
        item.as_str()
            .ok_or_else(|| SchemaError::invalid(location, format!("type names must be strings, found {item}")))?
            .parse::<JsonKind>()
            .map_err(|e| SchemaError::invalid(location, e.to_string()))
    };
    match value {
        Value::Array(items) => {
            if items.is_empty() {
                return Err(SchemaError::invalid(location, "type must list at least one kind"));
            }
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                let kind = parse(item)?;
                if out.contains(&kind) {
                    return Err(SchemaError::invalid(
                        location,
                        format!("type \"{kind}\" is listed more than once"),
                    ));
                }
                out.push(kind);
            }
            Ok(out)
        }
        single => Ok(vec![parse(single)?]),
    }
}
