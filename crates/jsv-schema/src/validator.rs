//! # Validator Engine
//!
//! Walks a compiled schema against an instance.
//!
//! ## Evaluation rules
//!
//! - `true` passes, `false` fails with keyword `false`.
//! - An object schema evaluates every keyword it has; the node passes only
//!   if all of them pass. Sibling keywords never short-circuit each other,
//!   and `$ref` is evaluated alongside its siblings.
//! - Type-specific keywords (`minLength`, `properties`, `items`, ...)
//!   ignore instances of other kinds.
//! - `allOf`, `properties`, `items`, `$ref`, `then`/`else` and friends
//!   pass their subschema failures upward. `anyOf`, `oneOf`, `not` and
//!   `contains` consume subschema failures and report one failure of their
//!   own.
//!
//! ## Reference cycles
//!
//! Each run keeps the set of `(reference location, subject, instance
//! location)` triples currently being followed. The subject tells apart
//! values that share an instance location: the instance itself is subject
//! 0, and every property name checked by `propertyNames` gets a fresh one.
//! Re-entering a triple means the schema would recurse forever on the same
//! value, so that branch fails with `CyclicReference`. Recursion that moves
//! deeper into the instance, or on to a property name, is allowed, bounded
//! by the configured reference depth.

use std::collections::HashSet;
use std::sync::Arc;

use jsv_core::{compare_numbers, find_duplicate, is_multiple_of, json_equal, JsonPointer};
use serde_json::{Map, Value};

use crate::error::SchemaError;
use crate::format;
use crate::keyword::Keyword;
use crate::options::ValidationOptions;
use crate::output::{Annotation, Output, ValidationResult};
use crate::registry::SchemaRegistry;
use crate::resolver::Resolver;
use crate::schema::{Dependency, Items, ObjectSchema, Schema};

/// A compiled schema ready to validate instances.
///
/// Immutable and `Send + Sync`: share it freely between threads.
#[derive(Debug, Clone)]
pub struct Validator {
    registry: Arc<SchemaRegistry>,
    root: Arc<Schema>,
    options: ValidationOptions,
}

impl Validator {
    pub(crate) fn new(registry: Arc<SchemaRegistry>, root: Arc<Schema>, options: ValidationOptions) -> Self {
        Self {
            registry,
            root,
            options,
        }
    }

    /// Validate `instance` and report every failure.
    pub fn validate(&self, instance: &Value) -> ValidationResult {
        let mut run = Run {
            resolver: Resolver::new(&self.registry),
            options: &self.options,
            visiting: HashSet::new(),
            depth: 0,
            subject: 0,
            subjects: 0,
        };
        let output = run.schema(&self.root, instance, &JsonPointer::root(), &JsonPointer::root());
        ValidationResult::from_output(output)
    }

    /// Returns true if `instance` is valid.
    pub fn is_valid(&self, instance: &Value) -> bool {
        self.validate(instance).is_valid()
    }

    /// The root schema node.
    pub fn schema(&self) -> &Schema {
        &self.root
    }

    /// Documents available to `$ref`.
    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    pub fn options(&self) -> &ValidationOptions {
        &self.options
    }
}

/// State of one validation run.
struct Run<'a> {
    resolver: Resolver<'a>,
    options: &'a ValidationOptions,
    visiting: HashSet<(String, usize, JsonPointer)>,
    depth: usize,
    /// The value currently under `at`; see the module docs.
    subject: usize,
    /// Subjects handed out so far.
    subjects: usize,
}

impl Run<'_> {
    fn schema(
        &mut self,
        schema: &Schema,
        instance: &Value,
        at: &JsonPointer,
        path: &JsonPointer,
    ) -> Output {
        let mut out = Output::default();
        match schema {
            Schema::Bool(true) => {}
            Schema::Bool(false) => out.fail(
                at,
                path.clone(),
                Keyword::FalseSchema,
                format!("False schema does not allow {instance}"),
            ),
            Schema::Object(node) => self.object(node, instance, at, path, &mut out),
        }
        out
    }

    fn object(
        &mut self,
        node: &ObjectSchema,
        instance: &Value,
        at: &JsonPointer,
        path: &JsonPointer,
        out: &mut Output,
    ) {
        self.reference(node, instance, at, path, out);
        check_type(node, instance, at, path, out);
        check_enum(node, instance, at, path, out);
        check_const(node, instance, at, path, out);
        if let Value::Number(_) = instance {
            check_numeric(node, instance, at, path, out);
        }
        if let Value::String(text) = instance {
            check_string(node, instance, text, at, path, out);
        }
        self.format(node, instance, at, path, out);
        if let Value::Object(map) = instance {
            self.properties(node, map, at, path, out);
            self.property_names(node, map, at, path, out);
            check_property_counts(node, instance, map, at, path, out);
            self.dependencies(node, instance, map, at, path, out);
        }
        if let Value::Array(items) = instance {
            self.items(node, items, at, path, out);
            self.contains(node, instance, items, at, path, out);
            check_array_bounds(node, instance, items, at, path, out);
        }
        self.combinators(node, instance, at, path, out);
        self.conditional(node, instance, at, path, out);
        if self.options.collects_annotations() {
            for (keyword, value) in &node.annotations {
                out.annotations.push(Annotation {
                    instance_path: at.clone(),
                    schema_path: path.join(keyword.as_str()),
                    keyword: *keyword,
                    value: value.clone(),
                });
            }
        }
    }

    fn reference(
        &mut self,
        node: &ObjectSchema,
        instance: &Value,
        at: &JsonPointer,
        path: &JsonPointer,
        out: &mut Output,
    ) {
        let Some(reference) = &node.reference else {
            return;
        };
        let here = path.join(Keyword::Ref.as_str());
        let resolved = match self.resolver.resolve_uri(&reference.target) {
            Ok(resolved) => resolved,
            Err(error) => return out.fault(at, here, error),
        };
        let limit = self.options.reference_depth_limit();
        if self.depth >= limit {
            return out.fault(
                at,
                here,
                SchemaError::RecursionLimit {
                    reference: resolved.location,
                    limit,
                },
            );
        }
        let key = (resolved.location, self.subject, at.clone());
        if self.visiting.contains(&key) {
            return out.fault(
                at,
                here,
                SchemaError::CyclicReference {
                    reference: key.0,
                    instance_path: at.to_string(),
                },
            );
        }
        self.visiting.insert(key.clone());
        self.depth += 1;
        let sub = self.schema(&resolved.schema, instance, at, &here);
        self.depth -= 1;
        self.visiting.remove(&key);
        out.merge(sub);
    }

    fn format(
        &mut self,
        node: &ObjectSchema,
        instance: &Value,
        at: &JsonPointer,
        path: &JsonPointer,
        out: &mut Output,
    ) {
        let Some(name) = &node.format else {
            return;
        };
        let here = path.join(Keyword::Format.as_str());
        if self.options.asserts_formats() && format::check(name, instance) == Some(false) {
            out.fail(
                at,
                here.clone(),
                Keyword::Format,
                format!("{instance} is not a \"{name}\""),
            );
        }
        if self.options.collects_annotations() {
            out.annotations.push(Annotation {
                instance_path: at.clone(),
                schema_path: here,
                keyword: Keyword::Format,
                value: Value::String(name.clone()),
            });
        }
    }

    fn properties(
        &mut self,
        node: &ObjectSchema,
        map: &Map<String, Value>,
        at: &JsonPointer,
        path: &JsonPointer,
        out: &mut Output,
    ) {
        if let Some(properties) = &node.properties {
            let here = path.join(Keyword::Properties.as_str());
            for (name, value) in map {
                if let Some(subschema) = properties.get(name) {
                    let sub = self.schema(subschema, value, &at.join(name.as_str()), &here.join(name.as_str()));
                    out.merge(sub);
                }
            }
        }

        if let Some(patterns) = &node.pattern_properties {
            let here = path.join(Keyword::PatternProperties.as_str());
            for (name, value) in map {
                for (pattern, subschema) in patterns {
                    if pattern.is_match(name) {
                        let sub = self.schema(
                            subschema,
                            value,
                            &at.join(name.as_str()),
                            &here.join(pattern.as_str()),
                        );
                        out.merge(sub);
                    }
                }
            }
        }

        let Some(additional) = &node.additional_properties else {
            return;
        };
        let here = path.join(Keyword::AdditionalProperties.as_str());
        let extras: Vec<(&String, &Value)> = map
            .iter()
            .filter(|(name, _)| {
                !node
                    .properties
                    .as_ref()
                    .is_some_and(|properties| properties.contains_key(*name))
                    && !node
                        .pattern_properties
                        .as_ref()
                        .is_some_and(|patterns| patterns.iter().any(|(p, _)| p.is_match(name)))
            })
            .collect();
        if extras.is_empty() {
            return;
        }
        if additional.is_false() {
            let names: Vec<String> = extras.iter().map(|(name, _)| format!("'{name}'")).collect();
            let verb = if names.len() == 1 { "was" } else { "were" };
            out.fail(
                at,
                here,
                Keyword::AdditionalProperties,
                format!(
                    "Additional properties are not allowed ({} {verb} unexpected)",
                    names.join(", ")
                ),
            );
            return;
        }
        for (name, value) in extras {
            let sub = self.schema(additional, value, &at.join(name.as_str()), &here);
            out.merge(sub);
        }
    }

    fn property_names(
        &mut self,
        node: &ObjectSchema,
        map: &Map<String, Value>,
        at: &JsonPointer,
        path: &JsonPointer,
        out: &mut Output,
    ) {
        if let Some(required) = &node.required {
            for name in required {
                if !map.contains_key(name) {
                    out.fail(
                        at,
                        path.join(Keyword::Required.as_str()),
                        Keyword::Required,
                        format!("\"{name}\" is a required property"),
                    );
                }
            }
        }

        let Some(names_schema) = &node.property_names else {
            return;
        };
        let here = path.join(Keyword::PropertyNames.as_str());
        let outer = self.subject;
        for name in map.keys() {
            self.subjects += 1;
            self.subject = self.subjects;
            let sub = self.schema(names_schema, &Value::String(name.clone()), at, &here);
            out.merge(sub);
        }
        self.subject = outer;
    }

    fn dependencies(
        &mut self,
        node: &ObjectSchema,
        instance: &Value,
        map: &Map<String, Value>,
        at: &JsonPointer,
        path: &JsonPointer,
        out: &mut Output,
    ) {
        if let Some(dependencies) = &node.dependencies {
            let here = path.join(Keyword::Dependencies.as_str());
            for (trigger, dependency) in dependencies {
                if !map.contains_key(trigger) {
                    continue;
                }
                match dependency {
                    Dependency::Required(names) => {
                        require_all(names, trigger, map, at, &here, Keyword::Dependencies, out)
                    }
                    Dependency::Schema(subschema) => {
                        let sub = self.schema(subschema, instance, at, &here.join(trigger.as_str()));
                        out.merge(sub);
                    }
                }
            }
        }

        if let Some(dependent) = &node.dependent_required {
            let here = path.join(Keyword::DependentRequired.as_str());
            for (trigger, names) in dependent {
                if map.contains_key(trigger) {
                    require_all(names, trigger, map, at, &here, Keyword::DependentRequired, out);
                }
            }
        }

        if let Some(dependent) = &node.dependent_schemas {
            let here = path.join(Keyword::DependentSchemas.as_str());
            for (trigger, subschema) in dependent {
                if map.contains_key(trigger) {
                    let sub = self.schema(subschema, instance, at, &here.join(trigger.as_str()));
                    out.merge(sub);
                }
            }
        }
    }

    fn items(
        &mut self,
        node: &ObjectSchema,
        items: &[Value],
        at: &JsonPointer,
        path: &JsonPointer,
        out: &mut Output,
    ) {
        let Some(shape) = &node.items else {
            return;
        };
        let here = path.join(Keyword::Items.as_str());
        match shape {
            Items::List(subschema) => {
                for (i, item) in items.iter().enumerate() {
                    let sub = self.schema(subschema, item, &at.join_index(i), &here);
                    out.merge(sub);
                }
            }
            Items::Tuple(schemas) => {
                for (i, (subschema, item)) in schemas.iter().zip(items).enumerate() {
                    let sub = self.schema(subschema, item, &at.join_index(i), &here.join_index(i));
                    out.merge(sub);
                }
                let Some(additional) = &node.additional_items else {
                    return;
                };
                if items.len() <= schemas.len() {
                    return;
                }
                let here = path.join(Keyword::AdditionalItems.as_str());
                let extras = &items[schemas.len()..];
                if additional.is_false() {
                    let listed: Vec<String> = extras.iter().map(Value::to_string).collect();
                    let verb = if listed.len() == 1 { "was" } else { "were" };
                    out.fail(
                        at,
                        here,
                        Keyword::AdditionalItems,
                        format!(
                            "Additional items are not allowed ({} {verb} unexpected)",
                            listed.join(", ")
                        ),
                    );
                    return;
                }
                for (offset, item) in extras.iter().enumerate() {
                    let index = schemas.len() + offset;
                    let sub = self.schema(additional, item, &at.join_index(index), &here);
                    out.merge(sub);
                }
            }
        }
    }

    fn contains(
        &mut self,
        node: &ObjectSchema,
        instance: &Value,
        items: &[Value],
        at: &JsonPointer,
        path: &JsonPointer,
        out: &mut Output,
    ) {
        let Some(subschema) = &node.contains else {
            return;
        };
        let here = path.join(Keyword::Contains.as_str());
        let mut matched = false;
        for (i, item) in items.iter().enumerate() {
            let sub = self.schema(subschema, item, &at.join_index(i), &here);
            matched |= sub.is_valid();
            out.absorb(sub);
        }
        if !matched {
            out.fail(
                at,
                here,
                Keyword::Contains,
                format!("None of {instance} are valid under the given schema"),
            );
        }
    }

    fn combinators(
        &mut self,
        node: &ObjectSchema,
        instance: &Value,
        at: &JsonPointer,
        path: &JsonPointer,
        out: &mut Output,
    ) {
        if let Some(all_of) = &node.all_of {
            let here = path.join(Keyword::AllOf.as_str());
            for (i, subschema) in all_of.iter().enumerate() {
                let sub = self.schema(subschema, instance, at, &here.join_index(i));
                out.merge(sub);
            }
        }

        if let Some(any_of) = &node.any_of {
            let here = path.join(Keyword::AnyOf.as_str());
            let mut passed = 0;
            for (i, subschema) in any_of.iter().enumerate() {
                let sub = self.schema(subschema, instance, at, &here.join_index(i));
                if sub.is_valid() {
                    passed += 1;
                }
                out.absorb(sub);
            }
            if passed == 0 {
                out.fail(
                    at,
                    here,
                    Keyword::AnyOf,
                    format!("{instance} is not valid under any of the schemas listed in the 'anyOf' keyword"),
                );
            }
        }

        if let Some(one_of) = &node.one_of {
            let here = path.join(Keyword::OneOf.as_str());
            let mut passed = Vec::new();
            for (i, subschema) in one_of.iter().enumerate() {
                let sub = self.schema(subschema, instance, at, &here.join_index(i));
                if sub.is_valid() {
                    passed.push((i, sub));
                } else {
                    out.absorb(sub);
                }
            }
            match passed.len() {
                0 => out.fail(
                    at,
                    here,
                    Keyword::OneOf,
                    format!("{instance} is not valid under any of the schemas listed in the 'oneOf' keyword"),
                ),
                1 => {
                    if let Some((_, sub)) = passed.pop() {
                        out.absorb(sub);
                    }
                }
                _ => {
                    let indices: Vec<String> = passed.iter().map(|(i, _)| i.to_string()).collect();
                    out.fail(
                        at,
                        here,
                        Keyword::OneOf,
                        format!(
                            "{instance} is valid under more than one of the schemas listed in the 'oneOf' keyword (indices {})",
                            indices.join(", ")
                        ),
                    );
                }
            }
        }

        if let Some(not) = &node.not {
            let here = path.join(Keyword::Not.as_str());
            let sub = self.schema(not, instance, at, &here);
            let passed = sub.is_valid();
            out.faults.extend(sub.faults);
            if passed {
                out.fail(
                    at,
                    here,
                    Keyword::Not,
                    format!("{instance} should not be valid under the schema in the 'not' keyword"),
                );
            }
        }
    }

    fn conditional(
        &mut self,
        node: &ObjectSchema,
        instance: &Value,
        at: &JsonPointer,
        path: &JsonPointer,
        out: &mut Output,
    ) {
        let Some(condition) = &node.if_schema else {
            return;
        };
        let sub = self.schema(condition, instance, at, &path.join(Keyword::If.as_str()));
        let holds = sub.is_valid();
        out.absorb(sub);
        let (branch, keyword) = if holds {
            (&node.then_schema, Keyword::Then)
        } else {
            (&node.else_schema, Keyword::Else)
        };
        if let Some(branch) = branch {
            let sub = self.schema(branch, instance, at, &path.join(keyword.as_str()));
            out.merge(sub);
        }
    }
}

fn check_type(node: &ObjectSchema, instance: &Value, at: &JsonPointer, path: &JsonPointer, out: &mut Output) {
    let Some(kinds) = &node.types else {
        return;
    };
    if kinds.iter().any(|kind| kind.matches(instance)) {
        return;
    }
    let message = match kinds.as_slice() {
        [single] => format!("{instance} is not of type \"{single}\""),
        many => {
            let names: Vec<String> = many.iter().map(|k| format!("\"{k}\"")).collect();
            format!("{instance} is not of types {}", names.join(", "))
        }
    };
    out.fail(at, path.join(Keyword::Type.as_str()), Keyword::Type, message);
}

fn check_enum(node: &ObjectSchema, instance: &Value, at: &JsonPointer, path: &JsonPointer, out: &mut Output) {
    let Some(options) = &node.enumeration else {
        return;
    };
    if !options.iter().any(|option| json_equal(option, instance)) {
        out.fail(
            at,
            path.join(Keyword::Enum.as_str()),
            Keyword::Enum,
            format!("{instance} is not one of {}", Value::Array(options.clone())),
        );
    }
}

fn check_const(node: &ObjectSchema, instance: &Value, at: &JsonPointer, path: &JsonPointer, out: &mut Output) {
    let Some(expected) = &node.constant else {
        return;
    };
    if !json_equal(expected, instance) {
        out.fail(
            at,
            path.join(Keyword::Const.as_str()),
            Keyword::Const,
            format!("{expected} was expected"),
        );
    }
}

fn check_numeric(node: &ObjectSchema, instance: &Value, at: &JsonPointer, path: &JsonPointer, out: &mut Output) {
    use std::cmp::Ordering::{Greater, Less};

    let Value::Number(n) = instance else {
        return;
    };
    if let Some(divisor) = &node.multiple_of {
        if !is_multiple_of(n, divisor) {
            out.fail(
                at,
                path.join(Keyword::MultipleOf.as_str()),
                Keyword::MultipleOf,
                format!("{instance} is not a multiple of {divisor}"),
            );
        }
    }
    let bounds = [
        (&node.minimum, Keyword::Minimum, "less than the minimum of"),
        (&node.maximum, Keyword::Maximum, "greater than the maximum of"),
        (&node.exclusive_minimum, Keyword::ExclusiveMinimum, "less than or equal to the minimum of"),
        (&node.exclusive_maximum, Keyword::ExclusiveMaximum, "greater than or equal to the maximum of"),
    ];
    for (bound, keyword, phrase) in bounds {
        let Some(limit) = bound else {
            continue;
        };
        let ordering = compare_numbers(n, limit);
        let violated = match keyword {
            Keyword::Minimum => ordering == Less,
            Keyword::Maximum => ordering == Greater,
            Keyword::ExclusiveMinimum => ordering != Greater,
            _ => ordering != Less,
        };
        if violated {
            out.fail(
                at,
                path.join(keyword.as_str()),
                keyword,
                format!("{instance} is {phrase} {limit}"),
            );
        }
    }
}

fn check_string(
    node: &ObjectSchema,
    instance: &Value,
    text: &str,
    at: &JsonPointer,
    path: &JsonPointer,
    out: &mut Output,
) {
    let length = text.chars().count() as u64;
    if let Some(min) = node.min_length {
        if length < min {
            out.fail(
                at,
                path.join(Keyword::MinLength.as_str()),
                Keyword::MinLength,
                format!("{instance} is shorter than {min} character{}", plural(min)),
            );
        }
    }
    if let Some(max) = node.max_length {
        if length > max {
            out.fail(
                at,
                path.join(Keyword::MaxLength.as_str()),
                Keyword::MaxLength,
                format!("{instance} is longer than {max} character{}", plural(max)),
            );
        }
    }
    if let Some(pattern) = &node.pattern {
        if !pattern.is_match(text) {
            out.fail(
                at,
                path.join(Keyword::Pattern.as_str()),
                Keyword::Pattern,
                format!("{instance} does not match \"{pattern}\""),
            );
        }
    }
}

fn check_property_counts(
    node: &ObjectSchema,
    instance: &Value,
    map: &Map<String, Value>,
    at: &JsonPointer,
    path: &JsonPointer,
    out: &mut Output,
) {
    let count = map.len() as u64;
    if let Some(min) = node.min_properties {
        if count < min {
            out.fail(
                at,
                path.join(Keyword::MinProperties.as_str()),
                Keyword::MinProperties,
                format!("{instance} has less than {min} propert{}", if min == 1 { "y" } else { "ies" }),
            );
        }
    }
    if let Some(max) = node.max_properties {
        if count > max {
            out.fail(
                at,
                path.join(Keyword::MaxProperties.as_str()),
                Keyword::MaxProperties,
                format!("{instance} has more than {max} propert{}", if max == 1 { "y" } else { "ies" }),
            );
        }
    }
}

fn check_array_bounds(
    node: &ObjectSchema,
    instance: &Value,
    items: &[Value],
    at: &JsonPointer,
    path: &JsonPointer,
    out: &mut Output,
) {
    let count = items.len() as u64;
    if let Some(min) = node.min_items {
        if count < min {
            out.fail(
                at,
                path.join(Keyword::MinItems.as_str()),
                Keyword::MinItems,
                format!("{instance} has less than {min} item{}", plural(min)),
            );
        }
    }
    if let Some(max) = node.max_items {
        if count > max {
            out.fail(
                at,
                path.join(Keyword::MaxItems.as_str()),
                Keyword::MaxItems,
                format!("{instance} has more than {max} item{}", plural(max)),
            );
        }
    }
    if node.unique_items && find_duplicate(items).is_some() {
        out.fail(
            at,
            path.join(Keyword::UniqueItems.as_str()),
            Keyword::UniqueItems,
            format!("{instance} has non-unique elements"),
        );
    }
}

fn require_all(
    names: &[String],
    trigger: &str,
    map: &Map<String, Value>,
    at: &JsonPointer,
    here: &JsonPointer,
    keyword: Keyword,
    out: &mut Output,
) {
    for name in names {
        if !map.contains_key(name) {
            out.fail(
                at,
                here.join(trigger),
                keyword,
                format!("\"{name}\" is a required property when \"{trigger}\" is present"),
            );
        }
    }
}

fn plural(n: u64) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::options;
    use serde_json::json;

    fn validate(schema: Value, instance: Value) -> ValidationResult {
        options().build(&schema).unwrap().validate(&instance)
    }

    fn keywords(result: &ValidationResult) -> Vec<Keyword> {
        result.errors().iter().map(|e| e.keyword).collect()
    }

    #[test]
    fn test_boolean_schemas() {
        assert!(validate(json!(true), json!({"anything": [1, 2]})).is_valid());
        let result = validate(json!(false), json!(null));
        assert_eq!(keywords(&result), vec![Keyword::FalseSchema]);
    }

    #[test]
    fn test_empty_object_accepts_everything() {
        for instance in [json!(null), json!(1.5), json!("x"), json!([]), json!({})] {
            assert!(validate(json!({}), instance).is_valid());
        }
    }

    #[test]
    fn test_sibling_failures_accumulate() {
        let result = validate(
            json!({"type": "string", "minLength": 5, "pattern": "^[a-z]+$"}),
            json!("AB"),
        );
        assert_eq!(keywords(&result), vec![Keyword::MinLength, Keyword::Pattern]);
    }

    #[test]
    fn test_type_messages() {
        let result = validate(json!({"type": "string"}), json!(42));
        assert_eq!(result.errors()[0].message, "42 is not of type \"string\"");
        let result = validate(json!({"type": ["string", "null"]}), json!(42));
        assert_eq!(result.errors()[0].message, "42 is not of types \"string\", \"null\"");
    }

    #[test]
    fn test_type_checked_keywords_ignore_other_kinds() {
        let schema = json!({"minLength": 3, "minimum": 10, "required": ["a"], "minItems": 2});
        assert!(validate(schema.clone(), json!(null)).is_valid());
        assert!(validate(schema.clone(), json!(true)).is_valid());
        assert!(!validate(schema, json!("ab")).is_valid());
    }

    #[test]
    fn test_numeric_bounds_coexist() {
        let schema = json!({"minimum": 0, "exclusiveMinimum": 0, "maximum": 100, "exclusiveMaximum": 100});
        let result = validate(schema.clone(), json!(0));
        assert_eq!(keywords(&result), vec![Keyword::ExclusiveMinimum]);
        let result = validate(schema.clone(), json!(100));
        assert_eq!(keywords(&result), vec![Keyword::ExclusiveMaximum]);
        let result = validate(schema.clone(), json!(-1));
        assert_eq!(keywords(&result), vec![Keyword::Minimum, Keyword::ExclusiveMinimum]);
        assert!(validate(schema, json!(50.5)).is_valid());
    }

    #[test]
    fn test_length_counts_code_points() {
        let schema = json!({"minLength": 2, "maxLength": 3});
        assert!(validate(schema.clone(), json!("日本")).is_valid());
        assert!(!validate(schema.clone(), json!("😀")).is_valid());
        assert!(!validate(schema, json!("abcd")).is_valid());
    }

    #[test]
    fn test_pattern_is_unanchored() {
        let schema = json!({"pattern": "[0-9]{3}"});
        assert!(validate(schema.clone(), json!("call 555-1234")).is_valid());
        let result = validate(schema, json!("no digits"));
        assert_eq!(result.errors()[0].message, "\"no digits\" does not match \"[0-9]{3}\"");
    }

    #[test]
    fn test_additional_properties_false_names_extras() {
        let schema = json!({
            "properties": {"name": {}},
            "patternProperties": {"^x-": {}},
            "additionalProperties": false
        });
        assert!(validate(schema.clone(), json!({"name": "a", "x-tag": 1})).is_valid());
        let result = validate(schema, json!({"name": "a", "age": 3, "city": "UK"}));
        assert_eq!(
            result.errors()[0].message,
            "Additional properties are not allowed ('age', 'city' were unexpected)"
        );
        assert_eq!(result.errors()[0].schema_path.to_string(), "/additionalProperties");
    }

    #[test]
    fn test_additional_properties_schema() {
        let schema = json!({"properties": {"id": {}}, "additionalProperties": {"type": "string"}});
        let result = validate(schema, json!({"id": 1, "a": "x", "b": 2}));
        assert_eq!(result.errors().len(), 1);
        assert_eq!(result.errors()[0].instance_path.to_string(), "/b");
    }

    #[test]
    fn test_pattern_properties_stack() {
        let schema = json!({
            "patternProperties": {
                "^S_": {"type": "string"},
                "_id$": {"minLength": 4}
            }
        });
        let result = validate(schema, json!({"S_id": "abc"}));
        assert_eq!(keywords(&result), vec![Keyword::MinLength]);
        assert_eq!(result.errors()[0].schema_path.to_string(), "/patternProperties/_id$/minLength");
    }

    #[test]
    fn test_property_names_use_object_location() {
        let schema = json!({"propertyNames": {"pattern": "^[a-z]+$"}});
        let result = validate(schema, json!({"ok": 1, "Bad": 2}));
        assert_eq!(result.errors().len(), 1);
        assert!(result.errors()[0].message.contains("\"Bad\""));
        assert!(result.errors()[0].instance_path.is_root());
    }

    #[test]
    fn test_property_count_bounds() {
        let schema = json!({"minProperties": 1, "maxProperties": 2});
        assert!(!validate(schema.clone(), json!({})).is_valid());
        assert!(validate(schema.clone(), json!({"a": 1})).is_valid());
        let result = validate(schema, json!({"a": 1, "b": 2, "c": 3}));
        assert_eq!(keywords(&result), vec![Keyword::MaxProperties]);
    }

    #[test]
    fn test_dependencies_both_forms() {
        let schema = json!({
            "dependencies": {
                "credit_card": ["billing_address"],
                "name": {"required": ["surname"]}
            }
        });
        assert!(validate(schema.clone(), json!({"other": 1})).is_valid());
        let result = validate(schema.clone(), json!({"credit_card": 5555}));
        assert_eq!(
            result.errors()[0].message,
            "\"billing_address\" is a required property when \"credit_card\" is present"
        );
        let result = validate(schema, json!({"name": "Ada"}));
        assert_eq!(keywords(&result), vec![Keyword::Required]);
        assert_eq!(result.errors()[0].schema_path.to_string(), "/dependencies/name/required");
    }

    #[test]
    fn test_dependent_required_and_schemas() {
        let schema = json!({
            "dependentRequired": {"a": ["b"]},
            "dependentSchemas": {"c": {"properties": {"d": {"type": "integer"}}}}
        });
        assert!(!validate(schema.clone(), json!({"a": 1})).is_valid());
        assert!(!validate(schema.clone(), json!({"c": 1, "d": "x"})).is_valid());
        assert!(validate(schema, json!({"a": 1, "b": 2, "c": 3, "d": 4})).is_valid());
    }

    #[test]
    fn test_list_items() {
        let schema = json!({"items": {"type": "integer"}});
        let result = validate(schema, json!([1, "two", 3, null]));
        let paths: Vec<String> = result.errors().iter().map(|e| e.instance_path.to_string()).collect();
        assert_eq!(paths, vec!["/1", "/3"]);
    }

    #[test]
    fn test_additional_items() {
        let schema = json!({"items": [{"type": "string"}], "additionalItems": false});
        assert!(validate(schema.clone(), json!(["a"])).is_valid());
        let result = validate(schema, json!(["a", 1, true]));
        assert_eq!(
            result.errors()[0].message,
            "Additional items are not allowed (1, true were unexpected)"
        );

        let schema = json!({"items": [{}], "additionalItems": {"type": "number"}});
        assert!(validate(schema.clone(), json!(["x", 1, 2.5])).is_valid());
        assert!(!validate(schema, json!(["x", "y"])).is_valid());

        let schema = json!({"items": {}, "additionalItems": false});
        assert!(validate(schema, json!([1, 2, 3])).is_valid());
    }

    #[test]
    fn test_contains() {
        let schema = json!({"contains": {"type": "number"}});
        assert!(validate(schema.clone(), json!(["life", "universe", 42])).is_valid());
        let result = validate(schema.clone(), json!(["life", "universe"]));
        assert_eq!(keywords(&result), vec![Keyword::Contains]);
        assert!(!validate(schema, json!([])).is_valid());
    }

    #[test]
    fn test_item_count_bounds() {
        let schema = json!({"minItems": 2, "maxItems": 3});
        assert!(!validate(schema.clone(), json!([1])).is_valid());
        assert!(validate(schema.clone(), json!([1, 2, 3])).is_valid());
        assert!(!validate(schema, json!([1, 2, 3, 4])).is_valid());
    }

    #[test]
    fn test_unique_items_structural() {
        let schema = json!({"uniqueItems": true});
        assert!(!validate(schema.clone(), json!([{"a": 1}, {"a": 1.0}])).is_valid());
        assert!(validate(schema.clone(), json!([[1, 2], [2, 1]])).is_valid());
        assert!(validate(json!({"uniqueItems": false}), json!([1, 1])).is_valid());
    }

    #[test]
    fn test_any_of_reports_single_failure() {
        let schema = json!({"anyOf": [{"type": "string", "maxLength": 5}, {"type": "number", "minimum": 0}]});
        assert!(validate(schema.clone(), json!("short")).is_valid());
        assert!(validate(schema.clone(), json!(12)).is_valid());
        let result = validate(schema, json!("too long"));
        assert_eq!(keywords(&result), vec![Keyword::AnyOf]);
    }

    #[test]
    fn test_one_of_exactly_one() {
        let schema = json!({"oneOf": [{"type": "number", "multipleOf": 5}, {"type": "number", "multipleOf": 3}]});
        assert!(validate(schema.clone(), json!(10)).is_valid());
        assert!(validate(schema.clone(), json!(9)).is_valid());
        let result = validate(schema.clone(), json!(15));
        assert!(result.errors()[0].message.contains("more than one"));
        assert!(!validate(schema, json!(2)).is_valid());
    }

    #[test]
    fn test_not() {
        let schema = json!({"not": {"type": "string"}});
        assert!(validate(schema.clone(), json!(42)).is_valid());
        assert_eq!(keywords(&validate(schema, json!("I am a string"))), vec![Keyword::Not]);
    }

    #[test]
    fn test_all_of_propagates_errors() {
        let schema = json!({"allOf": [{"type": "string"}, {"maxLength": 5}]});
        let result = validate(schema, json!("too long"));
        assert_eq!(keywords(&result), vec![Keyword::MaxLength]);
        assert_eq!(result.errors()[0].schema_path.to_string(), "/allOf/1/maxLength");
    }

    #[test]
    fn test_if_then_else() {
        let schema = json!({
            "if": {"properties": {"country": {"const": "United States of America"}}},
            "then": {"properties": {"postal_code": {"pattern": "[0-9]{5}(-[0-9]{4})?"}}},
            "else": {"properties": {"postal_code": {"pattern": "[A-Z][0-9][A-Z] [0-9][A-Z][0-9]"}}}
        });
        assert!(validate(schema.clone(), json!({"country": "United States of America", "postal_code": "20500"})).is_valid());
        assert!(validate(schema.clone(), json!({"country": "Canada", "postal_code": "K1M 1M4"})).is_valid());
        let result = validate(schema, json!({"country": "Canada", "postal_code": "10000"}));
        assert_eq!(result.errors()[0].schema_path.to_string(), "/else/properties/postal_code/pattern");
    }

    #[test]
    fn test_ref_merged_with_siblings() {
        let schema = json!({
            "definitions": {"name": {"type": "string"}},
            "$ref": "#/definitions/name",
            "maxLength": 3
        });
        assert!(validate(schema.clone(), json!("Ada")).is_valid());
        let result = validate(schema.clone(), json!("Grace"));
        assert_eq!(keywords(&result), vec![Keyword::MaxLength]);
        let result = validate(schema, json!(7));
        assert_eq!(keywords(&result), vec![Keyword::Type]);
        assert_eq!(result.errors()[0].schema_path.to_string(), "/$ref/type");
    }

    #[test]
    fn test_recursive_schema_over_finite_instance() {
        let schema = json!({
            "type": "object",
            "properties": {
                "name": {"type": "string"},
                "children": {"type": "array", "items": {"$ref": "#"}}
            }
        });
        let tree = json!({"name": "root", "children": [{"name": "a", "children": [{"name": "b"}]}]});
        assert!(validate(schema.clone(), tree).is_valid());
        let bad = json!({"name": "root", "children": [{"name": "a", "children": [{"name": 3}]}]});
        let result = validate(schema, bad);
        assert_eq!(result.errors()[0].instance_path.to_string(), "/children/0/children/0/name");
        assert!(result.reference_faults().is_empty());
    }

    #[test]
    fn test_self_reference_is_cyclic() {
        let result = validate(json!({"$ref": "#"}), json!(1));
        assert!(!result.is_valid());
        assert!(result.errors().is_empty());
        assert_eq!(result.reference_faults().len(), 1);
        assert_eq!(result.reference_faults()[0].error.code(), "CyclicReference");
    }

    #[test]
    fn test_mutual_reference_is_cyclic() {
        let schema = json!({
            "definitions": {
                "a": {"$ref": "#/definitions/b"},
                "b": {"$ref": "#/definitions/a"}
            },
            "$ref": "#/definitions/a"
        });
        let result = validate(schema, json!("x"));
        assert_eq!(result.reference_faults()[0].error.code(), "CyclicReference");
    }

    #[test]
    fn test_reference_depth_limit() {
        let schema = json!({"items": {"$ref": "#"}});
        let mut opts = options();
        opts.max_reference_depth(2);
        let validator = opts.build(&schema).unwrap();
        assert!(validator.is_valid(&json!([[[]]])));
        let result = validator.validate(&json!([[[[]]]]));
        assert_eq!(result.reference_faults()[0].error.code(), "RecursionLimit");
    }

    #[test]
    fn test_property_name_recursion_is_not_cyclic() {
        let schema = json!({
            "definitions": {"node": {"propertyNames": {"$ref": "#/definitions/node"}}},
            "$ref": "#/definitions/node"
        });
        let result = validate(schema, json!({"a": 1, "b": {"c": 2}}));
        assert!(result.is_valid(), "{:?}", result.reference_faults());

        let schema = json!({
            "definitions": {"short": {"maxLength": 2, "propertyNames": {"$ref": "#/definitions/short"}}},
            "$ref": "#/definitions/short"
        });
        let result = validate(schema, json!({"ok": 1, "long": 2}));
        assert_eq!(keywords(&result), vec![Keyword::MaxLength]);
        assert!(result.reference_faults().is_empty());
    }

    #[test]
    fn test_pointer_into_embedded_resource_uses_its_base() {
        let schema = json!({
            "definitions": {
                "sub": {
                    "$id": "http://x.com/sub/",
                    "definitions": {
                        "named": {"$id": "#foo", "type": "integer"},
                        "leaf": {"$ref": "#foo"}
                    }
                }
            },
            "$ref": "#/definitions/sub/definitions/leaf"
        });
        let validator = options().build(&schema).unwrap();
        let result = validator.validate(&json!(5));
        assert!(result.is_valid(), "{:?}", result.reference_faults());
        let result = validator.validate(&json!("x"));
        assert_eq!(keywords(&result), vec![Keyword::Type]);
        assert!(result.reference_faults().is_empty());
    }

    #[test]
    fn test_unknown_keyword_target_keeps_enclosing_base() {
        let schema = json!({
            "definitions": {
                "sub": {
                    "$id": "http://x.com/sub/",
                    "definitions": {"named": {"$id": "#foo", "type": "integer"}},
                    "x-library": {"leaf": {"$ref": "#foo"}}
                }
            },
            "$ref": "#/definitions/sub/x-library/leaf"
        });
        let validator = options().build(&schema).unwrap();
        assert!(validator.is_valid(&json!(5)));
        assert!(!validator.is_valid(&json!("x")));
    }

    #[test]
    fn test_dangling_pointer_fails_build() {
        let err = options()
            .build(&json!({"properties": {"a": {"$ref": "#/definitions/nope"}}}))
            .unwrap_err();
        assert_eq!(err.code(), "InvalidPointer");
    }

    #[test]
    fn test_unresolvable_reference_is_fault_not_error() {
        let schema = json!({
            "x-library": {"a": {"$ref": "#/definitions/missing"}},
            "$ref": "#/x-library/a"
        });
        let result = validate(schema, json!(1));
        assert!(!result.is_valid());
        assert!(result.errors().is_empty());
        assert_eq!(result.reference_faults()[0].error.code(), "InvalidPointer");
    }

    #[test]
    fn test_faults_survive_combinators() {
        let schema = json!({"anyOf": [{"type": "integer"}, {"$ref": "missing.json"}]});
        let result = validate(schema, json!(1));
        assert!(result.errors().is_empty());
        assert_eq!(result.reference_faults()[0].error.code(), "UnresolvableReference");
        assert!(!result.is_valid());
    }

    #[test]
    fn test_format_is_annotation_by_default() {
        let schema = json!({"format": "email"});
        let result = validate(schema.clone(), json!("not-an-email"));
        assert!(result.is_valid());
        assert_eq!(result.annotations()[0].keyword, Keyword::Format);

        let mut opts = options();
        opts.assert_formats(true);
        let validator = opts.build(&schema).unwrap();
        let result = validator.validate(&json!("not-an-email"));
        assert_eq!(result.errors()[0].message, "\"not-an-email\" is not a \"email\"");

        let validator = opts.build(&json!({"format": "shoe-size"})).unwrap();
        assert!(validator.is_valid(&json!("44")));
    }

    #[test]
    fn test_annotations_collected_at_locations() {
        let schema = json!({
            "title": "Login",
            "properties": {
                "remember": {"type": "boolean", "default": false, "description": "Keep me signed in"}
            }
        });
        let result = validate(schema, json!({"remember": true}));
        let collected: Vec<(String, Keyword)> = result
            .annotations()
            .iter()
            .map(|a| (a.instance_path.to_string(), a.keyword))
            .collect();
        assert!(collected.contains(&(String::new(), Keyword::Title)));
        assert!(collected.contains(&("/remember".to_string(), Keyword::Default)));
        assert!(collected.contains(&("/remember".to_string(), Keyword::Description)));
    }

    #[test]
    fn test_annotations_dropped_for_failed_branches() {
        let schema = json!({
            "anyOf": [
                {"type": "string", "title": "text"},
                {"type": "number", "title": "amount"}
            ]
        });
        let result = validate(schema, json!(5));
        let titles: Vec<&Value> = result.annotations().iter().map(|a| &a.value).collect();
        assert_eq!(titles, vec![&json!("amount")]);
    }

    #[test]
    fn test_annotations_can_be_disabled() {
        let mut opts = options();
        opts.collect_annotations(false);
        let validator = opts.build(&json!({"title": "x", "format": "date"})).unwrap();
        assert!(validator.validate(&json!("2020-01-01")).annotations().is_empty());
    }

    #[test]
    fn test_validator_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Validator>();
    }
}
