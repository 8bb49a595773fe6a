//! # Text Parsing
//!
//! JSON text goes through `serde_json` with insertion-ordered objects.
//! YAML documents are accepted for instances and converted into the same
//! value tree; only the JSON-compatible subset of YAML is meaningful here.

use serde_json::{Map, Number, Value};
use serde_yaml::Value as Yaml;

use crate::error::CoreError;
use crate::pointer::JsonPointer;

/// Parse JSON text into a value.
///
/// # Errors
///
/// Returns `CoreError::MalformedJson` with the parser's line/column message.
pub fn parse_json(text: &str, source_name: &str) -> Result<Value, CoreError> {
    serde_json::from_str(text).map_err(|e| CoreError::MalformedJson {
        source_name: source_name.to_string(),
        reason: e.to_string(),
    })
}

/// Parse YAML text into a JSON value.
///
/// Tags are dropped. Scalar map keys become strings.
///
/// # Errors
///
/// Returns `CoreError::MalformedYaml` if the text is not YAML or uses a
/// construct with no JSON equivalent (non-scalar map keys, non-finite
/// floats). The reason names the location of the offending node.
pub fn parse_yaml(text: &str, source_name: &str) -> Result<Value, CoreError> {
    let malformed = |reason: String| CoreError::MalformedYaml {
        source_name: source_name.to_string(),
        reason,
    };
    let yaml: Yaml = serde_yaml::from_str(text).map_err(|e| malformed(e.to_string()))?;
    into_json(yaml, &JsonPointer::root()).map_err(malformed)
}

fn into_json(yaml: Yaml, at: &JsonPointer) -> Result<Value, String> {
    Ok(match yaml {
        Yaml::Null => Value::Null,
        Yaml::Bool(b) => Value::Bool(b),
        Yaml::Number(n) => Value::Number(
            number(&n).ok_or_else(|| format!("{n} at '{at}' has no JSON representation"))?,
        ),
        Yaml::String(text) => Value::String(text),
        Yaml::Sequence(items) => Value::Array(
            items
                .into_iter()
                .enumerate()
                .map(|(i, item)| into_json(item, &at.join_index(i)))
                .collect::<Result<_, _>>()?,
        ),
        Yaml::Mapping(entries) => {
            let mut object = Map::with_capacity(entries.len());
            for (key, value) in entries {
                let key = map_key(key).map_err(|kind| format!("{kind} used as a map key at '{at}'"))?;
                let value = into_json(value, &at.join(key.as_str()))?;
                object.insert(key, value);
            }
            Value::Object(object)
        }
        Yaml::Tagged(tagged) => into_json(tagged.value, at)?,
    })
}

fn number(n: &serde_yaml::Number) -> Option<Number> {
    n.as_u64()
        .map(Number::from)
        .or_else(|| n.as_i64().map(Number::from))
        .or_else(|| n.as_f64().and_then(Number::from_f64))
}

/// The string form of a scalar key, or the kind of the key that has none.
fn map_key(key: Yaml) -> Result<String, &'static str> {
    match key {
        Yaml::String(text) => Ok(text),
        Yaml::Number(n) => Ok(n.to_string()),
        Yaml::Bool(b) => Ok(b.to_string()),
        Yaml::Tagged(tagged) => map_key(tagged.value),
        Yaml::Null => Err("null"),
        Yaml::Sequence(_) => Err("a sequence"),
        Yaml::Mapping(_) => Err("a mapping"),
    }
}
