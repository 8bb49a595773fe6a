//! # Runtime Kinds
//!
//! The seven kind names accepted by the `type` keyword.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::numeric::is_integral;

/// A JSON Schema primitive type name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JsonKind {
    Null,
    Boolean,
    Integer,
    Number,
    String,
    Array,
    Object,
}

/// Returned when a `type` keyword names something that is not a kind.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown type name '{0}'")]
pub struct UnknownKind(pub String);

impl JsonKind {
    /// All kinds, in declaration order.
    pub const ALL: [JsonKind; 7] = [
        JsonKind::Null,
        JsonKind::Boolean,
        JsonKind::Integer,
        JsonKind::Number,
        JsonKind::String,
        JsonKind::Array,
        JsonKind::Object,
    ];

    /// The most specific kind of a value. Integral numbers report `Integer`.
    pub fn of(value: &Value) -> JsonKind {
        match value {
            Value::Null => JsonKind::Null,
            Value::Bool(_) => JsonKind::Boolean,
            Value::Number(n) if is_integral(n) => JsonKind::Integer,
            Value::Number(_) => JsonKind::Number,
            Value::String(_) => JsonKind::String,
            Value::Array(_) => JsonKind::Array,
            Value::Object(_) => JsonKind::Object,
        }
    }

    /// Whether `value` is an instance of this kind.
    ///
    /// `number` accepts every number; `integer` accepts numbers whose value
    /// has a zero fractional part, including `1.0`.
    pub fn matches(self, value: &Value) -> bool {
        match (self, JsonKind::of(value)) {
            (JsonKind::Number, JsonKind::Integer) => true,
            (expected, actual) => expected == actual,
        }
    }

    /// The keyword spelling of this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            JsonKind::Null => "null",
            JsonKind::Boolean => "boolean",
            JsonKind::Integer => "integer",
            JsonKind::Number => "number",
            JsonKind::String => "string",
            JsonKind::Array => "array",
            JsonKind::Object => "object",
        }
    }
}

impl fmt::Display for JsonKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JsonKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JsonKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownKind(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_of_each_variant() {
        assert_eq!(JsonKind::of(&json!(null)), JsonKind::Null);
        assert_eq!(JsonKind::of(&json!(true)), JsonKind::Boolean);
        assert_eq!(JsonKind::of(&json!(3)), JsonKind::Integer);
        assert_eq!(JsonKind::of(&json!(3.5)), JsonKind::Number);
        assert_eq!(JsonKind::of(&json!("x")), JsonKind::String);
        assert_eq!(JsonKind::of(&json!([])), JsonKind::Array);
        assert_eq!(JsonKind::of(&json!({})), JsonKind::Object);
    }

    #[test]
    fn test_integer_accepts_zero_fraction() {
        assert!(JsonKind::Integer.matches(&json!(1.0)));
        assert!(JsonKind::Integer.matches(&json!(-7)));
        assert!(!JsonKind::Integer.matches(&json!(1.5)));
    }

    #[test]
    fn test_number_accepts_integers() {
        assert!(JsonKind::Number.matches(&json!(42)));
        assert!(JsonKind::Number.matches(&json!(0.25)));
        assert!(!JsonKind::Number.matches(&json!("42")));
    }

    #[test]
    fn test_parse_kind_names() {
        assert_eq!("object".parse::<JsonKind>().unwrap(), JsonKind::Object);
        assert_eq!(
            "float".parse::<JsonKind>().unwrap_err(),
            UnknownKind("float".to_string())
        );
    }

    #[test]
    fn test_serde_uses_lowercase_names() {
        let encoded = serde_json::to_string(&JsonKind::Boolean).unwrap();
        assert_eq!(encoded, "\"boolean\"");
    }
}
