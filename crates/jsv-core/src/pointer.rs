//! # JSON Pointer (RFC 6901)
//!
//! A pointer is a sequence of reference tokens. In text form each token is
//! prefixed with `/` and escaped with `~1` for `/` and `~0` for `~`. The
//! empty string addresses the whole document.
//!
//! The same type names locations in two places:
//!
//! - `$ref` fragments such as `#/definitions/address`, resolved with
//!   [`JsonPointer::resolve`] against a schema document.
//! - Instance and schema locations in validation output, built up with
//!   [`JsonPointer::join`] while the validator descends.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::error::CoreError;

/// A parsed JSON Pointer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct JsonPointer {
    tokens: Vec<String>,
}

impl JsonPointer {
    /// The pointer to the whole document.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse the text form of a pointer.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::MalformedPointer` if the text is non-empty and
    /// does not start with `/`, or contains a `~` not followed by `0` or `1`.
    pub fn parse(text: &str) -> Result<Self, CoreError> {
        if text.is_empty() {
            return Ok(Self::root());
        }
        let Some(rest) = text.strip_prefix('/') else {
            return Err(CoreError::MalformedPointer {
                pointer: text.to_string(),
                reason: "pointer must be empty or start with '/'".to_string(),
            });
        };
        let tokens = rest
            .split('/')
            .map(|raw| {
                unescape_token(raw).ok_or_else(|| CoreError::MalformedPointer {
                    pointer: text.to_string(),
                    reason: format!("invalid escape sequence in token '{raw}'"),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { tokens })
    }

    /// Unescaped reference tokens, outermost first.
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Returns true for the whole-document pointer.
    pub fn is_root(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Number of reference tokens.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Returns true for the whole-document pointer.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Append one unescaped token in place.
    pub fn push(&mut self, token: impl Into<String>) {
        self.tokens.push(token.into());
    }

    /// A new pointer one level below this one.
    pub fn join(&self, token: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.push(token);
        next
    }

    /// A new pointer to an array element below this one.
    pub fn join_index(&self, index: usize) -> Self {
        self.join(index.to_string())
    }

    /// Walk `document` along this pointer.
    ///
    /// Object members are selected by key; array elements by a decimal
    /// index without leading zeros.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidPointer` naming the first segment that
    /// does not exist.
    pub fn resolve<'v>(&self, document: &'v Value) -> Result<&'v Value, CoreError> {
        let mut current = document;
        for (depth, token) in self.tokens.iter().enumerate() {
            let next = match current {
                Value::Object(map) => map.get(token),
                Value::Array(items) => parse_index(token).and_then(|i| items.get(i)),
                _ => None,
            };
            current = next.ok_or_else(|| CoreError::InvalidPointer {
                pointer: self.to_string(),
                reason: format!(
                    "segment {} ('{}') not found",
                    depth + 1,
                    escape_token(token)
                ),
            })?;
        }
        Ok(current)
    }
}

/// Escape a reference token for the text form.
pub fn escape_token(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

fn unescape_token(raw: &str) -> Option<String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '~' {
            match chars.next() {
                Some('0') => out.push('~'),
                Some('1') => out.push('/'),
                _ => return None,
            }
        } else {
            out.push(c);
        }
    }
    Some(out)
}

fn parse_index(token: &str) -> Option<usize> {
    if token.is_empty() || (token.len() > 1 && token.starts_with('0')) {
        return None;
    }
    if !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}

impl fmt::Display for JsonPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for token in &self.tokens {
            write!(f, "/{}", escape_token(token))?;
        }
        Ok(())
    }
}

impl FromStr for JsonPointer {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for JsonPointer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_root() {
        assert!(JsonPointer::parse("").unwrap().is_root());
        assert_eq!(JsonPointer::parse("/").unwrap().tokens(), &["".to_string()]);
    }

    #[test]
    fn test_parse_unescapes_tokens() {
        let p = JsonPointer::parse("/a~1b/m~0n").unwrap();
        assert_eq!(p.tokens(), &["a/b".to_string(), "m~n".to_string()]);
        assert_eq!(p.to_string(), "/a~1b/m~0n");
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(matches!(
            JsonPointer::parse("definitions/a"),
            Err(CoreError::MalformedPointer { .. })
        ));
        assert!(matches!(
            JsonPointer::parse("/a~2"),
            Err(CoreError::MalformedPointer { .. })
        ));
        assert!(JsonPointer::parse("/trailing~").is_err());
    }

    #[test]
    fn test_resolve_objects_and_arrays() {
        let doc = json!({
            "definitions": {"a/b": {"type": "string"}},
            "items": [{"type": "integer"}, {"type": "null"}]
        });
        let p = JsonPointer::parse("/definitions/a~1b/type").unwrap();
        assert_eq!(p.resolve(&doc).unwrap(), &json!("string"));
        let p = JsonPointer::parse("/items/1").unwrap();
        assert_eq!(p.resolve(&doc).unwrap(), &json!({"type": "null"}));
    }

    #[test]
    fn test_resolve_missing_segment() {
        let doc = json!({"items": [1, 2]});
        for text in ["/missing", "/items/2", "/items/01", "/items/-"] {
            let p = JsonPointer::parse(text).unwrap();
            assert!(
                matches!(p.resolve(&doc), Err(CoreError::InvalidPointer { .. })),
                "{text} should not resolve"
            );
        }
    }

    #[test]
    fn test_join_builds_locations() {
        let p = JsonPointer::root().join("properties").join("x/y").join_index(3);
        assert_eq!(p.to_string(), "/properties/x~1y/3");
        assert_eq!(p.len(), 3);
    }

    #[test]
    fn test_serializes_as_text() {
        let p = JsonPointer::root().join("a").join_index(0);
        assert_eq!(serde_json::to_value(&p).unwrap(), json!("/a/0"));
    }
}
