//! # Keyword Set
//!
//! The closed set of keywords the compiler recognizes. Anything else in a
//! schema object is kept verbatim as an unknown keyword.

use std::fmt;

use serde::{Serialize, Serializer};

/// A recognized schema keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    // Core
    Ref,
    Id,
    Anchor,
    SchemaUri,
    Comment,
    Defs,
    Definitions,
    // Any instance
    Type,
    Enum,
    Const,
    // Numbers
    MultipleOf,
    Minimum,
    Maximum,
    ExclusiveMinimum,
    ExclusiveMaximum,
    // Strings
    MinLength,
    MaxLength,
    Pattern,
    Format,
    // Objects
    Properties,
    PatternProperties,
    AdditionalProperties,
    Required,
    PropertyNames,
    MinProperties,
    MaxProperties,
    Dependencies,
    DependentRequired,
    DependentSchemas,
    // Arrays
    Items,
    AdditionalItems,
    Contains,
    MinItems,
    MaxItems,
    UniqueItems,
    // Combinators
    AllOf,
    AnyOf,
    OneOf,
    Not,
    If,
    Then,
    Else,
    // Annotations
    Title,
    Description,
    Default,
    Examples,
    /// Not a keyword in the document: reported when `false` rejects an instance.
    FalseSchema,
}

const NAMES: &[(Keyword, &str)] = &[
    (Keyword::Ref, "$ref"),
    (Keyword::Id, "$id"),
    (Keyword::Anchor, "$anchor"),
    (Keyword::SchemaUri, "$schema"),
    (Keyword::Comment, "$comment"),
    (Keyword::Defs, "$defs"),
    (Keyword::Definitions, "definitions"),
    (Keyword::Type, "type"),
    (Keyword::Enum, "enum"),
    (Keyword::Const, "const"),
    (Keyword::MultipleOf, "multipleOf"),
    (Keyword::Minimum, "minimum"),
    (Keyword::Maximum, "maximum"),
    (Keyword::ExclusiveMinimum, "exclusiveMinimum"),
    (Keyword::ExclusiveMaximum, "exclusiveMaximum"),
    (Keyword::MinLength, "minLength"),
    (Keyword::MaxLength, "maxLength"),
    (Keyword::Pattern, "pattern"),
    (Keyword::Format, "format"),
    (Keyword::Properties, "properties"),
    (Keyword::PatternProperties, "patternProperties"),
    (Keyword::AdditionalProperties, "additionalProperties"),
    (Keyword::Required, "required"),
    (Keyword::PropertyNames, "propertyNames"),
    (Keyword::MinProperties, "minProperties"),
    (Keyword::MaxProperties, "maxProperties"),
    (Keyword::Dependencies, "dependencies"),
    (Keyword::DependentRequired, "dependentRequired"),
    (Keyword::DependentSchemas, "dependentSchemas"),
    (Keyword::Items, "items"),
    (Keyword::AdditionalItems, "additionalItems"),
    (Keyword::Contains, "contains"),
    (Keyword::MinItems, "minItems"),
    (Keyword::MaxItems, "maxItems"),
    (Keyword::UniqueItems, "uniqueItems"),
    (Keyword::AllOf, "allOf"),
    (Keyword::AnyOf, "anyOf"),
    (Keyword::OneOf, "oneOf"),
    (Keyword::Not, "not"),
    (Keyword::If, "if"),
    (Keyword::Then, "then"),
    (Keyword::Else, "else"),
    (Keyword::Title, "title"),
    (Keyword::Description, "description"),
    (Keyword::Default, "default"),
    (Keyword::Examples, "examples"),
    (Keyword::FalseSchema, "false"),
];

impl Keyword {
    /// Look up a keyword by its JSON name. `"false"` is not a schema
    /// keyword and never matches.
    pub fn from_name(name: &str) -> Option<Keyword> {
        NAMES
            .iter()
            .find(|(kw, n)| *n == name && *kw != Keyword::FalseSchema)
            .map(|(kw, _)| *kw)
    }

    /// The JSON spelling of this keyword.
    pub fn as_str(self) -> &'static str {
        NAMES
            .iter()
            .find(|(kw, _)| *kw == self)
            .map(|(_, n)| *n)
            .unwrap_or("false")
    }

    /// Keywords that attach metadata and never affect the outcome.
    pub fn is_annotation(self) -> bool {
        matches!(
            self,
            Keyword::Title | Keyword::Description | Keyword::Default | Keyword::Examples
        )
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Keyword {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for (kw, name) in NAMES {
            assert_eq!(kw.as_str(), *name);
            if *kw != Keyword::FalseSchema {
                assert_eq!(Keyword::from_name(name), Some(*kw));
            }
        }
    }

    #[test]
    fn test_unknown_names() {
        assert_eq!(Keyword::from_name("x-internal"), None);
        assert_eq!(Keyword::from_name("false"), None);
        assert_eq!(Keyword::from_name("Type"), None);
    }

    #[test]
    fn test_annotation_keywords() {
        assert!(Keyword::Title.is_annotation());
        assert!(Keyword::Examples.is_annotation());
        assert!(!Keyword::Format.is_annotation());
        assert!(!Keyword::Required.is_annotation());
    }
}
