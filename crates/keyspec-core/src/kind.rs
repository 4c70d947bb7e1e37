//! # Value Kinds: Closed Type Tags for Data Values
//!
//! Defines the `ValueKind` enum: the seven kinds a parsed data value can
//! take. Schemas name the kind a key must hold, and the engine compares it
//! against the kind of the actual value with an exhaustive `match`.
//!
//! ## Classification Rules
//!
//! - A number representable as `i64` or `u64` is an `Integer`; every other
//!   number is a `Float`. An integer never satisfies `Float`.
//! - A boolean is only ever a `Boolean`. It never satisfies `Integer`.
//! - Exactly one kind matches any given value.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The kind of a data value.
///
/// Serialized in snake_case (`"string"`, `"integer"`, ...). Common short
/// spellings (`str`, `int`, `bool`, `dict`, `list`, ...) are accepted when
/// deserializing so schemas can be written in whichever vocabulary the
/// author is used to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    /// UTF-8 string.
    #[serde(alias = "str")]
    String,
    /// Whole number that fits in `i64` or `u64`.
    #[serde(alias = "int")]
    Integer,
    /// Any other number.
    Float,
    /// `true` or `false`.
    #[serde(alias = "bool")]
    Boolean,
    /// String-keyed object.
    #[serde(alias = "dict", alias = "object", alias = "map")]
    Mapping,
    /// Ordered array.
    #[serde(alias = "list", alias = "array")]
    Sequence,
    /// JSON `null`.
    #[serde(alias = "none")]
    Null,
}

/// All kinds, in declaration order.
pub const ALL_VALUE_KINDS: [ValueKind; 7] = [
    ValueKind::String,
    ValueKind::Integer,
    ValueKind::Float,
    ValueKind::Boolean,
    ValueKind::Mapping,
    ValueKind::Sequence,
    ValueKind::Null,
];

impl ValueKind {
    /// Classify a data value.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(_) => Self::Boolean,
            Value::Number(n) if n.is_i64() || n.is_u64() => Self::Integer,
            Value::Number(_) => Self::Float,
            Value::String(_) => Self::String,
            Value::Array(_) => Self::Sequence,
            Value::Object(_) => Self::Mapping,
        }
    }

    /// Returns true if `value` is of this kind.
    pub fn matches(self, value: &Value) -> bool {
        Self::of(value) == self
    }

    /// Canonical lowercase name, as used in schemas and diagnostics.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::Mapping => "mapping",
            Self::Sequence => "sequence",
            Self::Null => "null",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValueKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "string" | "str" => Ok(Self::String),
            "integer" | "int" => Ok(Self::Integer),
            "float" => Ok(Self::Float),
            "boolean" | "bool" => Ok(Self::Boolean),
            "mapping" | "dict" | "object" | "map" => Ok(Self::Mapping),
            "sequence" | "list" | "array" => Ok(Self::Sequence),
            "null" | "none" => Ok(Self::Null),
            other => Err(format!("unknown value kind: \"{other}\"")),
        }
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn json_value() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(|n| serde_json::json!(n)),
            (-1.0e6f64..1.0e6).prop_map(|f| serde_json::json!(f + 0.5)),
            "[a-z0-9 ]{0,16}".prop_map(Value::String),
        ];
        leaf.prop_recursive(3, 32, 6, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
                prop::collection::btree_map("[a-z]{1,8}", inner, 0..6)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    proptest! {
        /// Every value is matched by exactly one kind, the one `of` reports.
        #[test]
        fn exactly_one_kind_matches(value in json_value()) {
            let matching: Vec<ValueKind> = ALL_VALUE_KINDS
                .into_iter()
                .filter(|k| k.matches(&value))
                .collect();
            prop_assert_eq!(matching, vec![ValueKind::of(&value)]);
        }
    }
}
