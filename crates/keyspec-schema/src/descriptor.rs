//! # Schema Descriptors
//!
//! A [`Schema`] governs one mapping level: a list of required key
//! descriptors and an optional list of optional key descriptors. A
//! [`KeyDescriptor`] names one key, the [`ValueKind`] it must hold, an
//! optional set of permitted values and, for mapping-typed keys, at most one
//! [`Nesting`]:
//!
//! - [`Nesting::Fixed`]: a sub-schema applied to the nested mapping.
//! - [`Nesting::Conditional`]: a sub-schema selected at validation time by
//!   the value of a sibling key.
//!
//! ## Serialized Form
//!
//! ```yaml
//! required:
//!   - name: source_type
//!     type: string
//!     possible_values: [local, azure_storage]
//!   - name: source_info
//!     type: mapping
//!     conditional:
//!       depends_on: source_type
//!       branches:
//!         local:
//!           required: [{ name: file_path, type: string }]
//!         azure_storage:
//!           required: [{ name: connection_string, type: string }]
//! optional:
//!   - name: store_info
//!     type: mapping
//!     nested_optional: [{ name: port, type: int }]
//! ```
//!
//! The legacy vocabulary (`param_name`, `param_type`, `expected_keys`,
//! `optional_keys`, `conditional_keys`, `dependence_info`) is accepted as
//! aliases. A descriptor carrying both a fixed nesting and a conditional, or
//! carrying either on a non-mapping type, is rejected when deserialized.

use std::borrow::Cow;
use std::collections::BTreeMap;

use keyspec_core::ValueKind;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Constraints for one mapping level.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Schema {
    /// Keys that must be present.
    #[serde(default, alias = "expected_keys")]
    pub required: Vec<KeyDescriptor>,
    /// Keys that may be present. `None` and an empty list both accept no
    /// optional keys.
    #[serde(default, alias = "optional_keys", skip_serializing_if = "Option::is_none")]
    pub optional: Option<Vec<KeyDescriptor>>,
}

impl Schema {
    /// A schema with the given required keys and no optional list.
    pub fn new(required: Vec<KeyDescriptor>) -> Self {
        Self {
            required,
            optional: None,
        }
    }

    /// Attach an optional-key list.
    pub fn with_optional(mut self, optional: Vec<KeyDescriptor>) -> Self {
        self.optional = Some(optional);
        self
    }

    /// The optional-key list as a slice, if one was supplied.
    pub fn optional_keys(&self) -> Option<&[KeyDescriptor]> {
        self.optional.as_deref()
    }

    /// All descriptors at this level, required first.
    pub fn descriptors(&self) -> impl Iterator<Item = &KeyDescriptor> {
        self.required
            .iter()
            .chain(self.optional_keys().unwrap_or_default())
    }

    /// Look up a descriptor declared at this level.
    pub fn descriptor(&self, name: &str) -> Option<&KeyDescriptor> {
        self.descriptors().find(|d| d.name == name)
    }

    /// Returns true if `name` is declared as required or optional.
    pub fn declares(&self, name: &str) -> bool {
        self.descriptor(name).is_some()
    }
}

/// Nested constraints for a mapping-typed key.
#[derive(Debug, Clone, PartialEq)]
pub enum Nesting {
    /// Sub-schema applied unconditionally.
    Fixed(Schema),
    /// Sub-schema selected by the value of a sibling key.
    Conditional(Conditional),
}

/// Branch selection for a conditional key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Conditional {
    /// Sibling key, in the same enclosing mapping, whose value selects the
    /// branch.
    pub depends_on: String,
    /// One sub-schema per legal dependency value.
    #[serde(alias = "dependence_info")]
    pub branches: BTreeMap<String, Schema>,
}

impl Conditional {
    /// A conditional with no branches yet.
    pub fn new(depends_on: impl Into<String>) -> Self {
        Self {
            depends_on: depends_on.into(),
            branches: BTreeMap::new(),
        }
    }

    /// Add the branch selected by `value`.
    pub fn with_branch(mut self, value: impl Into<String>, schema: Schema) -> Self {
        self.branches.insert(value.into(), schema);
        self
    }

    /// The branch key a dependency value selects.
    ///
    /// Strings select by their contents; booleans and numbers by their JSON
    /// text. Nulls, sequences and mappings select nothing.
    pub fn branch_key(value: &Value) -> Option<Cow<'_, str>> {
        match value {
            Value::String(s) => Some(Cow::Borrowed(s.as_str())),
            Value::Bool(_) | Value::Number(_) => Some(Cow::Owned(value.to_string())),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    /// The branch selected by a dependency value.
    pub fn branch_for(&self, value: &Value) -> Option<&Schema> {
        Self::branch_key(value).and_then(|key| self.branches.get(key.as_ref()))
    }
}

/// Rule for one named key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawKeyDescriptor", into = "RawKeyDescriptor")]
pub struct KeyDescriptor {
    /// The key as it appears in the data mapping.
    pub name: String,
    /// Kind the value must have.
    pub expected_type: ValueKind,
    /// Permitted values, compared by JSON equality.
    pub possible_values: Option<Vec<Value>>,
    /// Nested constraints (mapping-typed keys only).
    pub nesting: Option<Nesting>,
}

impl KeyDescriptor {
    /// A descriptor with only a name and kind.
    pub fn new(name: impl Into<String>, expected_type: ValueKind) -> Self {
        Self {
            name: name.into(),
            expected_type,
            possible_values: None,
            nesting: None,
        }
    }

    /// Restrict the key to the given values.
    pub fn with_values(mut self, values: impl IntoIterator<Item = Value>) -> Self {
        self.possible_values = Some(values.into_iter().collect());
        self
    }

    /// Apply a fixed sub-schema to the nested mapping.
    pub fn with_nested(mut self, schema: Schema) -> Self {
        self.nesting = Some(Nesting::Fixed(schema));
        self
    }

    /// Select the nested sub-schema by a sibling's value.
    pub fn with_conditional(mut self, conditional: Conditional) -> Self {
        self.nesting = Some(Nesting::Conditional(conditional));
        self
    }

    /// The fixed sub-schema, if any.
    pub fn fixed(&self) -> Option<&Schema> {
        match &self.nesting {
            Some(Nesting::Fixed(schema)) => Some(schema),
            _ => None,
        }
    }

    /// The conditional, if any.
    pub fn conditional(&self) -> Option<&Conditional> {
        match &self.nesting {
            Some(Nesting::Conditional(conditional)) => Some(conditional),
            _ => None,
        }
    }

    /// Returns true if `value` is permitted by `possible_values`. A
    /// descriptor without a value set permits everything.
    pub fn permits(&self, value: &Value) -> bool {
        self.possible_values
            .as_ref()
            .map_or(true, |allowed| allowed.contains(value))
    }

    /// Returns true if the descriptor carries constraints beyond presence and
    /// kind.
    pub fn is_refined(&self) -> bool {
        self.possible_values.is_some() || self.nesting.is_some()
    }
}

/// A descriptor could not be built from its serialized form.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DescriptorError {
    /// Both a fixed sub-schema and a conditional were given.
    #[error("key '{name}' has both nested keys and a conditional; at most one is allowed")]
    ConflictingNesting {
        /// Descriptor name.
        name: String,
    },

    /// Nesting was given on a key that is not a mapping.
    #[error("key '{name}' has type {kind} but nested keys or a conditional require type mapping")]
    NestingOnScalar {
        /// Descriptor name.
        name: String,
        /// Declared kind.
        kind: ValueKind,
    },
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawKeyDescriptor {
    #[serde(alias = "param_name")]
    name: String,
    #[serde(rename = "type", alias = "param_type")]
    expected_type: ValueKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    possible_values: Option<Vec<Value>>,
    #[serde(default, alias = "expected_keys", skip_serializing_if = "Option::is_none")]
    nested_required: Option<Vec<KeyDescriptor>>,
    #[serde(default, alias = "optional_keys", skip_serializing_if = "Option::is_none")]
    nested_optional: Option<Vec<KeyDescriptor>>,
    #[serde(default, alias = "conditional_keys", skip_serializing_if = "Option::is_none")]
    conditional: Option<Conditional>,
}

impl TryFrom<RawKeyDescriptor> for KeyDescriptor {
    type Error = DescriptorError;

    fn try_from(raw: RawKeyDescriptor) -> Result<Self, Self::Error> {
        let fixed = match (raw.nested_required, raw.nested_optional) {
            (None, None) => None,
            (required, optional) => Some(Schema {
                required: required.unwrap_or_default(),
                optional,
            }),
        };

        let nesting = match (fixed, raw.conditional) {
            (Some(_), Some(_)) => {
                return Err(DescriptorError::ConflictingNesting { name: raw.name });
            }
            (Some(schema), None) => Some(Nesting::Fixed(schema)),
            (None, Some(conditional)) => Some(Nesting::Conditional(conditional)),
            (None, None) => None,
        };

        if nesting.is_some() && raw.expected_type != ValueKind::Mapping {
            return Err(DescriptorError::NestingOnScalar {
                name: raw.name,
                kind: raw.expected_type,
            });
        }

        Ok(Self {
            name: raw.name,
            expected_type: raw.expected_type,
            possible_values: raw.possible_values,
            nesting,
        })
    }
}

impl From<KeyDescriptor> for RawKeyDescriptor {
    fn from(descriptor: KeyDescriptor) -> Self {
        let (nested_required, nested_optional, conditional) = match descriptor.nesting {
            Some(Nesting::Fixed(schema)) => (Some(schema.required), schema.optional, None),
            Some(Nesting::Conditional(conditional)) => (None, None, Some(conditional)),
            None => (None, None, None),
        };
        Self {
            name: descriptor.name,
            expected_type: descriptor.expected_type,
            possible_values: descriptor.possible_values,
            nested_required,
            nested_optional,
            conditional,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_simple_descriptor_with_values() {
        let d: KeyDescriptor = serde_json::from_value(json!({
            "name": "mode",
            "type": "string",
            "possible_values": ["a", "b"]
        }))
        .unwrap();
        assert_eq!(d.name, "mode");
        assert_eq!(d.expected_type, ValueKind::String);
        assert!(d.permits(&json!("a")));
        assert!(!d.permits(&json!("c")));
        assert!(d.nesting.is_none());
    }

    #[test]
    fn nested_optional_alone_builds_fixed_schema_with_no_required_keys() {
        let d: KeyDescriptor = serde_json::from_value(json!({
            "name": "store_info",
            "type": "mapping",
            "nested_optional": [{"name": "port", "type": "int"}]
        }))
        .unwrap();
        let fixed = d.fixed().unwrap();
        assert!(fixed.required.is_empty());
        assert_eq!(fixed.optional_keys().unwrap()[0].name, "port");
    }

    #[test]
    fn parses_legacy_vocabulary() {
        let d: KeyDescriptor = serde_json::from_value(json!({
            "param_name": "source_info",
            "param_type": "dict",
            "conditional_keys": {
                "depends_on": "source_type",
                "dependence_info": {
                    "local": {
                        "expected_keys": [{"param_name": "file_path", "param_type": "str"}],
                        "optional_keys": [{"param_name": "dir_path", "param_type": "str"}]
                    }
                }
            }
        }))
        .unwrap();
        let conditional = d.conditional().unwrap();
        assert_eq!(conditional.depends_on, "source_type");
        let local = &conditional.branches["local"];
        assert_eq!(local.required[0].name, "file_path");
        assert_eq!(local.optional_keys().unwrap()[0].name, "dir_path");
    }

    #[test]
    fn rejects_fixed_and_conditional_together() {
        let err = serde_json::from_value::<KeyDescriptor>(json!({
            "name": "cfg",
            "type": "mapping",
            "nested_required": [],
            "conditional": {"depends_on": "kind", "branches": {}}
        }))
        .unwrap_err();
        assert!(err.to_string().contains("at most one"), "got: {err}");
    }

    #[test]
    fn rejects_nesting_on_scalar_type() {
        let err = serde_json::from_value::<KeyDescriptor>(json!({
            "name": "port",
            "type": "integer",
            "nested_required": [{"name": "x", "type": "string"}]
        }))
        .unwrap_err();
        assert!(err.to_string().contains("require type mapping"), "got: {err}");
    }

    #[test]
    fn rejects_unknown_descriptor_fields() {
        assert!(serde_json::from_value::<KeyDescriptor>(json!({
            "name": "port",
            "type": "integer",
            "default": 80
        }))
        .is_err());
    }

    #[test]
    fn branch_key_uses_json_text_for_scalars() {
        assert_eq!(Conditional::branch_key(&json!("local")).as_deref(), Some("local"));
        assert_eq!(Conditional::branch_key(&json!(true)).as_deref(), Some("true"));
        assert_eq!(Conditional::branch_key(&json!(2)).as_deref(), Some("2"));
        assert_eq!(Conditional::branch_key(&Value::Null), None);
        assert_eq!(Conditional::branch_key(&json!(["local"])), None);
    }

    #[test]
    fn branch_for_selects_by_value() {
        let conditional = Conditional::new("version")
            .with_branch("1", Schema::default())
            .with_branch("2", Schema::new(vec![KeyDescriptor::new("x", ValueKind::Null)]));
        assert!(conditional.branch_for(&json!(2)).unwrap().declares("x"));
        assert!(conditional.branch_for(&json!(3)).is_none());
        assert!(conditional.branch_for(&json!("1")).is_some());
    }

    #[test]
    fn schema_lookup_spans_required_and_optional() {
        let schema = Schema::new(vec![KeyDescriptor::new("a", ValueKind::String)])
            .with_optional(vec![KeyDescriptor::new("b", ValueKind::Integer)]);
        assert!(schema.declares("a"));
        assert!(schema.declares("b"));
        assert!(!schema.declares("c"));
        assert_eq!(schema.descriptors().count(), 2);
    }

    #[test]
    fn serialized_descriptor_reads_back_identically() {
        let original = KeyDescriptor::new("cfg", ValueKind::Mapping).with_nested(
            Schema::new(vec![KeyDescriptor::new("port", ValueKind::Integer)])
                .with_optional(vec![KeyDescriptor::new("host", ValueKind::String)]),
        );
        let value = serde_json::to_value(&original).unwrap();
        assert_eq!(value["type"], "mapping");
        assert_eq!(value["nested_required"][0]["name"], "port");
        let back: KeyDescriptor = serde_json::from_value(value).unwrap();
        assert_eq!(back, original);
    }
}
