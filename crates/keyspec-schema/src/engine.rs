//! # Validation Engine
//!
//! Walks a data mapping and a [`Schema`] in lock-step. Three mutually
//! recursive operations make up the engine:
//!
//! - [`validate`]: rejects keys the level does not declare, then runs the
//!   required-key pass and, if an optional list was supplied, the
//!   optional-key pass.
//! - [`validate_expected`]: presence of every required key, then kind of
//!   every required key, then per-key refinement (permitted values, fixed
//!   nesting, conditional branch).
//! - [`validate_optional`]: kind of every present optional key, recursing
//!   into nested optional lists.
//!
//! Unknown-key rejection is re-derived at every level reached through
//! [`validate`], so nested mappings governed by a fixed or conditional
//! sub-schema are always checked for undeclared keys.
//!
//! ## Diagnostics and Faults
//!
//! Each rejection reports exactly one [`Diagnostic`] to the injected sink
//! and yields `Ok(false)`. A conditional whose dependency value has no
//! branch, or whose dependency is absent, yields `Err(SchemaFault)`.
//!
//! ## Sibling Policy
//!
//! With [`SiblingPolicy::ShortCircuit`] (the default), the first conditional
//! descriptor in a required list, and the first nested optional list in an
//! optional list, decide the verdict of the whole pass: descriptors after
//! them are not refined. [`SiblingPolicy::Continue`] keeps going after a
//! passing recursion and requires every descriptor to pass.

use std::collections::HashSet;

use keyspec_core::{Diagnostic, DiagnosticSink, KeyPath, SchemaFault, ValueKind, Verdict};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::descriptor::{Conditional, KeyDescriptor, Nesting, Schema};

/// What happens to sibling descriptors after a nested recursion passes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SiblingPolicy {
    /// The recursion's verdict is the verdict of the whole pass.
    #[default]
    ShortCircuit,
    /// Remaining siblings are still checked; all must pass.
    Continue,
}

/// Engine configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidatorOptions {
    /// Handling of siblings after a nested or conditional recursion.
    pub nested_siblings: SiblingPolicy,
}

/// The validation engine.
///
/// Holds only its options; every call is independent. `Validator` is
/// `Send + Sync` and may be shared across threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct Validator {
    options: ValidatorOptions,
}

impl Validator {
    /// Create a validator with the given options.
    pub fn new(options: ValidatorOptions) -> Self {
        Self { options }
    }

    /// The options this validator was built with.
    pub fn options(&self) -> &ValidatorOptions {
        &self.options
    }

    /// Validate a parsed document against a schema.
    ///
    /// A document whose root is not a mapping is rejected with a
    /// `WrongType` diagnostic at the root path.
    pub fn validate_document(
        &self,
        schema: &Schema,
        document: &Value,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<bool, SchemaFault> {
        let Some(mapping) = document.as_object() else {
            sink.report(Diagnostic::wrong_type(KeyPath::root(), ValueKind::Mapping, document));
            return Ok(false);
        };
        self.validate(mapping, &schema.required, schema.optional_keys(), sink)
    }

    /// Validate a document and collect its diagnostics into a [`Verdict`].
    pub fn verdict(&self, schema: &Schema, document: &Value) -> Result<Verdict, SchemaFault> {
        let mut diagnostics: Vec<Diagnostic> = Vec::new();
        let valid = self.validate_document(schema, document, &mut diagnostics)?;
        Ok(Verdict::new(valid, diagnostics))
    }

    /// Orchestration: unknown-key rejection, then required keys, then
    /// optional keys.
    pub fn validate(
        &self,
        data: &Map<String, Value>,
        required: &[KeyDescriptor],
        optional: Option<&[KeyDescriptor]>,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<bool, SchemaFault> {
        self.orchestrate(data, required, optional, &KeyPath::root(), sink)
    }

    /// Required-key validation.
    pub fn validate_expected(
        &self,
        data: &Map<String, Value>,
        required: &[KeyDescriptor],
        sink: &mut dyn DiagnosticSink,
    ) -> Result<bool, SchemaFault> {
        self.required_keys(data, required, &KeyPath::root(), sink)
    }

    /// Optional-key validation. Cannot fault: optional keys never select
    /// conditional branches.
    pub fn validate_optional(
        &self,
        data: &Map<String, Value>,
        optional: &[KeyDescriptor],
        sink: &mut dyn DiagnosticSink,
    ) -> bool {
        self.optional_keys(data, optional, &KeyPath::root(), sink)
    }

    fn orchestrate(
        &self,
        data: &Map<String, Value>,
        required: &[KeyDescriptor],
        optional: Option<&[KeyDescriptor]>,
        at: &KeyPath,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<bool, SchemaFault> {
        let declared: HashSet<&str> = required
            .iter()
            .chain(optional.unwrap_or_default())
            .map(|d| d.name.as_str())
            .collect();

        if let Some(unknown) = data.keys().find(|key| !declared.contains(key.as_str())) {
            sink.report(Diagnostic::unknown_key(at.child(unknown)));
            return Ok(false);
        }

        if !self.required_keys(data, required, at, sink)? {
            return Ok(false);
        }

        match optional {
            Some(optional) => Ok(self.optional_keys(data, optional, at, sink)),
            None => Ok(true),
        }
    }

    fn required_keys(
        &self,
        data: &Map<String, Value>,
        required: &[KeyDescriptor],
        at: &KeyPath,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<bool, SchemaFault> {
        // Presence of every key is settled before any kind is inspected.
        let mut present = Vec::with_capacity(required.len());
        for descriptor in required {
            match data.get(&descriptor.name) {
                Some(value) => present.push((descriptor, value)),
                None => {
                    sink.report(Diagnostic::missing_key(at.child(&descriptor.name)));
                    return Ok(false);
                }
            }
        }

        for &(descriptor, value) in &present {
            if !descriptor.expected_type.matches(value) {
                sink.report(Diagnostic::wrong_type(
                    at.child(&descriptor.name),
                    descriptor.expected_type,
                    value,
                ));
                return Ok(false);
            }
        }

        for (descriptor, value) in present {
            let path = at.child(&descriptor.name);
            tracing::trace!(path = %path, "refining required key");

            if !descriptor.permits(value) {
                let allowed = descriptor.possible_values.as_deref().unwrap_or_default();
                sink.report(Diagnostic::value_not_permitted(path, allowed, value));
                return Ok(false);
            }

            if descriptor.expected_type != ValueKind::Mapping {
                continue;
            }
            let (Some(nested), Some(nesting)) = (value.as_object(), &descriptor.nesting) else {
                continue;
            };

            match nesting {
                Nesting::Fixed(schema) => {
                    tracing::debug!(path = %path, "descending into nested schema");
                    if !self.orchestrate(nested, &schema.required, schema.optional_keys(), &path, sink)? {
                        return Ok(false);
                    }
                }
                Nesting::Conditional(conditional) => {
                    let branch = select_branch(data, conditional, &path)?;
                    let verdict =
                        self.orchestrate(nested, &branch.required, branch.optional_keys(), &path, sink)?;
                    match self.options.nested_siblings {
                        SiblingPolicy::ShortCircuit => return Ok(verdict),
                        SiblingPolicy::Continue if !verdict => return Ok(false),
                        SiblingPolicy::Continue => {}
                    }
                }
            }
        }

        Ok(true)
    }

    fn optional_keys(
        &self,
        data: &Map<String, Value>,
        optional: &[KeyDescriptor],
        at: &KeyPath,
        sink: &mut dyn DiagnosticSink,
    ) -> bool {
        for descriptor in optional {
            let Some(value) = data.get(&descriptor.name) else {
                continue;
            };
            let path = at.child(&descriptor.name);

            if !descriptor.expected_type.matches(value) {
                sink.report(Diagnostic::wrong_optional_type(path, descriptor.expected_type, value));
                return false;
            }

            if descriptor.expected_type != ValueKind::Mapping {
                continue;
            }
            let (Some(nested), Some(nested_optional)) = (
                value.as_object(),
                descriptor.fixed().and_then(Schema::optional_keys),
            ) else {
                continue;
            };

            tracing::debug!(path = %path, "descending into nested optional keys");
            let verdict = self.optional_keys(nested, nested_optional, &path, sink);
            match self.options.nested_siblings {
                SiblingPolicy::ShortCircuit => return verdict,
                SiblingPolicy::Continue if !verdict => return false,
                SiblingPolicy::Continue => {}
            }
        }

        true
    }
}

/// Pick the branch of `conditional` selected by its dependency's value in
/// the enclosing mapping `data`.
fn select_branch<'c>(
    data: &Map<String, Value>,
    conditional: &'c Conditional,
    at: &KeyPath,
) -> Result<&'c Schema, SchemaFault> {
    let dependency =
        data.get(&conditional.depends_on)
            .ok_or_else(|| SchemaFault::MissingDependency {
                path: at.clone(),
                depends_on: conditional.depends_on.clone(),
            })?;

    let branch = conditional
        .branch_for(dependency)
        .ok_or_else(|| SchemaFault::UnmatchedBranch {
            path: at.clone(),
            depends_on: conditional.depends_on.clone(),
            value: dependency.to_string(),
        })?;

    tracing::debug!(
        path = %at,
        depends_on = %conditional.depends_on,
        value = %dependency,
        "selected conditional branch"
    );
    Ok(branch)
}

/// Orchestration with default options. See [`Validator::validate`].
pub fn validate(
    data: &Map<String, Value>,
    required: &[KeyDescriptor],
    optional: Option<&[KeyDescriptor]>,
    sink: &mut dyn DiagnosticSink,
) -> Result<bool, SchemaFault> {
    Validator::default().validate(data, required, optional, sink)
}

/// Required-key validation with default options. See
/// [`Validator::validate_expected`].
pub fn validate_expected(
    data: &Map<String, Value>,
    required: &[KeyDescriptor],
    sink: &mut dyn DiagnosticSink,
) -> Result<bool, SchemaFault> {
    Validator::default().validate_expected(data, required, sink)
}

/// Optional-key validation with default options. See
/// [`Validator::validate_optional`].
pub fn validate_optional(
    data: &Map<String, Value>,
    optional: &[KeyDescriptor],
    sink: &mut dyn DiagnosticSink,
) -> bool {
    Validator::default().validate_optional(data, optional, sink)
}

impl Schema {
    /// Validate a document against this schema with default options.
    pub fn validate(&self, document: &Value, sink: &mut dyn DiagnosticSink) -> Result<bool, SchemaFault> {
        Validator::default().validate_document(self, document, sink)
    }

    /// Validate a document and collect diagnostics, with default options.
    pub fn verdict(&self, document: &Value) -> Result<Verdict, SchemaFault> {
        Validator::default().verdict(self, document)
    }
}
