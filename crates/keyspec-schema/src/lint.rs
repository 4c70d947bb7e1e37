//! # Schema Lint
//!
//! The engine trusts its schema. This module finds the schema mistakes the
//! engine would otherwise surface only at validation time, as a
//! [`SchemaFault`](keyspec_core::SchemaFault) or as silently skipped checks.
//!
//! Errors make a schema unusable and are rejected by
//! [`load_schema`](crate::load_schema). Warnings describe constraints that
//! exist in the schema but will not be enforced, or that depend on the data
//! being well formed in ways the schema does not require.

use std::collections::HashSet;
use std::fmt;

use keyspec_core::KeyPath;
use serde::Serialize;

use crate::descriptor::{Conditional, KeyDescriptor, Nesting, Schema};
use crate::engine::SiblingPolicy;

/// How serious a lint finding is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Worth knowing; the schema still works.
    Warning,
    /// The schema is broken.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "WARN"),
            Severity::Error => write!(f, "ERROR"),
        }
    }
}

/// Category of a lint finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// The same key name is declared twice at one level.
    DuplicateKey,
    /// A conditional depends on a key that is not one of its siblings.
    DanglingDependency,
    /// A permitted value of the dependency key has no branch.
    UncoveredBranch,
    /// A conditional depends on an optional key, which may be absent.
    OptionalDependency,
    /// Descriptors that will not be refined because an earlier sibling's
    /// recursion decides the verdict.
    ShadowedSiblings,
    /// A constraint on an optional key that optional-key validation does not
    /// enforce.
    IgnoredConstraint,
}

impl IssueKind {
    /// Severity of this kind of finding.
    pub fn severity(self) -> Severity {
        match self {
            Self::DuplicateKey | Self::DanglingDependency | Self::UncoveredBranch => Severity::Error,
            Self::OptionalDependency | Self::ShadowedSiblings | Self::IgnoredConstraint => {
                Severity::Warning
            }
        }
    }
}

/// One lint finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaIssue {
    /// Finding category.
    pub kind: IssueKind,
    /// Data path of the level or key the finding concerns.
    pub path: KeyPath,
    /// Human-readable description.
    pub message: String,
}

impl SchemaIssue {
    /// Severity of this finding.
    pub fn severity(&self) -> Severity {
        self.kind.severity()
    }

    /// Returns true for error-severity findings.
    pub fn is_error(&self) -> bool {
        self.severity() == Severity::Error
    }
}

impl fmt::Display for SchemaIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity(), self.path, self.message)
    }
}

/// Lint a schema, recursing into fixed nestings and every branch.
///
/// `policy` is the sibling policy the schema will be validated under; it
/// only affects [`IssueKind::ShadowedSiblings`].
pub fn lint(schema: &Schema, policy: SiblingPolicy) -> Vec<SchemaIssue> {
    let mut issues = Vec::new();
    lint_level(schema, &KeyPath::root(), policy, &mut issues);
    issues
}

fn lint_level(schema: &Schema, at: &KeyPath, policy: SiblingPolicy, issues: &mut Vec<SchemaIssue>) {
    let mut seen = HashSet::new();
    for descriptor in schema.descriptors() {
        if !seen.insert(descriptor.name.as_str()) {
            issues.push(SchemaIssue {
                kind: IssueKind::DuplicateKey,
                path: at.clone(),
                message: format!("key '{}' is declared more than once", descriptor.name),
            });
        }
    }

    for (index, descriptor) in schema.required.iter().enumerate() {
        let path = at.child(&descriptor.name);
        match &descriptor.nesting {
            Some(Nesting::Fixed(nested)) => lint_level(nested, &path, policy, issues),
            Some(Nesting::Conditional(conditional)) => {
                lint_conditional(schema, descriptor, conditional, &path, issues);
                for branch in conditional.branches.values() {
                    lint_level(branch, &path, policy, issues);
                }
                if policy == SiblingPolicy::ShortCircuit {
                    let shadowed = refined_names(&schema.required[index + 1..]);
                    if !shadowed.is_empty() {
                        issues.push(SchemaIssue {
                            kind: IssueKind::ShadowedSiblings,
                            path: path.clone(),
                            message: format!(
                                "the branch verdict of '{}' ends required-key validation; value sets and nested keys of {} are not enforced",
                                descriptor.name,
                                shadowed.join(", ")
                            ),
                        });
                    }
                }
            }
            None => {}
        }
    }

    for (index, descriptor) in schema.optional_keys().unwrap_or_default().iter().enumerate() {
        let path = at.child(&descriptor.name);
        lint_optional(descriptor, &path, issues);

        let Some(nested_optional) = descriptor.fixed().and_then(Schema::optional_keys) else {
            continue;
        };
        lint_level(&Schema::default().with_optional(nested_optional.to_vec()), &path, policy, issues);

        let rest = &schema.optional_keys().unwrap_or_default()[index + 1..];
        if policy == SiblingPolicy::ShortCircuit && !rest.is_empty() {
            let names: Vec<String> = rest.iter().map(|d| format!("'{}'", d.name)).collect();
            issues.push(SchemaIssue {
                kind: IssueKind::ShadowedSiblings,
                path,
                message: format!(
                    "when present, '{}' ends optional-key validation; {} may go unchecked",
                    descriptor.name,
                    names.join(", ")
                ),
            });
        }
    }
}

fn lint_conditional(
    level: &Schema,
    descriptor: &KeyDescriptor,
    conditional: &Conditional,
    path: &KeyPath,
    issues: &mut Vec<SchemaIssue>,
) {
    let dependency = (conditional.depends_on != descriptor.name)
        .then(|| level.descriptor(&conditional.depends_on))
        .flatten();

    let Some(dependency) = dependency else {
        issues.push(SchemaIssue {
            kind: IssueKind::DanglingDependency,
            path: path.clone(),
            message: format!(
                "depends on '{}', which is not a sibling key",
                conditional.depends_on
            ),
        });
        return;
    };

    if !level.required.iter().any(|d| d.name == dependency.name) {
        issues.push(SchemaIssue {
            kind: IssueKind::OptionalDependency,
            path: path.clone(),
            message: format!(
                "depends on optional key '{}'; documents without it cannot be classified",
                dependency.name
            ),
        });
    }

    for value in dependency.possible_values.iter().flatten() {
        if conditional.branch_for(value).is_none() {
            issues.push(SchemaIssue {
                kind: IssueKind::UncoveredBranch,
                path: path.clone(),
                message: format!(
                    "no branch for {} = {value}",
                    conditional.depends_on
                ),
            });
        }
    }
}

fn lint_optional(descriptor: &KeyDescriptor, path: &KeyPath, issues: &mut Vec<SchemaIssue>) {
    let mut ignored = Vec::new();
    if descriptor.possible_values.is_some() {
        ignored.push("possible_values");
    }
    match &descriptor.nesting {
        Some(Nesting::Fixed(nested)) if !nested.required.is_empty() => ignored.push("nested_required"),
        Some(Nesting::Conditional(_)) => ignored.push("conditional"),
        _ => {}
    }
    if !ignored.is_empty() {
        issues.push(SchemaIssue {
            kind: IssueKind::IgnoredConstraint,
            path: path.clone(),
            message: format!(
                "optional key '{}' declares {}, which optional-key validation does not enforce",
                descriptor.name,
                ignored.join(" and ")
            ),
        });
    }
}

fn refined_names(descriptors: &[KeyDescriptor]) -> Vec<String> {
    descriptors
        .iter()
        .filter(|d| d.is_refined())
        .map(|d| format!("'{}'", d.name))
        .collect()
}
