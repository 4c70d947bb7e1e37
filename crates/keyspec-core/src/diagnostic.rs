//! # Diagnostics: Why a Document Was Rejected
//!
//! Every rejection made by the validation engine is reported as exactly one
//! [`Diagnostic`] through an injected [`DiagnosticSink`]. The engine holds
//! no global logging state: callers choose whether diagnostics are
//! collected (`Vec<Diagnostic>`), logged ([`TracingSink`]), or both.
//!
//! A successful validation reports nothing.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::kind::ValueKind;
use crate::path::KeyPath;

/// Category of a data fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// The mapping holds a key that the schema does not declare.
    UnknownKey,
    /// A required key is absent.
    MissingKey,
    /// A required key holds a value of the wrong kind.
    WrongType,
    /// A present optional key holds a value of the wrong kind.
    WrongOptionalType,
    /// The value is not one of the permitted values.
    ValueNotPermitted,
}

impl DiagnosticKind {
    /// Short human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Self::UnknownKey => "unknown key",
            Self::MissingKey => "missing required key",
            Self::WrongType => "wrong type",
            Self::WrongOptionalType => "wrong optional type",
            Self::ValueNotPermitted => "value not permitted",
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One structured validation failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Failure category.
    pub kind: DiagnosticKind,
    /// Path of the offending key from the validated root.
    pub path: KeyPath,
    /// What the schema expected, when meaningful.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    /// What the data held, when meaningful.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual: Option<String>,
}

impl Diagnostic {
    /// A key not declared by the schema.
    pub fn unknown_key(path: KeyPath) -> Self {
        Self {
            kind: DiagnosticKind::UnknownKey,
            path,
            expected: Some("a declared key".into()),
            actual: None,
        }
    }

    /// A required key that is absent.
    pub fn missing_key(path: KeyPath) -> Self {
        Self {
            kind: DiagnosticKind::MissingKey,
            path,
            expected: Some("key to be present".into()),
            actual: Some("missing".into()),
        }
    }

    /// A required key holding the wrong kind of value.
    pub fn wrong_type(path: KeyPath, expected: ValueKind, actual: &Value) -> Self {
        Self {
            kind: DiagnosticKind::WrongType,
            path,
            expected: Some(expected.to_string()),
            actual: Some(ValueKind::of(actual).to_string()),
        }
    }

    /// A present optional key holding the wrong kind of value.
    pub fn wrong_optional_type(path: KeyPath, expected: ValueKind, actual: &Value) -> Self {
        Self {
            kind: DiagnosticKind::WrongOptionalType,
            ..Self::wrong_type(path, expected, actual)
        }
    }

    /// A value outside the permitted set.
    pub fn value_not_permitted(path: KeyPath, permitted: &[Value], actual: &Value) -> Self {
        let permitted = permitted
            .iter()
            .map(Value::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        Self {
            kind: DiagnosticKind::ValueNotPermitted,
            path,
            expected: Some(format!("one of [{permitted}]")),
            actual: Some(actual.to_string()),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.kind, self.path)?;
        match (&self.expected, &self.actual) {
            (Some(expected), Some(actual)) => write!(f, ": expected {expected}, got {actual}"),
            (Some(expected), None) => write!(f, ": expected {expected}"),
            (None, Some(actual)) => write!(f, ": got {actual}"),
            (None, None) => Ok(()),
        }
    }
}

/// Receives diagnostics from the validation engine.
///
/// Implementations must not assume any ordering beyond "one diagnostic per
/// rejection". The engine never reads back from the sink.
pub trait DiagnosticSink {
    /// Record one diagnostic.
    fn report(&mut self, diagnostic: Diagnostic);
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for &mut S {
    fn report(&mut self, diagnostic: Diagnostic) {
        (**self).report(diagnostic);
    }
}

/// Sink that emits every diagnostic as a `tracing` warning event.
///
/// Output format and destination are decided by whichever subscriber the
/// host process installed.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&mut self, diagnostic: Diagnostic) {
        tracing::warn!(
            kind = %diagnostic.kind,
            path = %diagnostic.path,
            expected = diagnostic.expected.as_deref().unwrap_or(""),
            actual = diagnostic.actual.as_deref().unwrap_or(""),
            "document rejected"
        );
    }
}

/// Sink that both collects and logs.
#[derive(Debug, Default)]
pub struct RecordingSink {
    diagnostics: Vec<Diagnostic>,
}

impl RecordingSink {
    /// Create an empty recording sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Diagnostics recorded so far.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Consumes self and returns the recorded diagnostics.
    pub fn into_inner(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

impl DiagnosticSink for RecordingSink {
    fn report(&mut self, diagnostic: Diagnostic) {
        TracingSink.report(diagnostic.clone());
        self.diagnostics.push(diagnostic);
    }
}

/// Outcome of validating one document: the verdict plus its diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    /// True if the document is valid.
    pub valid: bool,
    /// Diagnostics reported while validating. Empty when `valid`.
    pub diagnostics: Vec<Diagnostic>,
}

impl Verdict {
    /// Build a verdict from a boolean result and collected diagnostics.
    pub fn new(valid: bool, diagnostics: Vec<Diagnostic>) -> Self {
        Self { valid, diagnostics }
    }

    /// First diagnostic, i.e. the reason for rejection.
    pub fn reason(&self) -> Option<&Diagnostic> {
        self.diagnostics.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(s: &str) -> KeyPath {
        s.split('.').collect()
    }

    #[test]
    fn wrong_type_names_both_kinds() {
        let d = Diagnostic::wrong_type(path("cfg.port"), ValueKind::Integer, &json!("80"));
        let display = d.to_string();
        assert!(display.contains("wrong type"));
        assert!(display.contains("cfg.port"));
        assert!(display.contains("integer"));
        assert!(display.contains("string"));
    }

    #[test]
    fn wrong_optional_type_keeps_kinds_but_changes_category() {
        let d = Diagnostic::wrong_optional_type(path("dir"), ValueKind::String, &json!(3));
        assert_eq!(d.kind, DiagnosticKind::WrongOptionalType);
        assert_eq!(d.expected.as_deref(), Some("string"));
        assert_eq!(d.actual.as_deref(), Some("integer"));
    }

    #[test]
    fn value_not_permitted_lists_allowed_values() {
        let d = Diagnostic::value_not_permitted(path("mode"), &[json!("a"), json!("b")], &json!("c"));
        assert_eq!(d.expected.as_deref(), Some(r#"one of ["a", "b"]"#));
        assert_eq!(d.actual.as_deref(), Some(r#""c""#));
    }

    #[test]
    fn unknown_key_at_root_level_path() {
        let d = Diagnostic::unknown_key(KeyPath::root().child("extra"));
        assert_eq!(d.to_string(), "unknown key at extra: expected a declared key");
    }

    #[test]
    fn vec_and_dyn_sinks_collect() {
        let mut collected: Vec<Diagnostic> = Vec::new();
        {
            let sink: &mut dyn DiagnosticSink = &mut collected;
            sink.report(Diagnostic::missing_key(path("a")));
        }
        collected.report(Diagnostic::missing_key(path("b")));
        assert_eq!(collected.len(), 2);
    }

    #[test]
    fn recording_sink_keeps_diagnostics() {
        let mut sink = RecordingSink::new();
        sink.report(Diagnostic::missing_key(path("name")));
        assert_eq!(sink.diagnostics().len(), 1);
        assert_eq!(sink.into_inner()[0].kind, DiagnosticKind::MissingKey);
    }

    #[test]
    fn diagnostic_serializes_kind_in_snake_case() {
        let d = Diagnostic::missing_key(path("store_info.host"));
        let value = serde_json::to_value(&d).unwrap();
        assert_eq!(value["kind"], "missing_key");
        assert_eq!(value["path"], json!(["store_info", "host"]));
    }

    #[test]
    fn verdict_reason_is_first_diagnostic() {
        let v = Verdict::new(false, vec![Diagnostic::missing_key(path("x"))]);
        assert_eq!(v.reason().map(|d| d.kind), Some(DiagnosticKind::MissingKey));
        assert!(Verdict::new(true, Vec::new()).reason().is_none());
    }
}
