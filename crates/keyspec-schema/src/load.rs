//! # Loading Schemas and Documents
//!
//! Reads schema and data files from disk. The format is chosen by file
//! extension: `.yaml`/`.yml` are YAML, anything else is JSON. YAML input is
//! converted to a `serde_json::Value` tree first, so schemas and documents
//! take the same path regardless of format.
//!
//! Loaded schemas are linted; schemas with error-severity findings are
//! rejected with [`SchemaError::Malformed`].

use std::path::Path;

use serde_json::Value;
use thiserror::Error;

use crate::descriptor::Schema;
use crate::engine::SiblingPolicy;
use crate::lint::{lint, SchemaIssue};

/// Error loading a schema or document.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// The file could not be read.
    #[error("cannot read '{path}': {source}")]
    Io {
        /// Path of the file.
        path: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid JSON/YAML, or does not describe a schema.
    #[error("cannot parse '{path}': {reason}")]
    Parse {
        /// Path of the file.
        path: String,
        /// Parser message.
        reason: String,
    },

    /// The schema parsed but has lint errors.
    #[error("malformed schema '{path}':\n{}", render_issues(.issues))]
    Malformed {
        /// Path of the schema file.
        path: String,
        /// Error-severity lint findings.
        issues: Vec<SchemaIssue>,
    },
}

fn render_issues(issues: &[SchemaIssue]) -> String {
    issues
        .iter()
        .map(|issue| format!("  {issue}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Serialization format of a file on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// JSON.
    Json,
    /// YAML.
    Yaml,
}

impl FileFormat {
    /// Infer the format from a path's extension.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => Self::Yaml,
            _ => Self::Json,
        }
    }
}

/// Parse text in the given format into a JSON value tree.
pub fn parse_value(content: &str, format: FileFormat) -> Result<Value, String> {
    match format {
        FileFormat::Json => serde_json::from_str(content).map_err(|e| format!("invalid JSON: {e}")),
        FileFormat::Yaml => {
            let yaml: serde_yaml::Value =
                serde_yaml::from_str(content).map_err(|e| format!("invalid YAML: {e}"))?;
            yaml_to_json_value(&yaml).map_err(|e| format!("YAML-to-JSON conversion failed: {e}"))
        }
    }
}

/// Read a JSON or YAML file into a value tree.
pub fn read_value(path: &Path) -> Result<Value, SchemaError> {
    let content = std::fs::read_to_string(path).map_err(|source| SchemaError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_value(&content, FileFormat::from_path(path)).map_err(|reason| SchemaError::Parse {
        path: path.display().to_string(),
        reason,
    })
}

/// Load a data document.
pub fn load_document(path: &Path) -> Result<Value, SchemaError> {
    read_value(path)
}

/// Build a schema from an already-parsed value and reject it if linting
/// finds errors. `policy` is the sibling policy the schema will be validated
/// under; it decides which warnings apply.
pub fn schema_from_value(value: Value, origin: &str, policy: SiblingPolicy) -> Result<Schema, SchemaError> {
    let schema: Schema = serde_json::from_value(value).map_err(|e| SchemaError::Parse {
        path: origin.to_string(),
        reason: e.to_string(),
    })?;

    let (errors, warnings) = split_issues(&schema, policy);
    for warning in &warnings {
        tracing::warn!(origin, path = %warning.path, "{}", warning.message);
    }
    if !errors.is_empty() {
        return Err(SchemaError::Malformed {
            path: origin.to_string(),
            issues: errors,
        });
    }

    tracing::debug!(
        origin,
        required = schema.required.len(),
        optional = schema.optional_keys().map_or(0, <[_]>::len),
        "loaded schema"
    );
    Ok(schema)
}

/// Load and check a schema file for validation under `policy`.
pub fn load_schema(path: &Path, policy: SiblingPolicy) -> Result<Schema, SchemaError> {
    let value = read_value(path)?;
    schema_from_value(value, &path.display().to_string(), policy)
}

/// Lint findings split into errors and warnings.
fn split_issues(schema: &Schema, policy: SiblingPolicy) -> (Vec<SchemaIssue>, Vec<SchemaIssue>) {
    lint(schema, policy).into_iter().partition(SchemaIssue::is_error)
}

/// Convert a `serde_yaml::Value` to a `serde_json::Value`.
///
/// Mapping keys must be strings, numbers or booleans; numbers and booleans
/// become their textual form. YAML tags are dropped.
fn yaml_to_json_value(yaml: &serde_yaml::Value) -> Result<Value, String> {
    match yaml {
        serde_yaml::Value::Null => Ok(Value::Null),
        serde_yaml::Value::Bool(b) => Ok(Value::Bool(*b)),
        serde_yaml::Value::Number(n) => yaml_number(n),
        serde_yaml::Value::String(s) => Ok(Value::String(s.clone())),
        serde_yaml::Value::Sequence(seq) => seq
            .iter()
            .map(yaml_to_json_value)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        serde_yaml::Value::Mapping(map) => {
            let mut object = serde_json::Map::new();
            for (k, v) in map {
                object.insert(yaml_key(k)?, yaml_to_json_value(v)?);
            }
            Ok(Value::Object(object))
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_json_value(&tagged.value),
    }
}

fn yaml_number(n: &serde_yaml::Number) -> Result<Value, String> {
    if let Some(i) = n.as_i64() {
        Ok(Value::from(i))
    } else if let Some(u) = n.as_u64() {
        Ok(Value::from(u))
    } else if let Some(f) = n.as_f64() {
        serde_json::Number::from_f64(f)
            .map(Value::Number)
            .ok_or_else(|| format!("cannot represent float {f} in JSON"))
    } else {
        Err(format!("unsupported YAML number: {n:?}"))
    }
}

fn yaml_key(key: &serde_yaml::Value) -> Result<String, String> {
    match key {
        serde_yaml::Value::String(s) => Ok(s.clone()),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        other => Err(format!("unsupported YAML map key type: {other:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lint::IssueKind;
    use keyspec_core::ValueKind;
    use serde_json::json;

    fn write(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn format_follows_extension() {
        assert_eq!(FileFormat::from_path(Path::new("a.yaml")), FileFormat::Yaml);
        assert_eq!(FileFormat::from_path(Path::new("a.yml")), FileFormat::Yaml);
        assert_eq!(FileFormat::from_path(Path::new("a.json")), FileFormat::Json);
        assert_eq!(FileFormat::from_path(Path::new("noext")), FileFormat::Json);
    }

    #[test]
    fn loads_yaml_schema() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "schema.yaml",
            r#"
required:
  - name: mode
    type: string
    possible_values: [a, b]
optional:
  - name: port
    type: int
"#,
        );
        let schema = load_schema(&path, SiblingPolicy::default()).unwrap();
        assert_eq!(schema.required[0].name, "mode");
        assert_eq!(schema.optional_keys().unwrap()[0].expected_type, ValueKind::Integer);
    }

    #[test]
    fn loads_json_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "doc.json", r#"{"mode": "a", "port": 80}"#);
        assert_eq!(load_document(&path).unwrap(), json!({"mode": "a", "port": 80}));
    }

    #[test]
    fn yaml_document_numbers_keep_their_kind() {
        let value = parse_value("port: 80\nratio: 0.5\nflag: true\n", FileFormat::Yaml).unwrap();
        assert_eq!(ValueKind::of(&value["port"]), ValueKind::Integer);
        assert_eq!(ValueKind::of(&value["ratio"]), ValueKind::Float);
        assert_eq!(ValueKind::of(&value["flag"]), ValueKind::Boolean);
    }

    #[test]
    fn yaml_numeric_keys_become_strings() {
        let value = parse_value("1: one\ntrue: yes\n", FileFormat::Yaml).unwrap();
        assert_eq!(value["1"], "one");
        assert_eq!(value["true"], "yes");
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_document(Path::new("/nonexistent/keyspec/doc.json")).unwrap_err();
        assert!(matches!(err, SchemaError::Io { .. }), "got: {err}");
    }

    #[test]
    fn invalid_json_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "doc.json", "{not json");
        let err = load_document(&path).unwrap_err();
        assert!(matches!(err, SchemaError::Parse { .. }), "got: {err}");
        assert!(err.to_string().contains("invalid JSON"));
    }

    #[test]
    fn descriptor_errors_surface_as_parse_errors() {
        let err = schema_from_value(
            json!({"required": [{"name": "p", "type": "int", "nested_required": []}]}),
            "inline",
            SiblingPolicy::default(),
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::Parse { .. }), "got: {err}");
    }

    #[test]
    fn lint_errors_reject_the_schema() {
        let err = schema_from_value(
            json!({"required": [
                {"name": "a", "type": "string"},
                {"name": "a", "type": "string"}
            ]}),
            "inline",
            SiblingPolicy::default(),
        )
        .unwrap_err();
        match err {
            SchemaError::Malformed { issues, .. } => {
                assert_eq!(issues.len(), 1);
                assert_eq!(issues[0].kind, IssueKind::DuplicateKey);
            }
            other => panic!("expected Malformed, got {other}"),
        }
    }

    #[test]
    fn lint_warnings_do_not_reject_the_schema() {
        let schema = schema_from_value(
            json!({
                "required": [{"name": "info", "type": "mapping",
                              "conditional": {"depends_on": "kind", "branches": {}}}],
                "optional": [{"name": "kind", "type": "string"}]
            }),
            "inline",
            SiblingPolicy::default(),
        );
        assert!(schema.is_ok());
    }

    #[test]
    fn warnings_follow_the_validation_policy() {
        let schema: Schema = serde_json::from_value(json!({"required": [
            {"name": "kind", "type": "string"},
            {"name": "info", "type": "mapping",
             "conditional": {"depends_on": "kind", "branches": {"a": {}}}},
            {"name": "level", "type": "int", "possible_values": [1, 2]}
        ]}))
        .unwrap();

        let (errors, warnings) = split_issues(&schema, SiblingPolicy::ShortCircuit);
        assert!(errors.is_empty());
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].kind, IssueKind::ShadowedSiblings);

        let (errors, warnings) = split_issues(&schema, SiblingPolicy::Continue);
        assert!(errors.is_empty());
        assert!(warnings.is_empty());
    }

    #[test]
    fn malformed_message_lists_issues() {
        let err = SchemaError::Malformed {
            path: "s.yaml".into(),
            issues: vec![SchemaIssue {
                kind: IssueKind::DanglingDependency,
                path: keyspec_core::KeyPath::root().child("info"),
                message: "depends on 'kind', which is not a sibling key".into(),
            }],
        };
        let display = err.to_string();
        assert!(display.starts_with("malformed schema 's.yaml':\n  [ERROR] info:"));
    }
}
