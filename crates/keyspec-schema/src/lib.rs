//! # keyspec-schema: Schema Model and Validation Engine
//!
//! Validates nested configuration mappings against declarative schemas.
//!
//! - [`descriptor`]: the schema model ([`Schema`], [`KeyDescriptor`],
//!   [`Nesting`], [`Conditional`]) and its serialized form.
//! - [`engine`]: the recursive validator ([`validate`],
//!   [`validate_expected`], [`validate_optional`]) and its options.
//! - [`lint`]: static checks that catch schema mistakes before any data
//!   is validated.
//! - [`load`]: reading schemas and documents from JSON or YAML files.
//!
//! ## Example
//!
//! ```
//! use keyspec_core::{Diagnostic, ValueKind};
//! use keyspec_schema::{KeyDescriptor, Schema};
//! use serde_json::json;
//!
//! let schema = Schema::new(vec![KeyDescriptor::new("mode", ValueKind::String)
//!     .with_values([json!("fast"), json!("safe")])]);
//!
//! let mut diagnostics: Vec<Diagnostic> = Vec::new();
//! assert!(schema.validate(&json!({"mode": "fast"}), &mut diagnostics).unwrap());
//! assert!(!schema.validate(&json!({"mode": "slow"}), &mut diagnostics).unwrap());
//! assert_eq!(diagnostics.len(), 1);
//! ```

pub mod descriptor;
pub mod engine;
pub mod lint;
pub mod load;

pub use descriptor::{Conditional, DescriptorError, KeyDescriptor, Nesting, Schema};
pub use engine::{validate, validate_expected, validate_optional, SiblingPolicy, Validator, ValidatorOptions};
pub use lint::{lint, IssueKind, SchemaIssue, Severity};
pub use load::{load_document, load_schema, parse_value, read_value, schema_from_value, FileFormat, SchemaError};
