//! # Validate Subcommand
//!
//! Validates one or more data documents against a single schema and prints
//! one line per document followed by a summary.
//!
//! ```text
//! OK: config/local.yaml
//! FAIL: config/azure.yaml: missing required key at source_info.container_name
//! Documents: 1/2 passed
//! ```
//!
//! With `--format json`, one JSON object per document is printed instead
//! and the summary is omitted.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use serde::Serialize;

use keyspec_core::Diagnostic;
use keyspec_schema::{load_document, load_schema, Schema, SchemaError, Validator, ValidatorOptions};

use crate::{EXIT_ERROR, EXIT_INVALID, EXIT_OK};

/// Arguments for the `keyspec validate` subcommand.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Schema file (JSON or YAML).
    #[arg(long, short = 's', value_name = "SCHEMA")]
    pub schema: PathBuf,

    /// Data documents to validate (JSON or YAML).
    #[arg(value_name = "DATA", required = true)]
    pub paths: Vec<PathBuf>,

    /// Keep checking sibling keys after a nested or conditional sub-schema
    /// passes.
    #[arg(long)]
    pub continue_siblings: bool,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// How per-document results are printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// `OK:`/`FAIL:` lines and a summary.
    #[default]
    Text,
    /// One JSON object per document.
    Json,
}

/// Outcome of validating one document.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentReport {
    /// Document path as given on the command line.
    pub path: String,
    /// Whether the document conforms.
    pub valid: bool,
    /// Diagnostics reported while validating.
    pub diagnostics: Vec<Diagnostic>,
    /// Operational error or schema fault, if validation could not finish.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DocumentReport {
    /// Exit code contribution of this document.
    pub fn exit_code(&self) -> u8 {
        match (&self.error, self.valid) {
            (Some(_), _) => EXIT_ERROR,
            (None, true) => EXIT_OK,
            (None, false) => EXIT_INVALID,
        }
    }

    /// The `OK:`/`FAIL:`/`ERROR:` line printed in text mode.
    pub fn text_line(&self) -> String {
        if let Some(error) = &self.error {
            return format!("ERROR: {}: {error}", self.path);
        }
        match (self.valid, self.diagnostics.first()) {
            (true, _) => format!("OK: {}", self.path),
            (false, Some(reason)) => format!("FAIL: {}: {reason}", self.path),
            (false, None) => format!("FAIL: {}", self.path),
        }
    }
}

/// Execute the validate subcommand.
///
/// Returns exit code: 0 if every document is valid, 1 if any document is
/// invalid or the schema has lint errors, 2 on operational error.
pub fn run_validate(args: &ValidateArgs, options: ValidatorOptions) -> Result<u8> {
    let schema = match load_schema(&args.schema, options.nested_siblings) {
        Ok(schema) => schema,
        Err(SchemaError::Malformed { path, issues }) => {
            println!("FAIL: schema {path} has {} error(s)", issues.len());
            for issue in &issues {
                println!("  {issue}");
            }
            return Ok(EXIT_INVALID);
        }
        Err(e) => {
            return Err(e)
                .with_context(|| format!("failed to load schema: {}", args.schema.display()));
        }
    };

    tracing::info!(
        schema = %args.schema.display(),
        documents = args.paths.len(),
        nested_siblings = ?options.nested_siblings,
        "validating documents"
    );

    let validator = Validator::new(options);
    let reports: Vec<DocumentReport> = args
        .paths
        .iter()
        .map(|path| validate_path(&validator, &schema, path))
        .collect();

    match args.format {
        OutputFormat::Text => {
            for report in &reports {
                println!("{}", report.text_line());
            }
            let passed = reports.iter().filter(|r| r.valid).count();
            println!("Documents: {passed}/{} passed", reports.len());
        }
        OutputFormat::Json => {
            for report in &reports {
                println!(
                    "{}",
                    serde_json::to_string(report).context("failed to serialize report")?
                );
            }
        }
    }

    Ok(reports
        .iter()
        .map(DocumentReport::exit_code)
        .max()
        .unwrap_or(EXIT_OK))
}

/// Load and validate one document. Never fails: load errors and schema
/// faults are recorded in the report.
pub fn validate_path(validator: &Validator, schema: &Schema, path: &Path) -> DocumentReport {
    let shown = path.display().to_string();

    let document = match load_document(path) {
        Ok(document) => document,
        Err(e) => {
            tracing::error!(path = %shown, "{e}");
            return DocumentReport {
                path: shown,
                valid: false,
                diagnostics: Vec::new(),
                error: Some(e.to_string()),
            };
        }
    };

    let mut diagnostics: Vec<Diagnostic> = Vec::new();
    match validator.validate_document(schema, &document, &mut diagnostics) {
        Ok(valid) => {
            tracing::debug!(path = %shown, valid, "validated document");
            DocumentReport {
                path: shown,
                valid,
                diagnostics,
                error: None,
            }
        }
        Err(fault) => {
            tracing::error!(path = %shown, "schema fault: {fault}");
            DocumentReport {
                path: shown,
                valid: false,
                diagnostics,
                error: Some(format!("schema fault: {fault}")),
            }
        }
    }
}
