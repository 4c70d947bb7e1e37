//! # Check-Schema Subcommand
//!
//! Loads a schema file and prints every lint finding, errors and warnings
//! alike. Unlike `validate`, which refuses a schema with lint errors, this
//! command reports all of them.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use keyspec_schema::{lint, read_value, Schema, SchemaIssue, ValidatorOptions};

use crate::{EXIT_INVALID, EXIT_OK};

/// Arguments for the `keyspec check-schema` subcommand.
#[derive(Args, Debug)]
pub struct CheckSchemaArgs {
    /// Schema file (JSON or YAML).
    #[arg(value_name = "SCHEMA")]
    pub schema: PathBuf,

    /// Lint for the continue-siblings policy instead of the configured one.
    #[arg(long)]
    pub continue_siblings: bool,
}

/// Execute the check-schema subcommand.
///
/// Returns exit code: 0 if the schema has no lint errors (warnings allowed),
/// 1 if it has any.
pub fn run_check_schema(args: &CheckSchemaArgs, options: ValidatorOptions) -> Result<u8> {
    let issues = check_schema(args, options)?;
    let errors = issues.iter().filter(|i| i.is_error()).count();

    for issue in &issues {
        println!("{issue}");
    }

    if errors > 0 {
        println!(
            "FAIL: {}: {errors} error(s), {} warning(s)",
            args.schema.display(),
            issues.len() - errors
        );
        Ok(EXIT_INVALID)
    } else {
        println!("OK: {}: {} warning(s)", args.schema.display(), issues.len());
        Ok(EXIT_OK)
    }
}

/// Parse the schema and lint it under the configured sibling policy.
pub fn check_schema(args: &CheckSchemaArgs, options: ValidatorOptions) -> Result<Vec<SchemaIssue>> {
    let value = read_value(&args.schema)
        .with_context(|| format!("failed to read schema: {}", args.schema.display()))?;
    let schema: Schema = serde_json::from_value(value)
        .with_context(|| format!("failed to parse schema: {}", args.schema.display()))?;

    let policy = options.nested_siblings;
    tracing::info!(schema = %args.schema.display(), ?policy, "linting schema");

    Ok(lint(&schema, policy))
}
