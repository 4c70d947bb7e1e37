//! # keyspec-cli: Command-Line Front End
//!
//! Provides the `keyspec` binary.
//!
//! ## Subcommands
//!
//! - `keyspec validate`: Validate data documents against a schema.
//! - `keyspec check-schema`: Load a schema and report lint findings.
//!
//! ```bash
//! keyspec validate --schema storage.yaml config/*.yaml
//! keyspec validate --schema storage.yaml --format json config.json
//! keyspec --config keyspec.yaml check-schema storage.yaml
//! ```
//!
//! ## Exit Codes
//!
//! - `0`: every document is valid, or the schema has no lint errors.
//! - `1`: at least one document is invalid, or the schema has lint errors.
//! - `2`: operational error (unreadable file, unparseable input, or a schema
//!   fault raised while validating).

pub mod check;
pub mod config;
pub mod validate;

/// Exit code for a clean run.
pub const EXIT_OK: u8 = 0;
/// Exit code when documents or schemas are rejected.
pub const EXIT_INVALID: u8 = 1;
/// Exit code for operational errors.
pub const EXIT_ERROR: u8 = 2;
