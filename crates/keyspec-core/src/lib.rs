//! # keyspec-core: Foundational Types for keyspec
//!
//! The leaf crate of the workspace. It defines the vocabulary shared by the
//! validation engine and its callers:
//!
//! - [`ValueKind`]: the closed set of kinds a data value can have. Schemas
//!   name kinds; the engine matches on them exhaustively.
//! - [`KeyPath`]: dotted location of a key inside nested data.
//! - [`Diagnostic`] and [`DiagnosticSink`]: structured reasons for rejection
//!   and the injected capability that receives them.
//! - [`SchemaFault`]: the error raised when a schema cannot classify data.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `keyspec-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.
//! - No global state. Logging only happens through [`TracingSink`], and only
//!   when a caller chooses it.

pub mod diagnostic;
pub mod error;
pub mod kind;
pub mod path;

pub use diagnostic::{Diagnostic, DiagnosticKind, DiagnosticSink, RecordingSink, TracingSink, Verdict};
pub use error::SchemaFault;
pub use kind::{ValueKind, ALL_VALUE_KINDS};
pub use path::KeyPath;
