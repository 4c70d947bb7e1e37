//! # Error Types
//!
//! Ordinary invalid data is never an error: it yields a `false` verdict plus
//! a [`Diagnostic`](crate::Diagnostic). The types here cover the cases where
//! the schema itself cannot classify the data. Those fail loudly and are
//! returned as `Err` so callers cannot mistake them for a rejected document.

use thiserror::Error;

use crate::path::KeyPath;

/// The schema could not classify the data it was applied to.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaFault {
    /// A conditional key's dependency value has no branch in the schema.
    #[error("conditional key '{path}' has no branch for {depends_on} = {value}")]
    UnmatchedBranch {
        /// Path of the conditional key.
        path: KeyPath,
        /// Name of the sibling key the branch depends on.
        depends_on: String,
        /// The dependency value as JSON text.
        value: String,
    },

    /// A conditional key's dependency is absent from the enclosing mapping.
    #[error("conditional key '{path}' depends on '{depends_on}', which is absent from the enclosing mapping")]
    MissingDependency {
        /// Path of the conditional key.
        path: KeyPath,
        /// Name of the missing sibling key.
        depends_on: String,
    },
}

impl SchemaFault {
    /// Path of the conditional key that faulted.
    pub fn path(&self) -> &KeyPath {
        match self {
            Self::UnmatchedBranch { path, .. } | Self::MissingDependency { path, .. } => path,
        }
    }
}
