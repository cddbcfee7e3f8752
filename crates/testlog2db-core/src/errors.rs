//! Error types for the import pipeline.
//!
//! Every variant is fatal for the whole run: the CLI logs one message and
//! terminates with the variant's exit code. The only non-fatal anomalies in
//! the pipeline (unmatched component, unmatched testtool pattern) degrade to
//! default values and never surface here.

use thiserror::Error;

use crate::storage::StoreError;

/// Result type for import operations.
pub type ImportResult<T> = Result<T, ImportError>;

/// Errors that can abort an import run.
#[derive(Debug, Error)]
pub enum ImportError {
    /// Input path (report file/directory, config file) does not exist or
    /// yielded no report files.
    #[error("input not found: {path}")]
    InputNotFound { path: String },

    /// A report document is not well-formed XML.
    #[error("cannot parse report '{path}': {reason}")]
    Parse { path: String, reason: String },

    /// A report document is well-formed but structurally unusable
    /// (missing suite/case attributes, non-numeric timing).
    #[error("invalid report structure in '{path}': {reason}")]
    Schema { path: String, reason: String },

    /// Merging the parsed documents failed (e.g. no suites at all).
    #[error("cannot merge report documents: {reason}")]
    Merge { reason: String },

    /// Bad key, value type, or invocation in the configuration surface.
    #[error("invalid configuration: {reason}")]
    ConfigInvalid { reason: String },

    /// A strict-checked field exceeds its relational bound.
    #[error("value '{value}' for '{field}' is longer than acceptable {max} chars")]
    FieldTooLong {
        field: String,
        value: String,
        max: usize,
    },

    /// A field name that is not registered in the constraint table.
    #[error("invalid field '{field}' to import into database")]
    UnknownField { field: String },

    /// Create-mode import against an identifier that already exists.
    #[error(
        "execution result with UUID '{id}' already exists; \
         use another UUID (or drop '--uuid') for a new result, \
         or pass '--append' to add to the existing one"
    )]
    DuplicateIdentifier { id: String },

    /// Append-mode import whose explicit metadata contradicts the stored row.
    #[error("cannot append to '{id}': stored {field} is '{stored}' but '{supplied}' was supplied")]
    MetadataConflict {
        id: String,
        field: &'static str,
        stored: String,
        supplied: String,
    },

    /// Append-mode import against an identifier that does not exist.
    #[error("cannot append: no execution result with UUID '{id}' exists")]
    NothingToAppendTo { id: String },

    /// Storage failures not otherwise classified.
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
}

impl ImportError {
    /// True for the identifier/metadata conflicts of the create-vs-append
    /// state machine.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::DuplicateIdentifier { .. }
                | Self::MetadataConflict { .. }
                | Self::NothingToAppendTo { .. }
        )
    }

    /// Distinguishing log prefix, one per failure class.
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::InputNotFound { .. } => "input",
            Self::Parse { .. } => "parse",
            Self::Schema { .. } => "schema",
            Self::Merge { .. } => "merge",
            Self::ConfigInvalid { .. } => "config",
            Self::FieldTooLong { .. } | Self::UnknownField { .. } => "field",
            Self::DuplicateIdentifier { .. }
            | Self::MetadataConflict { .. }
            | Self::NothingToAppendTo { .. } => "conflict",
            Self::Storage(_) => "storage",
        }
    }

    /// Suggested exit code for the CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InputNotFound { .. } => 2,
            Self::ConfigInvalid { .. }
            | Self::FieldTooLong { .. }
            | Self::UnknownField { .. } => 2,
            Self::Parse { .. } | Self::Schema { .. } | Self::Merge { .. } => 3,
            Self::DuplicateIdentifier { .. }
            | Self::MetadataConflict { .. }
            | Self::NothingToAppendTo { .. } => 4,
            Self::Storage(_) => 5,
        }
    }
}
