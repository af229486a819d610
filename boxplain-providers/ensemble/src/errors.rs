//! Errors raised while parsing and lowering an ensemble file.

use std::fmt;

use thiserror::Error;

/// Stable codes describing [`EnsembleProviderError`] variants.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum EnsembleProviderErrorCode {
    /// The JSON payload could not be parsed at all.
    MalformedJson,
    /// A tree's parallel arrays did not agree on length.
    ArrayLengthMismatch,
    /// The top-level `objective` tag is not one the core supports.
    UnsupportedObjective,
    /// `parents`/`left_children`/`right_children` pointed outside the
    /// tree's node array.
    InvalidNodeReference,
}

impl EnsembleProviderErrorCode {
    /// Return the stable machine-readable representation of this error code.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MalformedJson => "ENSEMBLE_MALFORMED_JSON",
            Self::ArrayLengthMismatch => "ENSEMBLE_ARRAY_LENGTH_MISMATCH",
            Self::UnsupportedObjective => "ENSEMBLE_UNSUPPORTED_OBJECTIVE",
            Self::InvalidNodeReference => "ENSEMBLE_INVALID_NODE_REFERENCE",
        }
    }
}

impl fmt::Display for EnsembleProviderErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error raised while parsing or lowering an ensemble JSON file.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum EnsembleProviderError {
    /// The JSON payload could not be parsed at all.
    #[error("malformed ensemble JSON: {0}")]
    MalformedJson(#[from] serde_json::Error),
    /// A tree's parallel arrays did not agree on length.
    #[error("tree {tree} has mismatched array lengths: {detail}")]
    ArrayLengthMismatch {
        /// Index of the offending tree.
        tree: usize,
        /// Human-readable description of the mismatch.
        detail: String,
    },
    /// The top-level `objective` tag is not one the core supports.
    #[error("unsupported objective `{objective}`")]
    UnsupportedObjective {
        /// The unrecognised objective tag.
        objective: String,
    },
    /// `parents`/`left_children`/`right_children` pointed outside the
    /// tree's node array.
    #[error("tree {tree} node {node} references an out-of-range child or parent")]
    InvalidNodeReference {
        /// Index of the offending tree.
        tree: usize,
        /// Index of the node with the bad reference.
        node: usize,
    },
}

impl EnsembleProviderError {
    /// Retrieve the stable [`EnsembleProviderErrorCode`] for this error.
    #[must_use]
    pub const fn code(&self) -> EnsembleProviderErrorCode {
        match self {
            Self::MalformedJson(_) => EnsembleProviderErrorCode::MalformedJson,
            Self::ArrayLengthMismatch { .. } => EnsembleProviderErrorCode::ArrayLengthMismatch,
            Self::UnsupportedObjective { .. } => EnsembleProviderErrorCode::UnsupportedObjective,
            Self::InvalidNodeReference { .. } => EnsembleProviderErrorCode::InvalidNodeReference,
        }
    }
}
